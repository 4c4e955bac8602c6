// SPDX-License-Identifier: MPL-2.0

//! QR code scanner
//!
//! The [`Scanner`] owns at most one capture session. Backends deliver
//! per-frame metadata over a channel; the scanner drains it on its owner's
//! context, keeps the first QR code of each frame, and republishes the
//! decoded string through an [`Observable`] only when it changes. The full
//! record of that code, including where it sits in the frame, is published
//! alongside it under the same change rule.
//!
//! Every started session gets a fresh epoch. Events carry the epoch of the
//! session that produced them, so frames still queued when a session is
//! paused are dropped instead of resurrecting an old value.

use crate::backends::camera::{
    CameraDevice, CameraPosition, CaptureBackend, CaptureSession, Framerate, MetadataEvent,
    MetadataOutput, PreviewReceiver, SessionConfig, SessionId, choose_device,
};
use crate::config::Config;
use crate::constants::capture;
use crate::errors::CaptureError;
use crate::observable::{ListenerId, Observable};
use crate::recognition::{MetadataObject, MetadataType};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace, warn};

enum ScannerState {
    Inactive,
    Active(ActiveCapture),
}

struct ActiveCapture {
    session: Box<dyn CaptureSession>,
    epoch: u64,
}

/// Camera QR code scanner
pub struct Scanner {
    backend: Box<dyn CaptureBackend>,
    camera_position: CameraPosition,
    scan_framerate: u32,
    metadata_types: Vec<MetadataType>,
    state: ScannerState,
    next_epoch: u64,
    scanned: Observable<Option<String>>,
    scanned_code: Observable<Option<MetadataObject>>,
    events_tx: mpsc::UnboundedSender<MetadataEvent>,
    events_rx: mpsc::UnboundedReceiver<MetadataEvent>,
}

impl Scanner {
    pub fn new(backend: Box<dyn CaptureBackend>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            camera_position: CameraPosition::Unspecified,
            scan_framerate: capture::DEFAULT_SCAN_FRAMERATE,
            metadata_types: vec![MetadataType::Qr],
            state: ScannerState::Inactive,
            next_epoch: 0,
            scanned: Observable::new(None),
            scanned_code: Observable::new(None),
            events_tx,
            events_rx,
        }
    }

    /// Scanner with position and rate taken from `config`
    pub fn from_config(backend: Box<dyn CaptureBackend>, config: &Config) -> Self {
        Self::new(backend)
            .with_camera_position(config.camera_position)
            .with_scan_framerate(config.scan_framerate)
    }

    pub fn with_camera_position(mut self, position: CameraPosition) -> Self {
        self.camera_position = position;
        self
    }

    /// Set the recognition rate, clamped to 1..=30 fps
    pub fn with_scan_framerate(mut self, fps: u32) -> Self {
        self.scan_framerate = Config::clamped_framerate(fps);
        self
    }

    pub fn camera_position(&self) -> CameraPosition {
        self.camera_position
    }

    /// Change the camera used by the next session
    ///
    /// Rejected while a session is active. Returns whether the change was
    /// applied.
    pub fn set_camera_position(&mut self, position: CameraPosition) -> bool {
        if self.is_active() {
            warn!(
                current = %self.camera_position,
                requested = %position,
                "Camera position cannot change while capturing"
            );
            return false;
        }
        self.camera_position = position;
        true
    }

    /// Rate frames are delivered at while capturing
    pub fn throttled_framerate(&self) -> Framerate {
        Framerate::throttled(capture::NOMINAL_FRAMERATE, self.scan_framerate)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ScannerState::Active(_))
    }

    pub fn session_id(&self) -> Option<SessionId> {
        match &self.state {
            ScannerState::Active(capture) => Some(capture.session.id()),
            ScannerState::Inactive => None,
        }
    }

    /// Device of the running session
    pub fn active_device(&self) -> Option<&CameraDevice> {
        match &self.state {
            ScannerState::Active(capture) => Some(capture.session.device()),
            ScannerState::Inactive => None,
        }
    }

    pub fn preview_receiver(&self) -> Option<PreviewReceiver> {
        match &self.state {
            ScannerState::Active(capture) => capture.session.preview_receiver(),
            ScannerState::Inactive => None,
        }
    }

    pub fn backend(&self) -> &dyn CaptureBackend {
        self.backend.as_ref()
    }

    /// Latest distinct decoded string
    pub fn scanned_string(&self) -> Option<String> {
        self.scanned.get()
    }

    /// Record of the code behind [`Scanner::scanned_string`]
    pub fn scanned_code(&self) -> Option<MetadataObject> {
        self.scanned_code.get()
    }

    /// Receiver marked changed whenever a new code record is published
    pub fn subscribe_code(&self) -> watch::Receiver<Option<MetadataObject>> {
        self.scanned_code.subscribe()
    }

    /// Receiver marked changed on each new decoded string
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.scanned.subscribe()
    }

    /// Run `listener` after each change of the decoded string
    pub fn observe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&Option<String>) + Send + 'static,
    {
        self.scanned.observe(listener)
    }

    pub fn unobserve(&mut self, id: ListenerId) -> bool {
        self.scanned.unobserve(id)
    }

    /// Start scanning
    ///
    /// Does nothing when already capturing. Otherwise the decoded string is
    /// cleared, a camera at the configured position is opened and frames
    /// start flowing at the throttled rate.
    pub fn start_capture(&mut self) -> Result<(), CaptureError> {
        if let ScannerState::Active(capture) = &self.state {
            debug!(session = %capture.session.id(), "Capture already running");
            return Ok(());
        }

        self.scanned.set(None);
        self.scanned_code.set(None);

        let device = choose_device(self.backend.as_ref(), self.camera_position).ok_or_else(|| {
            warn!(position = %self.camera_position, "No camera available");
            CaptureError::NoCameraAvailable
        })?;

        self.next_epoch += 1;
        let epoch = self.next_epoch;
        let config = SessionConfig {
            position: self.camera_position,
            metadata_types: self.metadata_types.clone(),
            framerate: self.throttled_framerate(),
        };
        let output = MetadataOutput::new(epoch, self.events_tx.clone());

        let session = self
            .backend
            .open_session(&device, &config, output)
            .map_err(|e| {
                warn!(device = %device.name, error = %e, "Failed to open camera");
                CaptureError::DeviceConnectionError(e.to_string())
            })?;

        info!(
            session = %session.id(),
            device = %device.name,
            position = %self.camera_position,
            framerate = %config.framerate,
            "Capture started"
        );
        self.state = ScannerState::Active(ActiveCapture { session, epoch });
        Ok(())
    }

    /// Stop scanning; does nothing when not capturing
    pub fn pause_capture(&mut self) {
        match std::mem::replace(&mut self.state, ScannerState::Inactive) {
            ScannerState::Inactive => debug!("Capture not running"),
            ScannerState::Active(capture) => {
                let id = capture.session.id();
                capture.session.stop();
                info!(session = %id, "Capture paused");
            }
        }
    }

    /// Handle every event already queued. Returns how many were handled.
    pub fn process_pending_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_metadata_output(event);
            handled += 1;
        }
        handled
    }

    /// Wait for the next event and handle it
    ///
    /// Returns whether the decoded string changed. Pends while no session
    /// is delivering, so it is meant to be raced against other work.
    pub async fn dispatch_next(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => self.handle_metadata_output(event),
            None => false,
        }
    }

    /// Frame callback: keep the first QR code's string if it is new
    pub(crate) fn handle_metadata_output(&mut self, event: MetadataEvent) -> bool {
        let active_epoch = match &self.state {
            ScannerState::Active(capture) => capture.epoch,
            ScannerState::Inactive => {
                trace!(epoch = event.epoch, "Discarding metadata while inactive");
                return false;
            }
        };
        if event.epoch != active_epoch {
            trace!(
                epoch = event.epoch,
                active_epoch, "Discarding metadata from a stopped session"
            );
            return false;
        }

        let Some((object, text)) = first_qr_code(&event.objects) else {
            return false;
        };
        let changed = self.scanned.set(Some(text.to_string()));
        if changed {
            info!(
                content = %text,
                x = object.bounds.x,
                y = object.bounds.y,
                "Scanned QR code"
            );
            self.scanned_code.set(Some(object.clone()));
        }
        changed
    }
}

impl Drop for Scanner {
    fn drop(&mut self) {
        self.pause_capture();
    }
}

/// First QR-typed object and its string, if it decoded
fn first_qr_code(objects: &[MetadataObject]) -> Option<(&MetadataObject, &str)> {
    let object = objects
        .iter()
        .find(|object| object.kind == MetadataType::Qr)?;
    let text = object.string_value.as_deref()?;
    Some((object, text))
}
