// SPDX-License-Identifier: MPL-2.0

//! Scripted capture backend for integration tests
//!
//! Sessions never produce frames by themselves; tests push metadata into
//! the most recently opened session through a [`BackendHandle`].

#![allow(dead_code)]

use qrscan::Scanner;
use qrscan::backends::audio::SoundPlayer;
use qrscan::backends::camera::{
    BackendError, BackendResult, CameraBackendType, CameraDevice, CameraPosition, CaptureBackend,
    CaptureSession, MetadataOutput, PreviewReceiver, SessionConfig, SessionId,
};
use qrscan::recognition::{FrameRegion, MetadataObject, MetadataType};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct HandleState {
    outputs: Vec<MetadataOutput>,
    configs: Vec<SessionConfig>,
    opened_devices: Vec<CameraDevice>,
    stopped: usize,
}

/// Test-side view of a [`ScriptedBackend`]
#[derive(Clone, Default)]
pub struct BackendHandle {
    state: Arc<Mutex<HandleState>>,
}

impl BackendHandle {
    /// Deliver one frame with the given objects to the latest session
    pub fn deliver(&self, objects: Vec<MetadataObject>) -> bool {
        let state = self.state.lock().unwrap();
        state
            .outputs
            .last()
            .map(|output| output.deliver(objects))
            .unwrap_or(false)
    }

    /// Deliver one frame containing a single QR code
    pub fn deliver_qr(&self, text: &str) -> bool {
        self.deliver(vec![qr(text)])
    }

    /// Deliver to the `index`-th session ever opened
    pub fn deliver_to(&self, index: usize, objects: Vec<MetadataObject>) -> bool {
        let state = self.state.lock().unwrap();
        state.outputs[index].deliver(objects)
    }

    pub fn opened(&self) -> usize {
        self.state.lock().unwrap().outputs.len()
    }

    pub fn stopped(&self) -> usize {
        self.state.lock().unwrap().stopped
    }

    pub fn last_config(&self) -> Option<SessionConfig> {
        self.state.lock().unwrap().configs.last().cloned()
    }

    pub fn last_device(&self) -> Option<CameraDevice> {
        self.state.lock().unwrap().opened_devices.last().cloned()
    }
}

/// In-memory backend with a fixed camera list
pub struct ScriptedBackend {
    cameras: Vec<CameraDevice>,
    open_error: Option<String>,
    handle: BackendHandle,
}

impl ScriptedBackend {
    pub fn new(cameras: Vec<CameraDevice>) -> (Self, BackendHandle) {
        let handle = BackendHandle::default();
        (
            Self {
                cameras,
                open_error: None,
                handle: handle.clone(),
            },
            handle,
        )
    }

    /// Every open attempt fails with `reason`
    pub fn failing(cameras: Vec<CameraDevice>, reason: &str) -> (Self, BackendHandle) {
        let (mut backend, handle) = Self::new(cameras);
        backend.open_error = Some(reason.to_string());
        (backend, handle)
    }
}

impl CaptureBackend for ScriptedBackend {
    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::File
    }

    fn is_available(&self) -> bool {
        true
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        self.cameras.clone()
    }

    fn open_session(
        &self,
        device: &CameraDevice,
        config: &SessionConfig,
        output: MetadataOutput,
    ) -> BackendResult<Box<dyn CaptureSession>> {
        if let Some(reason) = &self.open_error {
            return Err(BackendError::DeviceBusy(reason.clone()));
        }

        let mut state = self.handle.state.lock().unwrap();
        state.outputs.push(output);
        state.configs.push(config.clone());
        state.opened_devices.push(device.clone());

        Ok(Box::new(ScriptedSession {
            id: SessionId::new(),
            device: device.clone(),
            handle: self.handle.clone(),
        }))
    }
}

struct ScriptedSession {
    id: SessionId,
    device: CameraDevice,
    handle: BackendHandle,
}

impl CaptureSession for ScriptedSession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn is_running(&self) -> bool {
        true
    }

    fn preview_receiver(&self) -> Option<PreviewReceiver> {
        None
    }

    fn stop(self: Box<Self>) {
        self.handle.state.lock().unwrap().stopped += 1;
    }
}

pub fn camera(name: &str, position: CameraPosition) -> CameraDevice {
    CameraDevice {
        name: name.to_string(),
        path: format!("/dev/{}", name.to_lowercase().replace(' ', "-")),
        position,
    }
}

/// Front and back camera, back listed first
pub fn phone_cameras() -> Vec<CameraDevice> {
    vec![
        camera("Back Camera", CameraPosition::Back),
        camera("Front Camera", CameraPosition::Front),
    ]
}

pub fn qr(text: &str) -> MetadataObject {
    MetadataObject::qr(text, FrameRegion::default())
}

/// QR code located at `(x, y)` in normalized frame coordinates
pub fn qr_at(text: &str, x: f32, y: f32) -> MetadataObject {
    MetadataObject::qr(
        text,
        FrameRegion {
            x,
            y,
            width: 0.25,
            height: 0.25,
        },
    )
}

pub fn barcode(kind: MetadataType, text: &str) -> MetadataObject {
    MetadataObject {
        kind,
        string_value: Some(text.to_string()),
        bounds: FrameRegion::default(),
    }
}

pub fn scripted_scanner(cameras: Vec<CameraDevice>) -> (Scanner, BackendHandle) {
    let (backend, handle) = ScriptedBackend::new(cameras);
    (Scanner::new(Box::new(backend)), handle)
}

/// Sound player that counts how often it was played
#[derive(Clone, Default)]
pub struct CountingSound {
    plays: Arc<AtomicUsize>,
}

impl CountingSound {
    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }
}

impl SoundPlayer for CountingSound {
    fn play(&self) {
        self.plays.fetch_add(1, Ordering::SeqCst);
    }
}
