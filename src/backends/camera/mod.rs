// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │      Scanner        │  ← session lifecycle, QR filtering
//! └──────────┬──────────┘
//!            │ open_session / stop
//!            ▼
//! ┌─────────────────────┐
//! │ CaptureBackend Trait│  ← enumeration, session creation
//! └──────────┬──────────┘
//!            │
//!       ┌────┴─────┐
//!       ▼          ▼
//!  ┌─────────┐ ┌──────┐
//!  │GStreamer│ │ File │  ← concrete implementations
//!  └─────────┘ └──────┘
//! ```
//!
//! Sessions run recognition on their own threads and hand results back
//! through a [`MetadataOutput`]; they never call into the scanner.

pub mod file_source;
pub mod frame_loop;
#[cfg(feature = "gst")]
pub mod gstreamer_backend;
pub mod types;

pub use file_source::FileSourceBackend;
pub use types::*;

use std::path::PathBuf;
use tracing::warn;

/// Camera backend trait
///
/// A backend knows which cameras exist and how to open a capture session on
/// one of them.
pub trait CaptureBackend: Send {
    /// Get the backend type identifier
    fn backend_type(&self) -> CameraBackendType;

    /// Check if this backend is available on the current system
    fn is_available(&self) -> bool;

    /// Enumerate available cameras on this backend
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Camera used when no position is requested
    fn default_camera(&self) -> Option<CameraDevice> {
        self.enumerate_cameras().into_iter().next()
    }

    /// Open and start a capture session on `device`
    ///
    /// The session delivers per-frame metadata through `output` at the
    /// throttled rate in `config` until it is stopped.
    ///
    /// # Returns
    /// * `Ok(session)` - Session is running
    /// * `Err(BackendError)` - The device could not be opened
    fn open_session(
        &self,
        device: &CameraDevice,
        config: &SessionConfig,
        output: MetadataOutput,
    ) -> BackendResult<Box<dyn CaptureSession>>;
}

/// A running capture pipeline bound to one device
pub trait CaptureSession: Send {
    /// Identity of this session
    fn id(&self) -> SessionId;

    /// Device the session captures from
    fn device(&self) -> &CameraDevice;

    /// Whether the pipeline is still producing frames
    fn is_running(&self) -> bool;

    /// Latest preview frame, if the backend publishes one
    fn preview_receiver(&self) -> Option<PreviewReceiver>;

    /// Tear down the pipeline and release the device
    ///
    /// Does not wait for frames still in flight; they may still reach the
    /// metadata output afterwards.
    fn stop(self: Box<Self>);
}

/// Get a concrete backend instance
///
/// `sources` are the image files served by the file backend; they are
/// ignored by the GStreamer backend.
pub fn get_backend_for_type(
    backend_type: CameraBackendType,
    sources: &[PathBuf],
) -> Box<dyn CaptureBackend> {
    match backend_type {
        CameraBackendType::File => Box::new(FileSourceBackend::new(sources.to_vec())),
        #[cfg(feature = "gst")]
        CameraBackendType::GStreamer => Box::new(gstreamer_backend::GStreamerBackend::new()),
        #[cfg(not(feature = "gst"))]
        CameraBackendType::GStreamer => {
            warn!("Built without GStreamer support, falling back to the file backend");
            Box::new(FileSourceBackend::new(sources.to_vec()))
        }
    }
}

/// Get the default backend type for this build
pub fn get_default_backend() -> CameraBackendType {
    if cfg!(feature = "gst") {
        CameraBackendType::GStreamer
    } else {
        CameraBackendType::File
    }
}

/// Pick the first device at `position`, or the backend default when
/// `position` is unspecified
pub fn choose_device(
    backend: &dyn CaptureBackend,
    position: CameraPosition,
) -> Option<CameraDevice> {
    if position == CameraPosition::Unspecified {
        return backend.default_camera();
    }

    let device = backend
        .enumerate_cameras()
        .into_iter()
        .find(|d| d.position == position);
    if device.is_none() {
        warn!(%position, backend = %backend.backend_type(), "No camera at requested position");
    }
    device
}
