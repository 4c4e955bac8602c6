// SPDX-License-Identifier: GPL-3.0-only

//! Still images served as virtual cameras
//!
//! Each image file is one device. Opening a session loads the image once,
//! runs recognition on it, and then re-delivers the same frame at the
//! session's throttled rate on a capture loop thread, the way a camera
//! pointed at a printed code would.

use super::frame_loop::{CaptureLoopController, LoopAction};
use super::types::*;
use super::{CaptureBackend, CaptureSession};
use crate::constants::file_formats;
use crate::recognition::{MetadataObject, MetadataRecognizer, QrDetector};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct FileSource {
    path: PathBuf,
    position: CameraPosition,
}

/// Backend that treats image files as cameras
#[derive(Debug, Clone, Default)]
pub struct FileSourceBackend {
    sources: Vec<FileSource>,
}

impl FileSourceBackend {
    /// One unspecified-position camera per path
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            sources: paths
                .into_iter()
                .map(|path| FileSource {
                    path,
                    position: CameraPosition::Unspecified,
                })
                .collect(),
        }
    }

    /// Add a camera at a fixed position
    pub fn with_source(mut self, path: impl Into<PathBuf>, position: CameraPosition) -> Self {
        self.sources.push(FileSource {
            path: path.into(),
            position,
        });
        self
    }

    fn device_for(source: &FileSource) -> CameraDevice {
        let name = source
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.path.display().to_string());

        CameraDevice {
            name,
            path: source.path.display().to_string(),
            position: source.position,
        }
    }
}

impl CaptureBackend for FileSourceBackend {
    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::File
    }

    fn is_available(&self) -> bool {
        true
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        self.sources
            .iter()
            .filter(|s| {
                let supported = s
                    .path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(file_formats::is_image_extension);
                if !supported {
                    debug!(path = %s.path.display(), "Skipping file with unsupported extension");
                }
                supported
            })
            .map(Self::device_for)
            .collect()
    }

    fn open_session(
        &self,
        device: &CameraDevice,
        config: &SessionConfig,
        output: MetadataOutput,
    ) -> BackendResult<Box<dyn CaptureSession>> {
        let path = Path::new(&device.path);
        let frame = Arc::new(load_image_as_frame(path)?);

        let detector = QrDetector::new();
        let objects = detector.recognize(&frame, &config.metadata_types);
        info!(
            device = %device.name,
            width = frame.width,
            height = frame.height,
            codes = objects.len(),
            framerate = %config.framerate,
            "Opened file source session"
        );

        let (preview_tx, preview_rx) = watch::channel(Some(Arc::clone(&frame)));
        let id = SessionId::new();
        let loop_name = format!("file-source-{}", output.epoch());

        let state = FileLoopState {
            output,
            preview_tx,
            frame,
            objects,
        };
        let controller = CaptureLoopController::start_paced(
            &loop_name,
            config.framerate.frame_duration(),
            move || Ok(state),
            |state: &mut FileLoopState| {
                state.preview_tx.send_replace(Some(Arc::clone(&state.frame)));
                if state.output.deliver(state.objects.clone()) {
                    LoopAction::Continue
                } else {
                    debug!("Metadata receiver gone, stopping file source");
                    LoopAction::Stop
                }
            },
        );

        Ok(Box::new(FileSourceSession {
            id,
            device: device.clone(),
            controller,
            preview: preview_rx,
        }))
    }
}

struct FileLoopState {
    output: MetadataOutput,
    preview_tx: PreviewSender,
    frame: Arc<CameraFrame>,
    objects: Vec<MetadataObject>,
}

struct FileSourceSession {
    id: SessionId,
    device: CameraDevice,
    controller: CaptureLoopController,
    preview: PreviewReceiver,
}

impl CaptureSession for FileSourceSession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    fn preview_receiver(&self) -> Option<PreviewReceiver> {
        Some(self.preview.clone())
    }

    fn stop(self: Box<Self>) {
        info!(session = %self.id, "Stopping file source session");
        let mut controller = self.controller;
        controller.stop();
    }
}

/// Load an image file as a packed RGBA frame
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    if !path.exists() {
        return Err(BackendError::DeviceNotFound(path.display().to_string()));
    }

    let img = image::open(path).map_err(|e| {
        warn!(path = %path.display(), error = %e, "Failed to load image");
        BackendError::IoError(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    debug!(width, height, "Image loaded");

    Ok(CameraFrame::packed(
        width,
        height,
        PixelFormat::RGBA,
        rgba.into_raw(),
    ))
}
