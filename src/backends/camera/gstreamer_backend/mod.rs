// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer camera backend
//!
//! Cameras are discovered with a `DeviceMonitor`, so anything GStreamer has
//! a device provider for (PipeWire, libcamera, V4L2) shows up here. Each
//! session owns one [`pipeline::ScanPipeline`].

pub mod enumeration;
pub mod pipeline;

use super::types::*;
use super::{CaptureBackend, CaptureSession};
use pipeline::ScanPipeline;
use tokio::sync::watch;
use tracing::{info, warn};

/// GStreamer backend implementation
#[derive(Debug, Default)]
pub struct GStreamerBackend;

impl GStreamerBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureBackend for GStreamerBackend {
    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::GStreamer
    }

    fn is_available(&self) -> bool {
        if gstreamer::init().is_err() {
            return false;
        }
        ["videoconvert", "videorate", "appsink"]
            .iter()
            .all(|name| gstreamer::ElementFactory::find(name).is_some())
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        enumeration::probe_video_sources()
            .into_iter()
            .map(|probed| probed.camera)
            .collect()
    }

    fn open_session(
        &self,
        device: &CameraDevice,
        config: &SessionConfig,
        output: MetadataOutput,
    ) -> BackendResult<Box<dyn CaptureSession>> {
        // Devices are re-probed so the handle is fresh if the camera was replugged
        let probed = enumeration::probe_video_sources()
            .into_iter()
            .find(|p| p.camera.path == device.path)
            .ok_or_else(|| BackendError::DeviceNotFound(device.name.clone()))?;

        let (preview_tx, preview_rx) = watch::channel(None);
        let pipeline = ScanPipeline::new(&probed.device, config, output, preview_tx)?;
        pipeline.start()?;

        let session = GStreamerSession {
            id: SessionId::new(),
            device: probed.camera,
            pipeline,
            preview: preview_rx,
        };
        info!(session = %session.id, device = %session.device.name, "Capture session started");
        Ok(Box::new(session))
    }
}

struct GStreamerSession {
    id: SessionId,
    device: CameraDevice,
    pipeline: ScanPipeline,
    preview: PreviewReceiver,
}

impl CaptureSession for GStreamerSession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn is_running(&self) -> bool {
        self.pipeline.is_playing()
    }

    fn preview_receiver(&self) -> Option<PreviewReceiver> {
        Some(self.preview.clone())
    }

    fn stop(self: Box<Self>) {
        let GStreamerSession { id, pipeline, .. } = *self;
        if !pipeline.is_playing() {
            warn!(session = %id, "Stopping a session whose pipeline is not playing");
        }
        pipeline.stop();
    }
}
