// SPDX-License-Identifier: GPL-3.0-only

//! Camera discovery through the GStreamer device monitor

use super::super::types::{CameraDevice, CameraPosition};
use gstreamer::prelude::*;
use tracing::{debug, info, warn};

/// Device class the monitor is filtered to
const VIDEO_SOURCE_CLASS: &str = "Video/Source";

/// Property keys that may carry the physical camera location
const LOCATION_KEYS: &[&str] = &["api.libcamera.location", "camera.location"];

/// Property keys that identify the device node, in order of preference
const PATH_KEYS: &[&str] = &["object.path", "api.v4l2.path", "device.path"];

/// A discovered camera together with the GStreamer device that opens it
pub struct ProbedDevice {
    pub camera: CameraDevice,
    pub device: gstreamer::Device,
}

/// Enumerate video sources currently known to GStreamer
///
/// Returns an empty list when GStreamer cannot be initialised or the
/// monitor fails to start.
pub fn probe_video_sources() -> Vec<ProbedDevice> {
    if let Err(e) = gstreamer::init() {
        warn!(error = %e, "GStreamer init failed");
        return Vec::new();
    }

    let monitor = gstreamer::DeviceMonitor::new();
    if monitor.add_filter(Some(VIDEO_SOURCE_CLASS), None).is_none() {
        warn!("Failed to add video source filter to device monitor");
        return Vec::new();
    }
    if let Err(e) = monitor.start() {
        warn!(error = %e, "Failed to start device monitor");
        return Vec::new();
    }

    let devices: Vec<gstreamer::Device> = monitor.devices().into_iter().collect();
    monitor.stop();

    let probed: Vec<ProbedDevice> = devices
        .into_iter()
        .map(|device| {
            let name = device.display_name().to_string();
            let camera = camera_from_properties(&name, device.properties().as_deref());
            debug!(name = %camera.name, path = %camera.path, position = %camera.position, "Found video source");
            ProbedDevice { camera, device }
        })
        .collect();

    info!(count = probed.len(), "Enumerated GStreamer video sources");
    probed
}

/// Build a camera description from a device's display name and properties
pub fn camera_from_properties(
    display_name: &str,
    properties: Option<&gstreamer::StructureRef>,
) -> CameraDevice {
    let lookup = |keys: &[&str]| -> Option<String> {
        let props = properties?;
        keys.iter()
            .find_map(|key| props.get::<String>(*key).ok())
            .filter(|value| !value.is_empty())
    };

    let position = lookup(LOCATION_KEYS)
        .map(|location| CameraPosition::from_location(&location))
        .unwrap_or_default();
    let path = lookup(PATH_KEYS).unwrap_or_else(|| display_name.to_string());

    CameraDevice {
        name: display_name.to_string(),
        path,
        position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_from_properties() {
        gstreamer::init().unwrap();
        let props = gstreamer::Structure::builder("properties")
            .field("api.libcamera.location", "back")
            .field("object.path", "v4l2:/dev/video2")
            .build();

        let camera = camera_from_properties("Rear Camera", Some(&*props));
        assert_eq!(camera.position, CameraPosition::Back);
        assert_eq!(camera.path, "v4l2:/dev/video2");
    }

    #[test]
    fn test_camera_without_properties() {
        let camera = camera_from_properties("USB Webcam", None);
        assert_eq!(camera.position, CameraPosition::Unspecified);
        assert_eq!(camera.path, "USB Webcam");
    }
}
