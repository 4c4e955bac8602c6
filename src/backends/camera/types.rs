// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::recognition::MetadataObject;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

/// Camera backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CameraBackendType {
    /// GStreamer device monitor and capture pipeline
    #[default]
    GStreamer,
    /// Still images served as virtual cameras
    File,
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::GStreamer => write!(f, "GStreamer"),
            CameraBackendType::File => write!(f, "file"),
        }
    }
}

/// Which physical camera to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CameraPosition {
    /// Use whatever the backend considers its default camera
    #[default]
    Unspecified,
    /// Camera facing the user
    Front,
    /// Camera facing away from the user
    Back,
}

impl CameraPosition {
    /// Cycle order used by the camera switch key
    pub const ALL: [CameraPosition; 3] = [
        CameraPosition::Unspecified,
        CameraPosition::Back,
        CameraPosition::Front,
    ];

    /// Parse a location property as reported by libcamera / PipeWire
    /// ("front", "back", "external")
    pub fn from_location(location: &str) -> Self {
        match location.trim().to_lowercase().as_str() {
            "front" | "user" => CameraPosition::Front,
            "back" | "rear" | "environment" => CameraPosition::Back,
            _ => CameraPosition::Unspecified,
        }
    }

    /// Next position in [`CameraPosition::ALL`]
    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

impl std::fmt::Display for CameraPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraPosition::Unspecified => write!(f, "unspecified"),
            CameraPosition::Front => write!(f, "front"),
            CameraPosition::Back => write!(f, "back"),
        }
    }
}

impl std::str::FromStr for CameraPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "front" => Ok(CameraPosition::Front),
            "back" => Ok(CameraPosition::Back),
            "unspecified" | "default" | "any" => Ok(CameraPosition::Unspecified),
            other => Err(format!(
                "unknown camera position '{}' (expected front, back or unspecified)",
                other
            )),
        }
    }
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    /// Human readable name
    pub name: String,
    /// Backend specific address (device path, file path, ...)
    pub path: String,
    /// Physical position; `Unspecified` when the backend cannot tell
    pub position: CameraPosition,
}

/// Identity of one capture session
///
/// A new id is minted each time a session is opened, so a session that was
/// paused and restarted never compares equal to its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Framerate as a fraction (numerator/denominator)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Framerate {
    pub num: u32,
    pub denom: u32,
}

impl Framerate {
    /// Create a new framerate from numerator and denominator
    pub fn new(num: u32, denom: u32) -> Self {
        Self {
            num,
            denom: if denom == 0 { 1 } else { denom },
        }
    }

    /// Throttle a `nominal` rate source down to roughly `target` fps
    ///
    /// The camera keeps every `nominal / target`-th frame, so the result is
    /// `nominal / (nominal / target)`: 3 fps from 30 stays 30/10, 7 fps from
    /// 30 becomes 30/4 (7.5 fps).
    pub fn throttled(nominal: u32, target: u32) -> Self {
        let nominal = nominal.max(1);
        let step = (nominal / target.max(1)).max(1);
        Self::new(nominal, step)
    }

    /// Get the framerate as a floating point value
    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.denom as f64
    }

    /// Get the rounded integer framerate
    pub fn as_int(&self) -> u32 {
        self.num / self.denom
    }

    /// Minimum time between two delivered frames
    pub fn frame_duration(&self) -> Duration {
        if self.num == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.denom as f64 / self.num as f64)
    }
}

impl std::fmt::Display for Framerate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Show decimal for non-integer framerates
        if self.num % self.denom != 0 {
            write!(f, "{:.2}", self.as_f64())
        } else {
            write!(f, "{}", self.as_int())
        }
    }
}

impl Default for Framerate {
    fn default() -> Self {
        Self { num: 30, denom: 1 }
    }
}

/// Pixel format for camera frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    RGBA,
    /// RGB24 - 24-bit RGB (3 bytes per pixel, no alpha)
    RGB24,
    /// Gray8 - 8-bit grayscale (single channel)
    Gray8,
}

impl PixelFormat {
    /// Bytes used by one pixel
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::RGBA => 4,
            Self::RGB24 => 3,
            Self::Gray8 => 1,
        }
    }

    /// Parse format from GStreamer format string
    pub fn from_gst_format(format: &str) -> Option<Self> {
        match format {
            "RGBA" | "RGBx" => Some(Self::RGBA),
            "RGB" => Some(Self::RGB24),
            "GRAY8" | "GREY" | "Y8" => Some(Self::Gray8),
            _ => None,
        }
    }
}

/// A single frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Pixel data, rows `stride` bytes apart
    pub data: Arc<[u8]>,
    /// Pixel format of the data
    pub format: PixelFormat,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// Timestamp when frame was captured
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Wrap tightly packed pixel data
    pub fn packed(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: width * format.bytes_per_pixel() as u32,
            data: Arc::from(data),
            format,
            captured_at: Instant::now(),
        }
    }

    /// RGB value at (x, y), clamped to the frame
    pub fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if self.width == 0 || self.height == 0 {
            return (0, 0, 0);
        }
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        let idx = y * self.stride as usize + x * self.format.bytes_per_pixel();

        match self.format {
            PixelFormat::RGBA | PixelFormat::RGB24 => match self.data.get(idx..idx + 3) {
                Some(px) => (px[0], px[1], px[2]),
                None => (0, 0, 0),
            },
            PixelFormat::Gray8 => {
                let v = self.data.get(idx).copied().unwrap_or(0);
                (v, v, v)
            }
        }
    }

    /// BT.601 luma at (x, y)
    pub fn luma_at(&self, x: u32, y: u32) -> u8 {
        if self.format == PixelFormat::Gray8 {
            return self.rgb_at(x, y).0;
        }
        let (r, g, b) = self.rgb_at(x, y);
        ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
    }
}

/// Per-session capture settings handed to a backend
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Position the device was selected for
    pub position: CameraPosition,
    /// Symbologies the recognizer should report
    pub metadata_types: Vec<crate::recognition::MetadataType>,
    /// Throttled rate frames are delivered at
    pub framerate: Framerate,
}

/// Metadata objects recognized in one processed frame
#[derive(Debug, Clone)]
pub struct MetadataEvent {
    /// Epoch of the session that produced the frame
    pub epoch: u64,
    pub objects: Vec<MetadataObject>,
}

/// Where a session delivers its per-frame metadata
///
/// Cheap to clone; backends move it onto their capture threads. Delivery
/// never blocks and never touches scanner state directly.
#[derive(Debug, Clone)]
pub struct MetadataOutput {
    epoch: u64,
    sender: mpsc::UnboundedSender<MetadataEvent>,
}

impl MetadataOutput {
    pub fn new(epoch: u64, sender: mpsc::UnboundedSender<MetadataEvent>) -> Self {
        Self { epoch, sender }
    }

    /// Epoch stamped on every delivered event
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Queue one frame's metadata. Returns false once the receiver is gone.
    pub fn deliver(&self, objects: Vec<MetadataObject>) -> bool {
        self.sender
            .send(MetadataEvent {
                epoch: self.epoch,
                objects,
            })
            .is_ok()
    }
}

/// Latest preview frame of a session
pub type PreviewReceiver = watch::Receiver<Option<Arc<CameraFrame>>>;

/// Publishing side of [`PreviewReceiver`]
pub type PreviewSender = watch::Sender<Option<Arc<CameraFrame>>>;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// Failed to initialize backend
    InitializationFailed(String),
    /// Camera device not found
    DeviceNotFound(String),
    /// Device exists but could not be opened
    DeviceBusy(String),
    /// General I/O error
    IoError(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::DeviceBusy(msg) => write!(f, "Device busy: {}", msg),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}
