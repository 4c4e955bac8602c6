// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Capture and throttling constants
pub mod capture {
    /// Rate the camera source is assumed to run at
    pub const NOMINAL_FRAMERATE: u32 = 30;

    /// Frames per second handed to recognition by default
    pub const DEFAULT_SCAN_FRAMERATE: u32 = 3;

    /// Lowest accepted scan rate
    pub const MIN_SCAN_FRAMERATE: u32 = 1;

    /// Maximum buffer queue size in the appsink (keep small for low latency)
    pub const MAX_BUFFERS: u32 = 2;

    /// Longest frame side handed to the QR recognizer
    pub const RECOGNITION_MAX_DIMENSION: u32 = 640;
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// How long start waits for an immediate pipeline error
    pub const START_ERROR_CHECK_MS: u64 = 200;

    /// Granularity of interruptible waits in capture loops
    pub const STOP_POLL_INTERVAL: Duration = Duration::from_millis(10);

    /// Terminal UI input poll timeout
    pub const UI_POLL_INTERVAL: Duration = Duration::from_millis(16);

    /// Upper bound on how long a notification sound may keep its pipeline
    pub const SOUND_TIMEOUT_SECS: u64 = 5;
}

/// Texts shown by the display controller
pub mod ui {
    pub const STATUS_ACTIVATING: &str = "Activating camera...";
    pub const STATUS_LOOKING: &str = "Looking for a QR code...";
    pub const STATUS_SCANNED: &str = "Scanned a QR code!";
    pub const STATUS_NOT_SCANNING: &str = "Not scanning";

    /// Alert body when a failure carries no reason
    pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred.";

    /// Alert title for capture failures
    pub const ALERT_TITLE: &str = "Error";
}

/// QR code image generation
pub mod generator {
    /// Side length of generated code images in pixels
    pub const DEFAULT_IMAGE_SIZE: u32 = 500;
}

/// Built-in notification sound
pub mod sound {
    /// Short tick used when no sound file is configured
    pub const TICK_PIPELINE: &str =
        "audiotestsrc wave=ticks num-buffers=6 ! audioconvert ! audioresample ! autoaudiosink";
}

/// Supported file formats for the file source backend
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}
