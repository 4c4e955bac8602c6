// SPDX-License-Identifier: MPL-2.0

//! Error types for the scanner

use crate::backends::camera::BackendError;
use crate::constants::ui;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Starting capture failed
    Capture(CaptureError),
    /// Camera backend errors outside of capture start
    Backend(BackendError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Errors reported synchronously by `Scanner::start_capture`
///
/// Both are recoverable: the caller decides whether to retry or to tell
/// the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// No camera matches the configured position
    NoCameraAvailable,
    /// The camera exists but could not be opened (busy, permissions, ...)
    DeviceConnectionError(String),
}

impl CaptureError {
    /// Short reason suitable for a status label or an alert body
    ///
    /// A connection error without a reason falls back to a generic message.
    pub fn failure_reason(&self) -> String {
        match self {
            CaptureError::NoCameraAvailable => "No camera available".to_string(),
            CaptureError::DeviceConnectionError(reason) if reason.trim().is_empty() => {
                ui::DEFAULT_ERROR_MESSAGE.to_string()
            }
            CaptureError::DeviceConnectionError(reason) => {
                format!("Could not connect to camera: {}", reason)
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Capture(e) => write!(f, "Capture error: {}", e),
            AppError::Backend(e) => write!(f, "Backend error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.failure_reason())
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CaptureError {}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        AppError::Capture(err)
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Backend(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
