// SPDX-License-Identifier: MPL-2.0

//! qrscan - scan QR codes from a live camera feed
//!
//! # Architecture
//!
//! - [`backends`]: camera capture backends and notification sounds
//! - [`recognition`]: turning frames into QR code metadata
//! - [`scanner`]: capture session lifecycle and the decoded-string value
//! - [`controller`]: labels, alerts and sound driven by the scanner
//! - [`generator`]: rendering data as QR code images
//! - [`terminal`]: terminal front end for the controller
//! - [`config`]: user configuration handling
//!
//! # Example
//!
//! ```ignore
//! use qrscan::backends::camera::FileSourceBackend;
//! use qrscan::Scanner;
//!
//! let backend = FileSourceBackend::new(vec!["code.png".into()]);
//! let mut scanner = Scanner::new(Box::new(backend));
//! scanner.start_capture()?;
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod controller;
pub mod errors;
pub mod generator;
pub mod observable;
pub mod recognition;
pub mod scanner;
pub mod terminal;

// Re-export commonly used types
pub use config::Config;
pub use controller::{Alert, ScanController};
pub use errors::{AppError, AppResult, CaptureError};
pub use scanner::Scanner;
