// SPDX-License-Identifier: MPL-2.0

//! Frame metadata recognition
//!
//! The recognition layer turns camera frames into per-frame lists of
//! [`MetadataObject`]s. Backends run it on their capture threads; the
//! scanner only ever sees the resulting metadata.

pub mod qr_detector;
pub mod types;

pub use qr_detector::QrDetector;
pub use types::{FrameRegion, MetadataObject, MetadataType};

use crate::backends::camera::types::CameraFrame;

/// Turns a frame into the codes visible in it
pub trait MetadataRecognizer: Send + Sync {
    /// Recognize codes of the requested `types` in `frame`
    ///
    /// Objects are returned in detection order; types not requested are
    /// never reported.
    fn recognize(&self, frame: &CameraFrame, types: &[MetadataType]) -> Vec<MetadataObject>;
}
