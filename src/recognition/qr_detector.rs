// SPDX-License-Identifier: GPL-3.0-only

//! QR code recognition
//!
//! Converts camera frames to luma, optionally downscales them, and hands
//! them to `rqrr`. Decoding itself is entirely the library's job; this
//! module only adapts frames in and detection records out.

use super::MetadataRecognizer;
use super::types::{FrameRegion, MetadataObject, MetadataType};
use crate::backends::camera::types::CameraFrame;
use crate::constants::capture;
use tracing::{debug, trace};

/// QR code detector
///
/// Optimized for real-time processing with frame downscaling.
#[derive(Debug, Clone)]
pub struct QrDetector {
    /// Maximum dimension for processing (frames are downscaled to this)
    max_dimension: u32,
}

impl Default for QrDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QrDetector {
    /// Create a new QR detector with default settings
    pub fn new() -> Self {
        Self {
            max_dimension: capture::RECOGNITION_MAX_DIMENSION,
        }
    }

    /// Create a QR detector with custom max dimension
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }

    /// Detect QR codes in a camera frame
    pub fn detect(&self, frame: &CameraFrame) -> Vec<MetadataObject> {
        let start = std::time::Instant::now();

        if frame.width == 0 || frame.height == 0 {
            return Vec::new();
        }

        let luma = LumaImage::from_frame(frame, self.max_dimension);
        let conversion_time = start.elapsed();
        trace!(
            proc_width = luma.width,
            proc_height = luma.height,
            scale = luma.scale,
            conversion_ms = conversion_time.as_millis(),
            "Prepared luma image for recognition"
        );

        let (w, h) = (luma.width as usize, luma.height as usize);
        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(w, h, |x, y| luma.data[y * w + x]);
        let grids = prepared.detect_grids();

        let mut objects = Vec::with_capacity(grids.len());
        for grid in grids {
            let bounds = luma.region_from_corners(&grid.bounds, frame.width, frame.height);

            match grid.decode() {
                Ok((_meta, content)) => {
                    debug!(
                        content = %content,
                        x = bounds.x,
                        y = bounds.y,
                        "Decoded QR code"
                    );
                    objects.push(MetadataObject::qr(content, bounds));
                }
                Err(e) => {
                    // Located but unreadable; still reported so callers see the code
                    debug!(error = ?e, "Failed to decode QR grid");
                    objects.push(MetadataObject {
                        kind: MetadataType::Qr,
                        string_value: None,
                        bounds,
                    });
                }
            }
        }

        if !objects.is_empty() {
            debug!(
                count = objects.len(),
                total_ms = start.elapsed().as_millis(),
                "QR recognition found codes"
            );
        }

        objects
    }
}

impl MetadataRecognizer for QrDetector {
    fn recognize(&self, frame: &CameraFrame, types: &[MetadataType]) -> Vec<MetadataObject> {
        if !types.contains(&MetadataType::Qr) {
            return Vec::new();
        }
        self.detect(frame)
    }
}

/// Single channel image prepared for recognition
struct LumaImage {
    width: u32,
    height: u32,
    /// Source pixels per processed pixel
    scale: f32,
    data: Vec<u8>,
}

impl LumaImage {
    fn from_frame(frame: &CameraFrame, max_dimension: u32) -> Self {
        if frame.width <= max_dimension && frame.height <= max_dimension {
            let mut data = Vec::with_capacity((frame.width * frame.height) as usize);
            for y in 0..frame.height {
                for x in 0..frame.width {
                    data.push(frame.luma_at(x, y));
                }
            }
            return Self {
                width: frame.width,
                height: frame.height,
                scale: 1.0,
                data,
            };
        }

        let scale = (frame.width as f32 / max_dimension as f32)
            .max(frame.height as f32 / max_dimension as f32);
        let width = ((frame.width as f32 / scale) as u32).max(1);
        let height = ((frame.height as f32 / scale) as u32).max(1);

        Self {
            width,
            height,
            scale,
            data: downscale_luma(frame, width, height),
        }
    }

    /// Bounding box of a grid's four corners, in normalized source coordinates
    fn region_from_corners(
        &self,
        corners: &[rqrr::Point; 4],
        frame_width: u32,
        frame_height: u32,
    ) -> FrameRegion {
        let min_x = corners.iter().map(|p| p.x).min().unwrap_or(0).max(0) as f32;
        let max_x = corners.iter().map(|p| p.x).max().unwrap_or(0).max(0) as f32;
        let min_y = corners.iter().map(|p| p.y).min().unwrap_or(0).max(0) as f32;
        let max_y = corners.iter().map(|p| p.y).max().unwrap_or(0).max(0) as f32;

        FrameRegion::from_pixels(
            (min_x * self.scale) as u32,
            (min_y * self.scale) as u32,
            ((max_x - min_x) * self.scale) as u32,
            ((max_y - min_y) * self.scale) as u32,
            frame_width,
            frame_height,
        )
    }
}

/// Downscale a frame to luma using bilinear interpolation
fn downscale_luma(frame: &CameraFrame, dst_width: u32, dst_height: u32) -> Vec<u8> {
    let src_width = frame.width;
    let src_height = frame.height;

    let mut result = Vec::with_capacity((dst_width * dst_height) as usize);

    let x_ratio = src_width as f32 / dst_width as f32;
    let y_ratio = src_height as f32 / dst_height as f32;

    for y in 0..dst_height {
        for x in 0..dst_width {
            let src_x = x as f32 * x_ratio;
            let src_y = y as f32 * y_ratio;

            let x0 = src_x as u32;
            let y0 = src_y as u32;
            let x1 = (x0 + 1).min(src_width - 1);
            let y1 = (y0 + 1).min(src_height - 1);

            let x_frac = src_x - x0 as f32;
            let y_frac = src_y - y0 as f32;

            let p00 = frame.luma_at(x0, y0) as f32;
            let p01 = frame.luma_at(x1, y0) as f32;
            let p10 = frame.luma_at(x0, y1) as f32;
            let p11 = frame.luma_at(x1, y1) as f32;

            let value = p00 * (1.0 - x_frac) * (1.0 - y_frac)
                + p01 * x_frac * (1.0 - y_frac)
                + p10 * (1.0 - x_frac) * y_frac
                + p11 * x_frac * y_frac;

            result.push(value as u8);
        }
    }

    result
}
