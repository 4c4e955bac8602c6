// SPDX-License-Identifier: MPL-2.0

//! Per-frame detection records
//!
//! These types describe what the recognition layer found in one frame. They
//! are produced on capture threads and consumed by the scanner.

/// A rectangular region within a frame
///
/// Coordinates are normalized (0.0 to 1.0) relative to the frame dimensions,
/// so overlays can be placed regardless of the actual frame size.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameRegion {
    /// Left edge (0.0 = left of frame, 1.0 = right of frame)
    pub x: f32,
    /// Top edge (0.0 = top of frame, 1.0 = bottom of frame)
    pub y: f32,
    /// Width as fraction of frame width
    pub width: f32,
    /// Height as fraction of frame height
    pub height: f32,
}

impl FrameRegion {
    /// Create a frame region from pixel coordinates
    pub fn from_pixels(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        if frame_width == 0 || frame_height == 0 {
            return Self::default();
        }
        Self {
            x: x as f32 / frame_width as f32,
            y: y as f32 / frame_height as f32,
            width: width as f32 / frame_width as f32,
            height: height as f32 / frame_height as f32,
        }
    }
}

/// Symbology of a recognized code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataType {
    /// QR matrix code
    Qr,
    /// EAN-13 linear barcode
    Ean13,
}

impl std::fmt::Display for MetadataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MetadataType::Qr => "QR",
            MetadataType::Ean13 => "EAN-13",
        };
        write!(f, "{}", name)
    }
}

/// One code recognized in a frame
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataObject {
    /// Symbology
    pub kind: MetadataType,
    /// Decoded text; `None` when the code was located but not decoded
    pub string_value: Option<String>,
    /// Location in normalized frame coordinates
    pub bounds: FrameRegion,
}

impl MetadataObject {
    /// A decoded QR code
    pub fn qr(content: impl Into<String>, bounds: FrameRegion) -> Self {
        Self {
            kind: MetadataType::Qr,
            string_value: Some(content.into()),
            bounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_region_from_pixels() {
        let region = FrameRegion::from_pixels(100, 50, 200, 100, 1000, 500);
        assert!((region.x - 0.1).abs() < 0.001);
        assert!((region.y - 0.1).abs() < 0.001);
        assert!((region.width - 0.2).abs() < 0.001);
        assert!((region.height - 0.2).abs() < 0.001);
    }

    #[test]
    fn test_frame_region_empty_frame() {
        assert_eq!(
            FrameRegion::from_pixels(1, 1, 1, 1, 0, 0),
            FrameRegion::default()
        );
    }
}
