// SPDX-License-Identifier: MPL-2.0

//! QR code image generation
//!
//! The counterpart of scanning: renders data as a square grayscale QR code
//! image that can be printed, shown on screen or fed back to the file source.

use crate::errors::{AppError, AppResult};
use image::{GrayImage, Luma, imageops};
use qrcode::QrCode;
use tracing::debug;

/// Render `data` as a QR code image `size` pixels on a side
///
/// Modules are whole pixels, so the code is centred on a white canvas when
/// `size` is not a multiple of the module count. Codes that cannot fit one
/// pixel per module come out larger than `size`.
pub fn qr_code_image(data: &[u8], size: u32) -> AppResult<GrayImage> {
    let code = QrCode::new(data)
        .map_err(|e| AppError::Other(format!("Cannot encode QR code: {}", e)))?;

    let rendered = code
        .render::<Luma<u8>>()
        .max_dimensions(size, size)
        .build();
    let (width, height) = rendered.dimensions();
    debug!(
        bytes = data.len(),
        version = ?code.version(),
        width,
        height,
        "Rendered QR code"
    );

    if width >= size || height >= size {
        return Ok(rendered);
    }

    let mut canvas = GrayImage::from_pixel(size, size, Luma([255]));
    imageops::overlay(
        &mut canvas,
        &rendered,
        i64::from((size - width) / 2),
        i64::from((size - height) / 2),
    );
    Ok(canvas)
}
