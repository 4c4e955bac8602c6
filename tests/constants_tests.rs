// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use qrscan::backends::camera::Framerate;
use qrscan::constants::{capture, file_formats, ui};

#[test]
fn test_default_throttle_is_three_of_thirty() {
    let fps = Framerate::throttled(capture::NOMINAL_FRAMERATE, capture::DEFAULT_SCAN_FRAMERATE);
    assert_eq!(fps.as_int(), 3);
    assert_eq!(fps.frame_duration().as_millis(), 333);
}

#[test]
fn test_status_texts_distinct() {
    let texts = [
        ui::STATUS_ACTIVATING,
        ui::STATUS_LOOKING,
        ui::STATUS_SCANNED,
        ui::STATUS_NOT_SCANNING,
    ];
    for (i, a) in texts.iter().enumerate() {
        assert!(!a.is_empty());
        for b in &texts[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn test_image_extensions_lowercase() {
    for ext in file_formats::IMAGE_EXTENSIONS {
        assert_eq!(*ext, ext.to_lowercase());
        assert!(file_formats::is_image_extension(ext));
    }
}
