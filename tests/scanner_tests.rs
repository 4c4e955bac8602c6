// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the scanner session lifecycle

mod common;

use common::*;
use qrscan::backends::camera::{CameraPosition, Framerate};
use qrscan::recognition::MetadataType;
use qrscan::{CaptureError, Scanner};
use std::sync::{Arc, Mutex};

#[test]
fn test_start_while_active_is_idempotent() {
    let (mut scanner, handle) = scripted_scanner(phone_cameras());
    scanner.start_capture().unwrap();
    handle.deliver_qr("A");
    scanner.process_pending_events();
    let session = scanner.session_id();

    assert_eq!(scanner.start_capture(), Ok(()));
    assert_eq!(scanner.session_id(), session);
    assert_eq!(scanner.scanned_string().as_deref(), Some("A"));
    assert_eq!(handle.opened(), 1);
}

#[test]
fn test_pause_while_inactive_is_noop() {
    let (mut scanner, handle) = scripted_scanner(phone_cameras());
    scanner.pause_capture();
    assert!(!scanner.is_active());
    assert_eq!(handle.stopped(), 0);
}

#[test]
fn test_repeated_codes_notify_once_per_change() {
    let (mut scanner, handle) = scripted_scanner(phone_cameras());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    scanner.observe(move |value| sink.lock().unwrap().push(value.clone()));

    scanner.start_capture().unwrap();
    for text in ["A", "A", "B", "B"] {
        handle.deliver_qr(text);
    }
    assert_eq!(scanner.process_pending_events(), 4);

    assert_eq!(
        *seen.lock().unwrap(),
        vec![Some("A".to_string()), Some("B".to_string())]
    );
}

#[test]
fn test_events_after_pause_are_discarded() {
    let (mut scanner, handle) = scripted_scanner(phone_cameras());
    scanner.start_capture().unwrap();
    handle.deliver_qr("A");
    scanner.process_pending_events();

    handle.deliver_qr("late");
    scanner.pause_capture();
    scanner.process_pending_events();

    assert_eq!(scanner.scanned_string().as_deref(), Some("A"));
    assert_eq!(handle.stopped(), 1);
}

#[test]
fn test_no_matching_camera() {
    let (mut scanner, handle) =
        scripted_scanner(vec![camera("Back Camera", CameraPosition::Back)]);
    scanner.set_camera_position(CameraPosition::Front);

    assert_eq!(scanner.start_capture(), Err(CaptureError::NoCameraAvailable));
    assert!(!scanner.is_active());
    assert_eq!(scanner.scanned_string(), None);
    assert_eq!(handle.opened(), 0);
}

#[test]
fn test_no_cameras_at_all() {
    let (mut scanner, _) = scripted_scanner(Vec::new());
    assert_eq!(scanner.start_capture(), Err(CaptureError::NoCameraAvailable));
}

#[test]
fn test_open_failure_is_connection_error() {
    let (backend, _) = ScriptedBackend::failing(phone_cameras(), "permission denied");
    let mut scanner = Scanner::new(Box::new(backend));

    match scanner.start_capture() {
        Err(CaptureError::DeviceConnectionError(reason)) => {
            assert!(reason.contains("permission denied"));
        }
        other => panic!("expected connection error, got {:?}", other),
    }
    assert!(!scanner.is_active());
}

#[test]
fn test_start_resets_previous_value() {
    let (mut scanner, handle) = scripted_scanner(phone_cameras());
    scanner.start_capture().unwrap();
    handle.deliver_qr("A");
    scanner.process_pending_events();
    scanner.pause_capture();
    assert_eq!(scanner.scanned_string().as_deref(), Some("A"));

    scanner.start_capture().unwrap();
    assert_eq!(scanner.scanned_string(), None);
}

#[test]
fn test_failed_start_also_resets_value() {
    let (mut scanner, handle) = scripted_scanner(vec![camera("Back Camera", CameraPosition::Back)]);
    scanner.start_capture().unwrap();
    handle.deliver_qr("A");
    scanner.process_pending_events();
    scanner.pause_capture();

    scanner.set_camera_position(CameraPosition::Front);
    assert!(scanner.start_capture().is_err());
    assert_eq!(scanner.scanned_string(), None);
}

#[test]
fn test_restart_creates_new_session() {
    let (mut scanner, handle) = scripted_scanner(phone_cameras());
    scanner.start_capture().unwrap();
    let first = scanner.session_id();
    scanner.pause_capture();
    assert_eq!(scanner.session_id(), None);

    scanner.start_capture().unwrap();
    let second = scanner.session_id();
    assert!(second.is_some());
    assert_ne!(first, second);
    assert_eq!(handle.opened(), 2);
}

#[test]
fn test_stale_session_events_ignored_after_restart() {
    let (mut scanner, handle) = scripted_scanner(phone_cameras());
    scanner.start_capture().unwrap();
    scanner.pause_capture();
    scanner.start_capture().unwrap();

    handle.deliver_to(0, vec![qr("stale")]);
    handle.deliver_to(1, vec![qr("fresh")]);
    scanner.process_pending_events();

    assert_eq!(scanner.scanned_string().as_deref(), Some("fresh"));
}

#[test]
fn test_session_configured_for_qr_and_throttled() {
    let (mut scanner, handle) = scripted_scanner(phone_cameras());
    scanner.start_capture().unwrap();

    let config = handle.last_config().unwrap();
    assert_eq!(config.metadata_types, vec![MetadataType::Qr]);
    assert_eq!(config.framerate, Framerate::new(30, 10));
}

#[test]
fn test_position_selects_device() {
    let (scanner, handle) = scripted_scanner(phone_cameras());
    let mut scanner = scanner.with_camera_position(CameraPosition::Front);
    scanner.start_capture().unwrap();
    assert_eq!(handle.last_device().unwrap().name, "Front Camera");
    assert_eq!(scanner.active_device().unwrap().position, CameraPosition::Front);
}

#[test]
fn test_unspecified_position_uses_default_device() {
    let (mut scanner, handle) = scripted_scanner(phone_cameras());
    scanner.start_capture().unwrap();
    assert_eq!(handle.last_device().unwrap().name, "Back Camera");
}

#[test]
fn test_non_qr_objects_ignored() {
    let (mut scanner, handle) = scripted_scanner(phone_cameras());
    scanner.start_capture().unwrap();
    handle.deliver(vec![barcode(MetadataType::Ean13, "4006381333931")]);
    handle.deliver(Vec::new());
    scanner.process_pending_events();
    assert_eq!(scanner.scanned_string(), None);
}

#[test]
fn test_scanned_code_follows_first_qr_object() {
    let (mut scanner, handle) = scripted_scanner(phone_cameras());
    let mut codes = scanner.subscribe_code();
    scanner.start_capture().unwrap();
    codes.borrow_and_update();

    handle.deliver(vec![
        barcode(MetadataType::Ean13, "4006381333931"),
        qr_at("A", 0.1, 0.2),
        qr_at("B", 0.6, 0.6),
    ]);
    scanner.process_pending_events();

    let code = scanner.scanned_code().unwrap();
    assert_eq!(code.string_value.as_deref(), Some("A"));
    assert_eq!((code.bounds.x, code.bounds.y), (0.1, 0.2));
    assert!(codes.has_changed().unwrap());
    codes.borrow_and_update();

    // Same string elsewhere in the frame is not a new scan
    handle.deliver(vec![qr_at("A", 0.5, 0.5)]);
    scanner.process_pending_events();
    assert!(!codes.has_changed().unwrap());
    assert_eq!(scanner.scanned_code().unwrap().bounds.x, 0.1);

    handle.deliver(vec![qr_at("B", 0.6, 0.6)]);
    scanner.process_pending_events();
    assert!(codes.has_changed().unwrap());
    assert_eq!(scanner.scanned_code().unwrap().bounds.x, 0.6);
}

#[test]
fn test_start_clears_scanned_code() {
    let (mut scanner, handle) = scripted_scanner(phone_cameras());
    scanner.start_capture().unwrap();
    handle.deliver(vec![qr_at("A", 0.1, 0.1)]);
    scanner.process_pending_events();
    scanner.pause_capture();
    assert!(scanner.scanned_code().is_some());

    scanner.start_capture().unwrap();
    assert_eq!(scanner.scanned_code(), None);
}

#[test]
fn test_custom_framerate_is_clamped() {
    let (scanner, _) = scripted_scanner(phone_cameras());
    let scanner = scanner.with_scan_framerate(100);
    assert_eq!(scanner.throttled_framerate(), Framerate::new(30, 1));
}

#[tokio::test]
async fn test_dispatch_next_waits_for_event() {
    let (mut scanner, handle) = scripted_scanner(phone_cameras());
    let mut rx = scanner.subscribe();
    scanner.start_capture().unwrap();
    rx.borrow_and_update();

    handle.deliver_qr("async");
    assert!(scanner.dispatch_next().await);
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().as_deref(), Some("async"));
}

#[test]
fn test_drop_stops_session() {
    let (mut scanner, handle) = scripted_scanner(phone_cameras());
    scanner.start_capture().unwrap();
    drop(scanner);
    assert_eq!(handle.stopped(), 1);
}
