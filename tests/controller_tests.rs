// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the display controller

mod common;

use common::*;
use qrscan::backends::camera::CameraPosition;
use qrscan::constants::ui;
use qrscan::{ScanController, Scanner};

fn controller() -> (ScanController, BackendHandle, CountingSound) {
    let (scanner, handle) = scripted_scanner(phone_cameras());
    let sound = CountingSound::default();
    let controller = ScanController::new(scanner).with_sound(Box::new(sound.clone()));
    (controller, handle, sound)
}

#[test]
fn test_appear_starts_scanning() {
    let (mut controller, handle, _) = controller();
    controller.view_did_appear();

    assert!(controller.is_capturing());
    assert_eq!(controller.status_text(), ui::STATUS_LOOKING);
    assert_eq!(controller.code_text(), "");
    assert_eq!(handle.opened(), 1);
}

#[test]
fn test_new_code_updates_labels_and_plays_sound() {
    let (mut controller, handle, sound) = controller();
    controller.view_did_appear();

    handle.deliver_qr("https://example.org");
    assert!(controller.pump());
    assert_eq!(controller.status_text(), ui::STATUS_SCANNED);
    assert_eq!(controller.code_text(), "https://example.org");
    assert_eq!(sound.plays(), 1);

    // Same code again is not news
    handle.deliver_qr("https://example.org");
    assert!(!controller.pump());
    assert_eq!(sound.plays(), 1);

    handle.deliver_qr("second");
    assert!(controller.pump());
    assert_eq!(controller.code_text(), "second");
    assert_eq!(sound.plays(), 2);
}

#[test]
fn test_disappear_pauses_and_clears() {
    let (mut controller, handle, sound) = controller();
    controller.view_did_appear();
    handle.deliver_qr("A");
    controller.pump();

    controller.view_did_disappear();
    assert!(!controller.is_capturing());
    assert_eq!(controller.status_text(), ui::STATUS_NOT_SCANNING);
    assert_eq!(controller.code_text(), "");
    assert_eq!(handle.stopped(), 1);

    // Nothing observed while paused
    handle.deliver_qr("B");
    assert!(!controller.pump());
    assert_eq!(sound.plays(), 1);
}

#[test]
fn test_same_code_after_restart_plays_again() {
    let (mut controller, handle, sound) = controller();
    controller.view_did_appear();
    handle.deliver_qr("A");
    controller.pump();

    controller.view_did_disappear();
    controller.view_did_appear();
    assert_eq!(controller.status_text(), ui::STATUS_LOOKING);

    handle.deliver_qr("A");
    assert!(controller.pump());
    assert_eq!(sound.plays(), 2);
}

#[test]
fn test_start_while_capturing_keeps_state() {
    let (mut controller, handle, _) = controller();
    controller.view_did_appear();
    handle.deliver_qr("A");
    controller.pump();

    assert!(controller.start_capture());
    assert_eq!(controller.status_text(), ui::STATUS_SCANNED);
    assert_eq!(controller.code_text(), "A");
    assert_eq!(handle.opened(), 1);
}

#[test]
fn test_connection_failure_alert() {
    let (backend, _) = ScriptedBackend::failing(phone_cameras(), "device busy");
    let mut controller = ScanController::new(Scanner::new(Box::new(backend)));

    assert!(!controller.start_capture());
    let alert = controller.alert().cloned().unwrap();
    assert_eq!(alert.title, ui::ALERT_TITLE);
    assert!(alert.message.contains("device busy"));
    assert_eq!(controller.status_text(), alert.message);
    assert_eq!(controller.code_text(), "");
}

#[test]
fn test_disappear_after_failed_start_keeps_alert_status() {
    let (backend, handle) = ScriptedBackend::failing(phone_cameras(), "device busy");
    let mut controller = ScanController::new(Scanner::new(Box::new(backend)));

    controller.view_did_appear();
    controller.view_did_disappear();

    assert!(controller.status_text().contains("device busy"));
    assert!(controller.alert().is_some());
    assert_eq!(handle.stopped(), 0);
}

#[test]
fn test_cycle_camera_restarts_on_new_position() {
    let (mut controller, handle, _) = controller();
    controller.view_did_appear();

    let position = controller.cycle_camera_position();
    assert_eq!(position, CameraPosition::Back);
    assert!(controller.is_capturing());
    assert_eq!(handle.opened(), 2);
    assert_eq!(handle.stopped(), 1);
    assert_eq!(handle.last_device().unwrap().position, CameraPosition::Back);

    let position = controller.cycle_camera_position();
    assert_eq!(position, CameraPosition::Front);
    assert_eq!(handle.last_device().unwrap().name, "Front Camera");
}

#[test]
fn test_toggle_capture() {
    let (mut controller, _, _) = controller();
    assert!(controller.toggle_capture());
    assert!(controller.is_capturing());
    assert!(!controller.toggle_capture());
    assert!(!controller.is_capturing());
}

#[tokio::test]
async fn test_pump_next() {
    let (mut controller, handle, sound) = controller();
    controller.view_did_appear();

    handle.deliver_qr("async");
    assert!(controller.pump_next().await);
    assert_eq!(controller.code_text(), "async");
    assert_eq!(sound.plays(), 1);
}
