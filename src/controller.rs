// SPDX-License-Identifier: MPL-2.0

//! Display controller
//!
//! Drives a [`Scanner`] from view lifecycle events and turns its state into
//! the two labels, the alert and the sound a front end presents. Front ends
//! call [`ScanController::pump`] (or await [`ScanController::pump_next`])
//! from their event loop; all state lives on that one context.

use crate::backends::audio::SoundPlayer;
use crate::backends::camera::CameraPosition;
use crate::constants::ui;
use crate::errors::CaptureError;
use crate::scanner::Scanner;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Modal message shown when capture fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    fn capture_failed(err: &CaptureError) -> Self {
        Self {
            title: ui::ALERT_TITLE.to_string(),
            message: err.failure_reason(),
        }
    }
}

pub struct ScanController {
    scanner: Scanner,
    status_text: String,
    code_text: String,
    alert: Option<Alert>,
    sound: Option<Box<dyn SoundPlayer>>,
    /// Only present while capturing
    code_rx: Option<watch::Receiver<Option<String>>>,
}

impl ScanController {
    pub fn new(scanner: Scanner) -> Self {
        Self {
            scanner,
            status_text: ui::STATUS_NOT_SCANNING.to_string(),
            code_text: String::new(),
            alert: None,
            sound: None,
            code_rx: None,
        }
    }

    /// Play `sound` for every new code
    pub fn with_sound(mut self, sound: Box<dyn SoundPlayer>) -> Self {
        self.sound = Some(sound);
        self
    }

    pub fn set_sound(&mut self, sound: Option<Box<dyn SoundPlayer>>) {
        self.sound = sound;
    }

    pub fn view_did_appear(&mut self) {
        self.start_capture();
    }

    pub fn view_did_disappear(&mut self) {
        self.pause_capture();
    }

    /// Start scanning. Returns false and raises an alert on failure.
    pub fn start_capture(&mut self) -> bool {
        if self.is_capturing() {
            return true;
        }

        self.status_text = ui::STATUS_ACTIVATING.to_string();
        self.code_text.clear();

        match self.scanner.start_capture() {
            Ok(()) => {
                self.status_text = ui::STATUS_LOOKING.to_string();
                self.code_rx = Some(self.scanner.subscribe());
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to start capture");
                let alert = Alert::capture_failed(&e);
                self.status_text = alert.message.clone();
                self.alert = Some(alert);
                false
            }
        }
    }

    /// Stop scanning; labels are left alone when not capturing
    pub fn pause_capture(&mut self) {
        if !self.is_capturing() {
            return;
        }
        self.code_rx = None;
        self.scanner.pause_capture();
        self.status_text = ui::STATUS_NOT_SCANNING.to_string();
        self.code_text.clear();
    }

    /// Pause if capturing, start otherwise
    pub fn toggle_capture(&mut self) -> bool {
        if self.is_capturing() {
            self.pause_capture();
            false
        } else {
            self.start_capture()
        }
    }

    /// Move to the next camera position, restarting capture if it was running
    pub fn cycle_camera_position(&mut self) -> CameraPosition {
        let was_capturing = self.is_capturing();
        if was_capturing {
            self.pause_capture();
        }

        let next = self.scanner.camera_position().next();
        self.scanner.set_camera_position(next);
        info!(position = %next, "Switched camera position");

        if was_capturing {
            self.start_capture();
        }
        next
    }

    /// Handle queued frame metadata. Returns whether a new code is shown.
    pub fn pump(&mut self) -> bool {
        self.scanner.process_pending_events();
        self.refresh_code()
    }

    /// Wait for the next frame's metadata and handle it
    ///
    /// Pends while not capturing.
    pub async fn pump_next(&mut self) -> bool {
        self.scanner.dispatch_next().await;
        self.refresh_code()
    }

    fn refresh_code(&mut self) -> bool {
        let Some(rx) = self.code_rx.as_mut() else {
            return false;
        };
        if !rx.has_changed().unwrap_or(false) {
            return false;
        }
        let value = rx.borrow_and_update().clone();
        self.scanned_string_changed(value)
    }

    fn scanned_string_changed(&mut self, value: Option<String>) -> bool {
        let Some(code) = value else {
            self.code_text.clear();
            return false;
        };

        debug!(code = %code, "Showing new code");
        self.status_text = ui::STATUS_SCANNED.to_string();
        self.code_text = code;
        if let Some(sound) = &self.sound {
            sound.play();
        }
        true
    }

    pub fn is_capturing(&self) -> bool {
        self.scanner.is_active()
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn code_text(&self) -> &str {
        &self.code_text
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    /// Dismiss the current alert
    pub fn take_alert(&mut self) -> Option<Alert> {
        self.alert.take()
    }

    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::FileSourceBackend;

    fn controller_without_cameras() -> ScanController {
        ScanController::new(Scanner::new(Box::new(FileSourceBackend::default())))
    }

    #[test]
    fn test_initial_labels() {
        let controller = controller_without_cameras();
        assert_eq!(controller.status_text(), ui::STATUS_NOT_SCANNING);
        assert_eq!(controller.code_text(), "");
        assert!(controller.alert().is_none());
    }

    #[test]
    fn test_start_failure_raises_alert() {
        let mut controller = controller_without_cameras();
        controller.view_did_appear();

        assert!(!controller.is_capturing());
        let alert = controller.take_alert().unwrap();
        assert_eq!(alert.title, "Error");
        assert_eq!(alert.message, CaptureError::NoCameraAvailable.failure_reason());
        assert_eq!(controller.status_text(), alert.message);
        assert!(controller.alert().is_none());
    }

    #[test]
    fn test_disappear_after_failed_start_keeps_error() {
        let mut controller = controller_without_cameras();
        controller.view_did_appear();
        let status = controller.status_text().to_string();

        controller.view_did_disappear();
        assert_eq!(controller.status_text(), status);
        assert_ne!(controller.status_text(), ui::STATUS_NOT_SCANNING);
    }

    #[test]
    fn test_pump_without_capture() {
        let mut controller = controller_without_cameras();
        assert!(!controller.pump());
    }
}
