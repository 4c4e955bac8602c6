// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::{CameraBackendType, CameraPosition, get_default_backend};
use crate::constants::capture;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Current on-disk layout version
pub const CONFIG_VERSION: u32 = 1;

/// Directory name under the user config dir
const APP_DIR: &str = "qrscan";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Layout version the file was written with
    pub version: u32,
    /// Camera used when scanning starts
    pub camera_position: CameraPosition,
    /// Frames per second handed to recognition
    pub scan_framerate: u32,
    /// Capture backend (gstreamer or file)
    pub backend: CameraBackendType,
    /// Play a sound for each new code
    pub play_sound: bool,
    /// Sound file to play instead of the built-in tick
    pub sound_file: Option<PathBuf>,
    /// Render the live preview in the terminal UI
    pub show_preview: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            camera_position: CameraPosition::Unspecified,
            scan_framerate: capture::DEFAULT_SCAN_FRAMERATE,
            backend: get_default_backend(),
            play_sound: true,
            sound_file: None,
            show_preview: true,
        }
    }
}

impl Config {
    /// `$XDG_CONFIG_HOME/qrscan/config.json`, if a config dir exists
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> AppResult<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from `path`
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(AppError::Config(format!(
                    "Failed to read '{}': {}",
                    path.display(),
                    e
                )));
            }
        };

        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse '{}': {}", path.display(), e))
        })?;
        info!(path = %path.display(), version = config.version, "Loaded configuration");
        Ok(config.normalized())
    }

    /// Write to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Storage(format!("Failed to create config dir: {}", e)))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .map_err(|e| AppError::Storage(format!("Failed to write '{}': {}", path.display(), e)))?;
        debug!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Scan rate within the supported range
    pub fn clamped_framerate(fps: u32) -> u32 {
        fps.clamp(capture::MIN_SCAN_FRAMERATE, capture::NOMINAL_FRAMERATE)
    }

    fn normalized(mut self) -> Self {
        self.scan_framerate = Self::clamped_framerate(self.scan_framerate);
        self
    }
}
