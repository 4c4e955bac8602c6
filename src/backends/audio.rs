// SPDX-License-Identifier: MPL-2.0

//! Notification sounds
//!
//! Playback is fire-and-forget: [`SoundPlayer::play`] returns immediately
//! and a failed playback is only logged.

use std::io::Write;
use std::path::Path;
#[cfg(feature = "gst")]
use std::path::PathBuf;
use tracing::debug;
#[cfg(feature = "gst")]
use tracing::warn;

/// Something that can play the "code scanned" sound
pub trait SoundPlayer: Send + Sync {
    fn play(&self);
}

/// Rings the terminal bell
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl SoundPlayer for TerminalBell {
    fn play(&self) {
        let mut stderr = std::io::stderr();
        if let Err(e) = stderr.write_all(b"\x07").and_then(|_| stderr.flush()) {
            debug!(error = %e, "Failed to ring terminal bell");
        }
    }
}

/// Plays a sound file, or a short built-in tick, through GStreamer
#[cfg(feature = "gst")]
#[derive(Debug, Clone)]
pub struct GstSoundPlayer {
    sound_file: Option<PathBuf>,
}

#[cfg(feature = "gst")]
impl GstSoundPlayer {
    pub fn new(sound_file: Option<PathBuf>) -> Self {
        Self { sound_file }
    }

    fn build_element(&self) -> Result<gstreamer::Element, String> {
        use crate::constants::sound;

        gstreamer::init().map_err(|e| format!("GStreamer init failed: {}", e))?;
        match &self.sound_file {
            Some(path) => {
                let uri = gstreamer::glib::filename_to_uri(path, None)
                    .map_err(|e| format!("Invalid sound path '{}': {}", path.display(), e))?;
                gstreamer::ElementFactory::make("playbin")
                    .property("uri", uri.as_str())
                    .build()
                    .map_err(|e| format!("Failed to create playbin: {}", e))
            }
            None => gstreamer::parse::launch(sound::TICK_PIPELINE)
                .map_err(|e| format!("Failed to build tick pipeline: {}", e)),
        }
    }
}

#[cfg(feature = "gst")]
impl SoundPlayer for GstSoundPlayer {
    fn play(&self) {
        use crate::constants::timing;
        use gstreamer::prelude::*;

        let element = match self.build_element() {
            Ok(element) => element,
            Err(e) => {
                warn!(error = %e, "Cannot play notification sound");
                return;
            }
        };

        let spawned = std::thread::Builder::new()
            .name("sound".to_string())
            .spawn(move || {
                if let Err(e) = element.set_state(gstreamer::State::Playing) {
                    warn!(error = %e, "Failed to start notification sound");
                    let _ = element.set_state(gstreamer::State::Null);
                    return;
                }

                if let Some(bus) = element.bus()
                    && let Some(msg) = bus.timed_pop_filtered(
                        gstreamer::ClockTime::from_seconds(timing::SOUND_TIMEOUT_SECS),
                        &[gstreamer::MessageType::Eos, gstreamer::MessageType::Error],
                    )
                    && let gstreamer::MessageView::Error(err) = msg.view()
                {
                    warn!(error = %err.error(), "Notification sound failed");
                }

                let _ = element.set_state(gstreamer::State::Null);
            });

        if let Err(e) = spawned {
            warn!(error = %e, "Failed to spawn sound thread");
        }
    }
}

/// Best player available in this build
///
/// `sound_file` is only honoured by the GStreamer player; without it the
/// terminal bell is used.
pub fn default_player(sound_file: Option<&Path>) -> Box<dyn SoundPlayer> {
    #[cfg(feature = "gst")]
    {
        Box::new(GstSoundPlayer::new(sound_file.map(Path::to_path_buf)))
    }
    #[cfg(not(feature = "gst"))]
    {
        if let Some(path) = sound_file {
            debug!(path = %path.display(), "Sound files need GStreamer, using terminal bell");
        }
        Box::new(TerminalBell)
    }
}
