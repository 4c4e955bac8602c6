// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! - Listing available cameras
//! - Headless scanning
//! - Decoding image files
//! - Generating QR code images
//! - Launching the terminal UI

use chrono::Local;
use qrscan::backends::audio;
use qrscan::backends::camera::file_source::load_image_as_frame;
use qrscan::backends::camera::{
    CameraBackendType, CameraPosition, CaptureBackend, get_backend_for_type,
};
use qrscan::generator::qr_code_image;
use qrscan::recognition::QrDetector;
use qrscan::{Config, ScanController, Scanner};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Options of the headless `scan` command
pub struct ScanOptions {
    /// Stop after the first code
    pub once: bool,
    /// Prefix output lines with the local time
    pub timestamps: bool,
}

/// Image sources always win over the configured backend
fn backend_for(config: &Config, sources: &[PathBuf]) -> Box<dyn CaptureBackend> {
    let backend_type = if sources.is_empty() {
        config.backend
    } else {
        CameraBackendType::File
    };
    get_backend_for_type(backend_type, sources)
}

fn build_controller(config: &Config, sources: &[PathBuf]) -> ScanController {
    let scanner = Scanner::from_config(backend_for(config, sources), config);
    let mut controller = ScanController::new(scanner);
    if config.play_sound {
        controller.set_sound(Some(audio::default_player(config.sound_file.as_deref())));
    }
    controller
}

/// Run the interactive terminal scanner
pub fn run_terminal(
    mut config: Config,
    camera: Option<CameraPosition>,
    sources: Vec<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(camera) = camera {
        config.camera_position = camera;
    }
    let controller = build_controller(&config, &sources);
    qrscan::terminal::run(controller, config.show_preview)
}

/// List all available cameras
pub fn list_cameras(
    config: &Config,
    sources: &[PathBuf],
) -> Result<(), Box<dyn std::error::Error>> {
    let backend = backend_for(config, sources);
    if !backend.is_available() {
        return Err(format!("{} backend is not available", backend.backend_type()).into());
    }

    let cameras = backend.enumerate_cameras();
    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras ({}):", backend.backend_type());
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        println!("      Position: {}", camera.position);
        println!("      Path: {}", camera.path);
    }

    Ok(())
}

/// Scan until interrupted and print every new code
pub fn scan(
    config: &Config,
    sources: &[PathBuf],
    options: ScanOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut controller = build_controller(config, sources);

    let (interrupt_tx, mut interrupt_rx) = tokio::sync::mpsc::unbounded_channel();
    ctrlc::set_handler(move || {
        let _ = interrupt_tx.send(());
    })?;

    if !controller.start_capture() {
        let message = controller
            .take_alert()
            .map(|alert| format!("{}: {}", alert.title, alert.message))
            .unwrap_or_else(|| controller.status_text().to_string());
        return Err(message.into());
    }

    if let Some(device) = controller.scanner().active_device() {
        eprintln!(
            "Scanning with {} at {} fps (Ctrl+C to stop)",
            device.name,
            controller.scanner().throttled_framerate()
        );
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        loop {
            tokio::select! {
                _ = interrupt_rx.recv() => {
                    info!("Interrupted");
                    break;
                }
                new_code = controller.pump_next() => {
                    if !new_code {
                        continue;
                    }
                    print_code(controller.code_text(), options.timestamps);
                    if options.once {
                        break;
                    }
                }
            }
        }
    });

    controller.pause_capture();
    Ok(())
}

fn print_code(code: &str, timestamps: bool) {
    if timestamps {
        println!("{} {}", Local::now().format("%Y-%m-%d %H:%M:%S"), code);
    } else {
        println!("{}", code);
    }
}

/// Decode every QR code in the given image files
pub fn decode_files(files: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    let detector = QrDetector::new();
    let mut failed = 0;

    for path in files {
        match decode_file(&detector, path) {
            Ok(codes) if codes.is_empty() => println!("{}: no QR code found", path.display()),
            Ok(codes) => {
                for code in codes {
                    println!("{}: {}", path.display(), code);
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to decode file");
                eprintln!("{}: {}", path.display(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(format!("{} of {} files could not be read", failed, files.len()).into());
    }
    Ok(())
}

fn decode_file(detector: &QrDetector, path: &Path) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let frame = load_image_as_frame(path)?;
    Ok(detector
        .detect(&frame)
        .into_iter()
        .map(|object| {
            object
                .string_value
                .unwrap_or_else(|| "<unreadable QR code>".to_string())
        })
        .collect())
}

/// Write `text` as a QR code image to `output`
pub fn encode_text(text: &str, output: &Path, size: u32) -> Result<(), Box<dyn std::error::Error>> {
    let image = qr_code_image(text.as_bytes(), size)?;
    image
        .save(output)
        .map_err(|e| format!("Failed to write '{}': {}", output.display(), e))?;

    info!(path = %output.display(), width = image.width(), "Wrote QR code image");
    println!("{}", output.display());
    Ok(())
}
