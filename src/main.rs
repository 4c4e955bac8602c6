// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use qrscan::backends::camera::{CameraBackendType, CameraPosition};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "qrscan")]
#[command(about = "Scan QR codes from a camera")]
#[command(version = qrscan::constants::app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    /// Capture backend (overrides the config file)
    #[arg(long, global = true, value_parser = parse_backend)]
    backend: Option<CameraBackendType>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive scanner in the terminal (default)
    Terminal {
        /// Camera to use: front, back or unspecified
        #[arg(short, long)]
        camera: Option<CameraPosition>,

        /// Serve these image files as cameras instead of real devices
        #[arg(long = "source", num_args = 1..)]
        sources: Vec<PathBuf>,
    },

    /// List available cameras
    List {
        /// Serve these image files as cameras instead of real devices
        #[arg(long = "source", num_args = 1..)]
        sources: Vec<PathBuf>,
    },

    /// Scan without a UI and print each new code
    Scan {
        /// Camera to use: front, back or unspecified
        #[arg(short, long)]
        camera: Option<CameraPosition>,

        /// Frames per second handed to recognition (1-30)
        #[arg(long)]
        fps: Option<u32>,

        /// Exit after the first code
        #[arg(long)]
        once: bool,

        /// Play a sound for each new code
        #[arg(long)]
        sound: bool,

        /// Prefix each code with the local time
        #[arg(long)]
        timestamps: bool,

        /// Serve these image files as cameras instead of real devices
        #[arg(long = "source", num_args = 1..)]
        sources: Vec<PathBuf>,
    },

    /// Decode QR codes in image files
    Decode {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Write TEXT as a QR code image
    Encode {
        /// Text to encode
        text: String,

        /// Output image; the format follows the extension
        #[arg(short, long)]
        output: PathBuf,

        /// Side length in pixels
        #[arg(long, default_value_t = qrscan::constants::generator::DEFAULT_IMAGE_SIZE)]
        size: u32,
    },
}

fn parse_backend(value: &str) -> Result<CameraBackendType, String> {
    match value.to_lowercase().as_str() {
        "gstreamer" | "gst" => Ok(CameraBackendType::GStreamer),
        "file" => Ok(CameraBackendType::File),
        other => Err(format!("unknown backend '{}' (expected gstreamer or file)", other)),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control the log level, e.g. RUST_LOG=qrscan=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let mut config = qrscan::Config::load()?;
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }

    match cli.command {
        None => cli::run_terminal(config, None, Vec::new()),
        Some(Commands::Terminal { camera, sources }) => cli::run_terminal(config, camera, sources),
        Some(Commands::List { sources }) => cli::list_cameras(&config, &sources),
        Some(Commands::Scan {
            camera,
            fps,
            once,
            sound,
            timestamps,
            sources,
        }) => {
            if let Some(camera) = camera {
                config.camera_position = camera;
            }
            if let Some(fps) = fps {
                config.scan_framerate = qrscan::Config::clamped_framerate(fps);
            }
            config.play_sound = sound;
            cli::scan(
                &config,
                &sources,
                cli::ScanOptions { once, timestamps },
            )
        }
        Some(Commands::Decode { files }) => cli::decode_files(&files),
        Some(Commands::Encode { text, output, size }) => cli::encode_text(&text, &output, size),
    }
}
