// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for camera capture and sound
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          Scanner / Display controller       │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                  │
//! │  ┌─────────────┐    ┌──────────────────┐    │
//! │  │    Audio    │    │     Camera       │    │
//! │  │ (GStreamer) │    │ (GStreamer/File) │    │
//! │  └─────────────┘    └──────────────────┘    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! - [`audio`]: notification sound playback
//! - [`camera`]: device enumeration and capture sessions

pub mod audio;
pub mod camera;
