// SPDX-License-Identifier: GPL-3.0-only

//! Throttled scanning pipeline
//!
//! ```text
//! source ! videoconvert ! videorate ! capsfilter(RGBA, throttled) ! appsink
//! ```
//!
//! The appsink callback runs on GStreamer's streaming thread. It maps each
//! buffer to a [`CameraFrame`], runs recognition, and hands the result to
//! the session's [`MetadataOutput`]; the preview channel receives the frame.

use super::super::types::*;
use crate::constants::{capture, timing};
use crate::recognition::{MetadataRecognizer, QrDetector};
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// A capture pipeline feeding recognition
pub struct ScanPipeline {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
}

impl ScanPipeline {
    /// Build the pipeline around `device`'s source element
    pub fn new(
        device: &gstreamer::Device,
        config: &SessionConfig,
        output: MetadataOutput,
        preview_tx: PreviewSender,
    ) -> BackendResult<Self> {
        info!(framerate = %config.framerate, "Creating scan pipeline");

        let pipeline = gstreamer::Pipeline::new();

        let source = device.create_element(Some("source")).map_err(|e| {
            BackendError::DeviceBusy(format!("Failed to create camera source: {}", e))
        })?;

        let make = |factory: &str| {
            gstreamer::ElementFactory::make(factory)
                .build()
                .map_err(|e| {
                    BackendError::InitializationFailed(format!(
                        "Failed to create {}: {}",
                        factory, e
                    ))
                })
        };
        let videoconvert = make("videoconvert")?;
        let videorate = make("videorate")?;
        // Only ever drop frames, never duplicate them to fill the rate
        videorate.set_property("drop-only", true);

        let caps = gstreamer::Caps::builder("video/x-raw")
            .field("format", "RGBA")
            .field(
                "framerate",
                gstreamer::Fraction::new(config.framerate.num as i32, config.framerate.denom as i32),
            )
            .build();
        let capsfilter = gstreamer::ElementFactory::make("capsfilter")
            .property("caps", &caps)
            .build()
            .map_err(|e| {
                BackendError::InitializationFailed(format!("Failed to create capsfilter: {}", e))
            })?;

        let appsink = AppSink::builder().build();
        appsink.set_property("sync", false);
        appsink.set_property("max-buffers", capture::MAX_BUFFERS);
        appsink.set_property("drop", true);
        appsink.set_property("enable-last-sample", false);

        pipeline
            .add_many([
                &source,
                &videoconvert,
                &videorate,
                &capsfilter,
                appsink.upcast_ref(),
            ])
            .map_err(|e| {
                BackendError::InitializationFailed(format!("Failed to add elements: {}", e))
            })?;
        gstreamer::Element::link_many([
            &source,
            &videoconvert,
            &videorate,
            &capsfilter,
            appsink.upcast_ref(),
        ])
        .map_err(|e| BackendError::DeviceBusy(format!("Failed to link camera source: {}", e)))?;

        let detector = QrDetector::new();
        let metadata_types = config.metadata_types.clone();
        let mut frame_num: u64 = 0;

        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let frame_start = Instant::now();
                    frame_num += 1;

                    let sample = appsink.pull_sample().map_err(|e| {
                        debug!(error = ?e, "Failed to pull sample");
                        gstreamer::FlowError::Eos
                    })?;
                    let frame = sample_to_frame(&sample, frame_start).ok_or_else(|| {
                        if frame_num % timing::FRAME_LOG_INTERVAL == 1 {
                            error!(frame = frame_num, "Could not map sample to a frame");
                        }
                        gstreamer::FlowError::Error
                    })?;

                    let objects = detector.recognize(&frame, &metadata_types);
                    if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                        debug!(
                            frame = frame_num,
                            width = frame.width,
                            height = frame.height,
                            codes = objects.len(),
                            elapsed_ms = frame_start.elapsed().as_millis(),
                            "Frame processed"
                        );
                    }

                    if !output.deliver(objects) {
                        debug!("Metadata receiver gone, dropping frame");
                    }
                    preview_tx.send_replace(Some(Arc::new(frame)));

                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        Ok(Self { pipeline, appsink })
    }

    /// Set the pipeline playing and report errors raised right away
    pub fn start(&self) -> BackendResult<()> {
        debug!("Setting scan pipeline to PLAYING");
        self.pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| BackendError::DeviceBusy(format!("Failed to start camera: {}", e)))?;

        let bus = self
            .pipeline
            .bus()
            .ok_or_else(|| BackendError::Other("No bus on pipeline".into()))?;
        if let Some(msg) = bus.timed_pop_filtered(
            gstreamer::ClockTime::from_mseconds(timing::START_ERROR_CHECK_MS),
            &[gstreamer::MessageType::Error],
        ) && let gstreamer::MessageView::Error(err) = msg.view()
        {
            error!(
                error = %err.error(),
                debug = ?err.debug(),
                source = ?err.src().map(|s| s.name()),
                "GStreamer error during start"
            );
            self.shutdown();
            return Err(BackendError::DeviceBusy(err.error().to_string()));
        }

        info!("Scan pipeline started");
        Ok(())
    }

    /// Whether the pipeline is currently playing
    pub fn is_playing(&self) -> bool {
        self.pipeline.current_state() == gstreamer::State::Playing
    }

    /// Stop the pipeline and release the device
    pub fn stop(self) {
        info!("Stopping scan pipeline");
        self.shutdown();
    }

    fn shutdown(&self) {
        // Drop the callback first so nothing is delivered while tearing down
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());
        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            warn!(error = %e, "Failed to set scan pipeline to NULL");
        }
    }
}

impl Drop for ScanPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Copy a sample's buffer into a frame, honouring the row stride
fn sample_to_frame(sample: &gstreamer::Sample, captured_at: Instant) -> Option<CameraFrame> {
    let buffer = sample.buffer()?;
    let caps = sample.caps()?;
    let video_info = VideoInfo::from_caps(caps).ok()?;
    let format = PixelFormat::from_gst_format(&video_info.format().to_string())?;
    let map = buffer.map_readable().ok()?;

    Some(CameraFrame {
        width: video_info.width(),
        height: video_info.height(),
        data: Arc::from(map.as_slice()),
        format,
        stride: video_info.stride()[0] as u32,
        captured_at,
    })
}
