// SPDX-License-Identifier: MPL-2.0

//! GStreamer live-feed pipeline for V4L2 cameras
//!
//! ```text
//! v4l2src → videoconvert → RGBA caps → appsink → FrameSlot
//! ```

use super::FrameSlot;
use super::types::CameraFrame;
use crate::constants::pipeline;
use crate::errors::{CaptureError, CaptureResult};
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, info, warn};

static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Running capture pipeline; dropping it releases the device
pub struct LivePipeline {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
    device_path: String,
}

impl LivePipeline {
    /// Build and start a pipeline for `device_path`, publishing into `slot`
    pub fn start(device_path: &str, slot: FrameSlot) -> CaptureResult<Self> {
        info!(device = %device_path, "Creating V4L2 pipeline");

        gstreamer::init().map_err(|e| CaptureError::Backend(e.to_string()))?;

        let description = format!(
            "v4l2src device=\"{}\" ! videoconvert ! video/x-raw,format=RGBA ! appsink name={}",
            device_path,
            pipeline::SINK_NAME
        );
        debug!(pipeline = %description, "Launching pipeline");

        let gst_pipeline = gstreamer::parse::launch(&description)
            .map_err(|e| CaptureError::Backend(format!("Failed to create pipeline: {}", e)))?
            .downcast::<gstreamer::Pipeline>()
            .map_err(|_| CaptureError::Backend("Launch result is not a pipeline".to_string()))?;

        let appsink = gst_pipeline
            .by_name(pipeline::SINK_NAME)
            .ok_or_else(|| CaptureError::Backend("Failed to get appsink".to_string()))?
            .dynamic_cast::<AppSink>()
            .map_err(|_| CaptureError::Backend("Failed to cast appsink".to_string()))?;

        appsink.set_property("sync", false);
        appsink.set_property("max-buffers", pipeline::MAX_BUFFERS);
        appsink.set_property("drop", true);
        appsink.set_property("enable-last-sample", false);

        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let frame_num = FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);

                    let sample = appsink.pull_sample().map_err(|e| {
                        if frame_num % 30 == 0 {
                            error!(frame = frame_num, error = ?e, "Failed to pull sample");
                        }
                        gstreamer::FlowError::Eos
                    })?;
                    let buffer = sample.buffer().ok_or(gstreamer::FlowError::Error)?;
                    let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;
                    let video_info =
                        VideoInfo::from_caps(caps).map_err(|_| gstreamer::FlowError::Error)?;
                    let map = buffer
                        .map_readable()
                        .map_err(|_| gstreamer::FlowError::Error)?;

                    let width = video_info.width();
                    let height = video_info.height();
                    let stride = video_info.stride()[0] as usize;
                    let row_bytes = width as usize * 4;

                    // Repack into tightly packed rows
                    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
                    for row in map.as_slice().chunks(stride).take(height as usize) {
                        match row.get(..row_bytes) {
                            Some(bytes) => pixels.extend_from_slice(bytes),
                            None => return Err(gstreamer::FlowError::Error),
                        }
                    }

                    match CameraFrame::from_rgba(width, height, pixels) {
                        Some(frame) => slot.store(frame),
                        None => {
                            if frame_num % 30 == 0 {
                                warn!(frame = frame_num, width, height, "Truncated frame dropped");
                            }
                        }
                    }

                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        gst_pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| CaptureError::Backend(format!("Failed to start pipeline: {}", e)))?;

        let (result, state, pending) = gst_pipeline.state(gstreamer::ClockTime::from_seconds(
            pipeline::STATE_CHANGE_TIMEOUT_SECS,
        ));
        debug!(result = ?result, state = ?state, pending = ?pending, "Pipeline state");
        if result.is_err() {
            let reason = bus_error(&gst_pipeline)
                .unwrap_or_else(|| format!("{} did not start", device_path));
            let _ = gst_pipeline.set_state(gstreamer::State::Null);
            return Err(CaptureError::Backend(reason));
        }

        info!(device = %device_path, "V4L2 pipeline running");
        Ok(Self {
            pipeline: gst_pipeline,
            appsink,
            device_path: device_path.to_string(),
        })
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

/// First error message posted on the pipeline bus, if any
fn bus_error(gst_pipeline: &gstreamer::Pipeline) -> Option<String> {
    let bus = gst_pipeline.bus()?;
    let msg = bus.timed_pop_filtered(
        gstreamer::ClockTime::ZERO,
        &[gstreamer::MessageType::Error],
    )?;
    match msg.view() {
        gstreamer::MessageView::Error(err) => Some(err.error().to_string()),
        _ => None,
    }
}

impl Drop for LivePipeline {
    fn drop(&mut self) {
        debug!(device = %self.device_path, "Stopping V4L2 pipeline");
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());
        let _ = self.pipeline.set_state(gstreamer::State::Null);
    }
}
