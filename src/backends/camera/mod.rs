// SPDX-License-Identifier: MPL-2.0

//! Capture device abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │    CaptureScreen    │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CaptureDevice Trait │  ← configure / stop / capture
//! └──────────┬──────────┘
//!            │
//!      ┌─────┴──────┐
//!      ▼            ▼
//!  ┌────────┐  ┌──────────┐
//!  │  V4L2  │  │   File   │
//!  └────────┘  └──────────┘
//! ```
//!
//! The live feed runs on the backend's own streaming thread and only writes
//! the latest-frame slot; the screen polls that slot for rendering.

pub mod enumeration;
pub mod file_source;
pub mod pipeline;
pub mod types;
pub mod v4l2;

pub use file_source::FileCamera;
pub use types::*;
pub use v4l2::V4l2Camera;

use crate::config::{CaptureBackendType, Config};
use crate::errors::{AppError, AppResult, CaptureError, CaptureResult};
use crate::pipelines::photo::PhotoPipeline;
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Live feed and still capture
///
/// Callers must check [`is_ready`](CaptureDevice::is_ready) before calling
/// [`capture`](CaptureDevice::capture); the capture screen keeps the
/// capture action inert until the device is ready.
pub trait CaptureDevice: Send + Sync {
    /// Mount the live feed (or re-mount it) with the given facing and torch
    fn configure(&self, settings: &CaptureSettings) -> CaptureResult<()>;

    /// Unmount the live feed and turn the torch off
    fn stop(&self);

    /// Whether the feed is mounted and has produced a frame
    fn is_ready(&self) -> bool;

    /// Most recent live frame, for rendering
    fn latest_frame(&self) -> Option<Arc<CameraFrame>>;

    /// Capture a still image at maximum quality
    fn capture(&self) -> BoxFuture<'_, CaptureResult<CapturedImageRef>>;

    /// Short description for logs and the status bar
    fn describe(&self) -> String;
}

/// Slot holding the most recent live frame
///
/// Written by the streaming thread, read by the UI and by capture.
#[derive(Clone, Default)]
pub struct FrameSlot(Arc<Mutex<Option<Arc<CameraFrame>>>>);

impl FrameSlot {
    pub fn store(&self, frame: CameraFrame) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(Arc::new(frame));
        }
    }

    pub fn latest(&self) -> Option<Arc<CameraFrame>> {
        self.0.lock().ok().and_then(|slot| slot.clone())
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = None;
        }
    }
}

/// Still capture shared by all backends: one capture at a time, encoded
/// from the latest live frame
pub(crate) struct StillCapture {
    photo: PhotoPipeline,
    in_flight: AtomicBool,
}

impl StillCapture {
    pub(crate) fn new(photo: PhotoPipeline) -> Self {
        Self {
            photo,
            in_flight: AtomicBool::new(false),
        }
    }

    pub(crate) async fn capture(&self, frame: Option<Arc<CameraFrame>>) -> CaptureResult<CapturedImageRef> {
        let Some(frame) = frame else {
            return Err(CaptureError::NoFrameAvailable);
        };

        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::Busy);
        }

        let result = self.photo.capture(frame).await;
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }
}

/// Build the capture device selected by the configuration
pub fn open_capture_device(config: &Config) -> AppResult<Arc<dyn CaptureDevice>> {
    config.validate().map_err(AppError::Config)?;

    let photo = PhotoPipeline::new(config.capture_cache_dir());

    match config.backend {
        CaptureBackendType::V4l2 => Ok(Arc::new(V4l2Camera::new(config, photo))),
        CaptureBackendType::File => {
            let source = config
                .file_source
                .clone()
                .ok_or_else(|| AppError::Config("No file source configured".to_string()))?;
            Ok(Arc::new(FileCamera::new(source, photo)))
        }
    }
}
