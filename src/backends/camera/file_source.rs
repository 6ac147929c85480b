// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera backed by a still image file
//!
//! Serves the decoded image as the live feed for either facing. Used for
//! headless runs, demos and machines without a camera.

use super::types::{CameraFrame, CaptureSettings, CapturedImageRef};
use super::{CaptureDevice, FrameSlot, StillCapture};
use crate::constants::file_formats;
use crate::errors::{CaptureError, CaptureResult};
use crate::pipelines::photo::PhotoPipeline;
use futures::future::BoxFuture;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::info;

pub struct FileCamera {
    source: PathBuf,
    decoded: OnceLock<Arc<CameraFrame>>,
    frames: FrameSlot,
    mounted: AtomicBool,
    still: StillCapture,
}

impl FileCamera {
    pub fn new(source: PathBuf, photo: PhotoPipeline) -> Self {
        Self {
            source,
            decoded: OnceLock::new(),
            frames: FrameSlot::default(),
            mounted: AtomicBool::new(false),
            still: StillCapture::new(photo),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    fn frame(&self) -> CaptureResult<Arc<CameraFrame>> {
        if let Some(frame) = self.decoded.get() {
            return Ok(Arc::clone(frame));
        }
        let frame = Arc::new(load_image_as_frame(&self.source)?);
        Ok(Arc::clone(self.decoded.get_or_init(|| frame)))
    }
}

/// Decode an image file into an RGBA frame
pub fn load_image_as_frame(path: &Path) -> CaptureResult<CameraFrame> {
    let supported = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(file_formats::is_image_extension);
    if !supported {
        return Err(CaptureError::DeviceNotFound(format!(
            "'{}' is not a supported image",
            path.display()
        )));
    }

    info!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| {
        CaptureError::Backend(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    info!(width, height, "Image loaded successfully");

    CameraFrame::from_rgba(width, height, rgba.into_raw())
        .ok_or_else(|| CaptureError::Backend(format!("'{}' has no pixels", path.display())))
}

impl CaptureDevice for FileCamera {
    fn configure(&self, settings: &CaptureSettings) -> CaptureResult<()> {
        let frame = self.frame()?;
        self.frames.store(CameraFrame::clone(&frame));
        self.mounted.store(true, Ordering::SeqCst);
        if settings.torch_enabled {
            info!("File source has no torch, ignoring");
        }
        Ok(())
    }

    fn stop(&self) {
        self.mounted.store(false, Ordering::SeqCst);
        self.frames.clear();
    }

    fn is_ready(&self) -> bool {
        self.mounted.load(Ordering::SeqCst) && self.frames.latest().is_some()
    }

    fn latest_frame(&self) -> Option<Arc<CameraFrame>> {
        self.frames.latest()
    }

    fn capture(&self) -> BoxFuture<'_, CaptureResult<CapturedImageRef>> {
        Box::pin(async move {
            if !self.is_ready() {
                return Err(CaptureError::NotReady);
            }
            self.still.capture(self.frames.latest()).await
        })
    }

    fn describe(&self) -> String {
        format!("file {}", self.source.display())
    }
}
