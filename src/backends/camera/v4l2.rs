// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 capture device
//!
//! Streams the selected camera through [`LivePipeline`] and drives the
//! torch through sysfs flash LEDs. Switching facing tears the pipeline down
//! and opens the other camera; toggling the torch leaves the feed running.

use super::enumeration::{self, FacingOverrides};
use super::pipeline::LivePipeline;
use super::types::{CameraDevice, CameraFrame, CaptureSettings, CapturedImageRef, Facing};
use super::{CaptureDevice, FrameSlot, StillCapture};
use crate::config::Config;
use crate::errors::{CaptureError, CaptureResult};
use crate::flash::TorchHardware;
use crate::pipelines::photo::PhotoPipeline;
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{info, warn};

pub struct V4l2Camera {
    overrides: FacingOverrides,
    cameras: Mutex<Vec<CameraDevice>>,
    torch: OnceLock<TorchHardware>,
    torch_intensity: f32,
    frames: FrameSlot,
    live: Mutex<Option<LivePipeline>>,
    still: StillCapture,
}

impl V4l2Camera {
    pub fn new(config: &Config, photo: PhotoPipeline) -> Self {
        Self {
            overrides: FacingOverrides {
                front: config.front_device.clone(),
                back: config.back_device.clone(),
            },
            cameras: Mutex::new(Vec::new()),
            torch: OnceLock::new(),
            torch_intensity: config.torch_intensity,
            frames: FrameSlot::default(),
            live: Mutex::new(None),
            still: StillCapture::new(photo),
        }
    }

    /// Camera for `facing`, scanning devices when none is known yet
    fn find_camera(&self, facing: Facing) -> CaptureResult<CameraDevice> {
        let mut cameras = self
            .cameras
            .lock()
            .map_err(|_| CaptureError::Backend("camera list lock poisoned".to_string()))?;
        enumeration::select_or_rescan(&mut cameras, facing, || {
            enumeration::enumerate_cameras(&self.overrides)
        })
        .ok_or_else(|| CaptureError::DeviceNotFound("no V4L2 camera found".to_string()))
    }

    fn torch(&self) -> &TorchHardware {
        self.torch.get_or_init(TorchHardware::detect)
    }

    fn apply_torch(&self, enabled: bool) {
        let torch = self.torch();
        if torch.has_devices() {
            torch.set(enabled, self.torch_intensity);
        } else if enabled {
            match &torch.permission_error {
                Some(msg) => warn!("{}", msg),
                None => warn!("Torch requested but no flash LED was found"),
            }
        }
    }
}

impl CaptureDevice for V4l2Camera {
    fn configure(&self, settings: &CaptureSettings) -> CaptureResult<()> {
        let camera = self.find_camera(settings.facing)?;

        let mut live = self
            .live
            .lock()
            .map_err(|_| CaptureError::Backend("pipeline lock poisoned".to_string()))?;

        let already_streaming = live
            .as_ref()
            .is_some_and(|p| p.device_path() == camera.path);

        if !already_streaming {
            // Release the old camera before opening the new one
            *live = None;
            self.frames.clear();
            info!(name = %camera.name, facing = %settings.facing, "Switching camera");
            *live = Some(LivePipeline::start(&camera.path, self.frames.clone())?);
        }
        drop(live);

        self.apply_torch(settings.torch_enabled);
        Ok(())
    }

    fn stop(&self) {
        if let Ok(mut live) = self.live.lock()
            && live.take().is_some()
        {
            info!("Live feed stopped");
        }
        self.frames.clear();
        if self.torch().has_devices() {
            self.torch().set(false, 0.0);
        }
    }

    fn is_ready(&self) -> bool {
        let mounted = self.live.lock().map(|l| l.is_some()).unwrap_or(false);
        mounted && self.frames.latest().is_some()
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
        let live = self.live.lock().ok();
        match live.as_ref().and_then(|l| l.as_ref()) {
            Some(pipeline) => {
                let name = self
                    .cameras
                    .lock()
                    .ok()
                    .and_then(|cameras| {
                        cameras
                            .iter()
                            .find(|c| c.path == pipeline.device_path())
                            .map(|c| c.name.clone())
                    })
                    .unwrap_or_else(|| "camera".to_string());
                format!("{} ({})", name, pipeline.device_path())
            }
            None => "V4L2 (idle)".to_string(),
        }
    }
}
