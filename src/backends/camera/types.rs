// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for capture devices

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Which physical camera is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Facing {
    /// Camera facing the user
    Front,
    /// Camera facing away from the user
    #[default]
    Back,
}

impl Facing {
    /// The other camera
    pub fn flipped(self) -> Self {
        match self {
            Facing::Front => Facing::Back,
            Facing::Back => Facing::Front,
        }
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Facing::Front => write!(f, "front"),
            Facing::Back => write!(f, "back"),
        }
    }
}

/// Live feed configuration, owned by the capture screen
///
/// Not persisted: every launch starts with the back camera and torch off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureSettings {
    pub facing: Facing,
    /// Continuous illumination while the feed is live
    pub torch_enabled: bool,
}

/// A camera discovered on the system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    /// Human-readable name (V4L2 card)
    pub name: String,
    /// Device node, e.g. `/dev/video0`
    pub path: String,
    /// Which way the camera faces
    pub facing: Facing,
}

/// A single RGBA frame from the live feed
#[derive(Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Bytes per row (tightly packed: `width * 4`)
    pub stride: u32,
    /// RGBA pixels
    pub data: Arc<[u8]>,
    /// When the frame was captured (for latency diagnostics)
    pub captured_at: Instant,
}

impl fmt::Debug for CameraFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl CameraFrame {
    /// Wrap tightly packed RGBA pixels
    ///
    /// Returns `None` when the buffer does not match the dimensions.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 || data.len() != (width * height * 4) as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            stride: width * 4,
            data: Arc::from(data.into_boxed_slice()),
            captured_at: Instant::now(),
        })
    }

    /// RGB value at (x, y), clamped to the frame bounds
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let x = x.min(self.width.saturating_sub(1));
        let y = y.min(self.height.saturating_sub(1));
        let idx = (y * self.stride + x * 4) as usize;
        match self.data.get(idx..idx + 3) {
            Some(px) => (px[0], px[1], px[2]),
            None => (0, 0, 0),
        }
    }

    /// Horizontally mirrored copy (selfie view)
    pub fn mirrored(&self) -> Self {
        let row_bytes = (self.width * 4) as usize;
        let mut out = Vec::with_capacity(row_bytes * self.height as usize);
        for y in 0..self.height as usize {
            let start = y * self.stride as usize;
            let row = &self.data[start..start + row_bytes];
            for px in row.chunks_exact(4).rev() {
                out.extend_from_slice(px);
            }
        }
        Self {
            width: self.width,
            height: self.height,
            stride: self.width * 4,
            data: Arc::from(out.into_boxed_slice()),
            captured_at: self.captured_at,
        }
    }

    /// Drop the alpha channel for encoding
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        let row_bytes = (self.width * 4) as usize;
        let mut rgb = Vec::with_capacity((self.width * self.height * 3) as usize);
        for y in 0..self.height as usize {
            let start = y * self.stride as usize;
            let row = self.data.get(start..start + row_bytes)?;
            for px in row.chunks_exact(4) {
                rgb.extend_from_slice(&px[..3]);
            }
        }
        image::RgbImage::from_raw(self.width, self.height, rgb)
    }
}

/// Handle to a captured still image awaiting retake or save
///
/// The handle owns a transient file in the capture cache. It cannot be
/// cloned: it is either dropped (retake), which deletes the file, or moved
/// into the photo library, which copies it into durable storage first.
pub struct CapturedImageRef {
    path: PathBuf,
    preview: Arc<CameraFrame>,
}

impl CapturedImageRef {
    /// Take ownership of a transient image file and its decoded pixels
    pub fn new(path: PathBuf, preview: Arc<CameraFrame>) -> Self {
        debug!(path = %path.display(), "Captured image handle created");
        Self { path, preview }
    }

    /// Location of the transient image file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decoded pixels for the preview screen
    pub fn preview(&self) -> &Arc<CameraFrame> {
        &self.preview
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.preview.width, self.preview.height)
    }
}

impl fmt::Debug for CapturedImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedImageRef")
            .field("path", &self.path)
            .field("width", &self.preview.width)
            .field("height", &self.preview.height)
            .finish()
    }
}

impl Drop for CapturedImageRef {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Discarded captured image"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to remove captured image")
            }
        }
    }
}
