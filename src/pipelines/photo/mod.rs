// SPDX-License-Identifier: MPL-2.0

//! Async photo capture pipeline
//!
//! ```text
//! Live feed → latest frame → JPEG encoding → transient file → CapturedImageRef
//!                                                 ↓
//!                               retake (deleted) or save (photo library)
//! ```
//!
//! Encoding and disk I/O run in blocking tasks so the screen keeps
//! rendering while a capture is in flight.

pub mod encoding;

pub use encoding::{JPEG_QUALITY, PhotoEncoder};

use crate::backends::camera::types::{CameraFrame, CapturedImageRef};
use crate::constants::CAPTURE_FILE_PREFIX;
use crate::errors::{CaptureError, CaptureResult};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Turns a live frame into a transient capture file
#[derive(Debug, Clone)]
pub struct PhotoPipeline {
    encoder: PhotoEncoder,
    cache_dir: PathBuf,
}

impl PhotoPipeline {
    /// Pipeline writing maximum-quality JPEGs into `cache_dir`
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            encoder: PhotoEncoder,
            cache_dir,
        }
    }

    pub fn cache_dir(&self) -> &PathBuf {
        &self.cache_dir
    }

    /// Encode `frame` and store it as a transient capture file
    pub async fn capture(&self, frame: Arc<CameraFrame>) -> CaptureResult<CapturedImageRef> {
        info!(
            width = frame.width,
            height = frame.height,
            "Encoding captured frame"
        );

        let encoder = self.encoder;
        let cache_dir = self.cache_dir.clone();

        tokio::task::spawn_blocking(move || -> CaptureResult<CapturedImageRef> {
            let data = encoder.encode_jpeg(&frame)?;

            std::fs::create_dir_all(&cache_dir)?;
            let filename = format!("{}_{}.jpg", CAPTURE_FILE_PREFIX, uuid::Uuid::new_v4().simple());
            let path = cache_dir.join(filename);
            std::fs::write(&path, &data)?;

            info!(path = %path.display(), bytes = data.len(), "Capture written to cache");
            Ok(CapturedImageRef::new(path, frame))
        })
        .await
        .map_err(|e| CaptureError::Backend(format!("Capture task error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_capture_writes_transient_file() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = PhotoPipeline::new(dir.path().join("captures"));
        let frame = Arc::new(CameraFrame::from_rgba(4, 4, vec![10; 64]).unwrap());

        let image = pipeline.capture(frame).await.unwrap();
        let path = image.path().to_path_buf();
        assert!(path.exists());
        assert!(path.starts_with(dir.path()));
        assert_eq!(path.extension().unwrap(), "jpg");

        drop(image);
        assert!(!path.exists());
    }
}
