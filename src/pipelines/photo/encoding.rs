// SPDX-License-Identifier: GPL-3.0-only

//! Still image encoding
//!
//! Captured frames are stored as JPEG at maximum quality.

use crate::backends::camera::types::CameraFrame;
use crate::errors::{CaptureError, CaptureResult};
use tracing::debug;

/// JPEG quality for captured photos (0-100)
pub const JPEG_QUALITY: u8 = 100;

/// JPEG encoder for captured frames
#[derive(Debug, Clone, Copy, Default)]
pub struct PhotoEncoder;

impl PhotoEncoder {
    /// Encode an RGBA frame as JPEG (CPU-bound, call from a blocking task)
    pub fn encode_jpeg(&self, frame: &CameraFrame) -> CaptureResult<Vec<u8>> {
        let rgb = frame.to_rgb_image().ok_or_else(|| {
            CaptureError::Encoding(format!(
                "frame buffer does not match {}x{}",
                frame.width, frame.height
            ))
        })?;

        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
            &mut cursor,
            JPEG_QUALITY,
        );

        encoder
            .encode(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| CaptureError::Encoding(format!("JPEG encoding failed: {}", e)))?;

        debug!(
            size = buffer.len(),
            quality = JPEG_QUALITY,
            "JPEG encoding complete"
        );
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photos_use_maximum_quality() {
        assert_eq!(JPEG_QUALITY, 100);
    }

    #[test]
    fn test_encode_produces_jpeg() {
        let frame = CameraFrame::from_rgba(8, 8, vec![200; 8 * 8 * 4]).unwrap();
        let data = PhotoEncoder.encode_jpeg(&frame).unwrap();
        // SOI marker
        assert_eq!(&data[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
    }
}
