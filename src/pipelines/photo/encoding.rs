// SPDX-License-Identifier: GPL-3.0-only

//! Photo encoding
//!
//! Turns a camera frame into JPEG bytes for the photo library. Encoding is
//! CPU-bound and runs on the photo output's worker thread.

use crate::backends::camera::types::CameraFrame;
use crate::errors::PhotoError;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Encoding quality settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EncodingQuality {
    /// Low quality (high compression)
    Low,
    /// Medium quality (balanced)
    Medium,
    /// High quality (low compression)
    #[default]
    High,
    /// Maximum quality (minimal compression)
    Maximum,
}

impl EncodingQuality {
    /// Get JPEG quality value (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            EncodingQuality::Low => 60,
            EncodingQuality::Medium => 80,
            EncodingQuality::High => 92,
            EncodingQuality::Maximum => 98,
        }
    }
}

/// JPEG photo encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct PhotoEncoder {
    quality: EncodingQuality,
}

impl PhotoEncoder {
    pub fn new(quality: EncodingQuality) -> Self {
        Self { quality }
    }

    /// Encode a frame of any supported pixel format as JPEG
    pub fn encode_frame(&self, frame: &CameraFrame) -> Result<Vec<u8>, PhotoError> {
        if frame.width == 0 || frame.height == 0 || frame.data.is_empty() {
            return Err(PhotoError::NoFrameAvailable);
        }

        let image = frame.to_rgb_image().ok_or_else(|| {
            PhotoError::EncodingFailed(format!(
                "frame buffer does not match {}x{}",
                frame.width, frame.height
            ))
        })?;

        let encoded = Self::encode_jpeg(image, self.quality)?;
        debug!(
            width = frame.width,
            height = frame.height,
            bytes = encoded.len(),
            "Encoded photo"
        );
        Ok(encoded)
    }

    fn encode_jpeg(image: RgbImage, quality: EncodingQuality) -> Result<Vec<u8>, PhotoError> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);

        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality.jpeg_quality());

        encoder
            .encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| PhotoError::EncodingFailed(format!("JPEG encoding failed: {}", e)))?;

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jpeg_quality_values() {
        assert_eq!(EncodingQuality::Low.jpeg_quality(), 60);
        assert_eq!(EncodingQuality::Medium.jpeg_quality(), 80);
        assert_eq!(EncodingQuality::High.jpeg_quality(), 92);
        assert_eq!(EncodingQuality::Maximum.jpeg_quality(), 98);
    }

    #[test]
    fn test_encode_frame_produces_jpeg() {
        let frame = CameraFrame::from_rgba(4, 4, vec![200; 4 * 4 * 4], 0);
        let bytes = PhotoEncoder::default().encode_frame(&frame).unwrap();
        // JPEG SOI marker
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_encode_empty_frame_fails() {
        let frame = CameraFrame::from_rgba(0, 0, Vec::new(), 0);
        assert!(matches!(
            PhotoEncoder::default().encode_frame(&frame),
            Err(PhotoError::NoFrameAvailable)
        ));
    }
}
