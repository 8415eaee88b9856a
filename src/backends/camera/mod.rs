// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! A backend is the capture session: a camera input, a photo output and a
//! preview frame stream.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  Capture Controller │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackendManager│  ← Thread-safe shared access
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  CameraBackend Trait│  ← Common interface
//! └──────────┬──────────┘
//!            │
//!      ┌─────┴─────┐
//!      ▼           ▼
//! ┌─────────┐ ┌────────┐
//! │ Virtual │ │  V4L2  │
//! └─────────┘ └────────┘
//! ```

pub mod frame_loop;
pub mod manager;
pub mod types;
#[cfg(feature = "v4l2")]
pub mod v4l2;

pub use manager::CameraBackendManager;
pub use types::*;

use crate::config::{Config, FormatSettings};
use crate::pipelines::photo::EncodingQuality;
use std::path::PathBuf;

/// Construction options shared by all backends
#[derive(Debug, Clone, Default)]
pub struct BackendOptions {
    /// JPEG quality of the photo output
    pub quality: EncodingQuality,
    /// Still image streamed by the virtual backend instead of the test pattern
    pub virtual_source: Option<PathBuf>,
}

impl From<&Config> for BackendOptions {
    fn from(config: &Config) -> Self {
        Self {
            quality: config.photo_quality,
            virtual_source: config.virtual_source.clone(),
        }
    }
}

/// Capture session backend
///
/// Blocking calls (`configure`, `start`, `stop`) are issued from the
/// blocking thread pool, never from the UI thread.
pub trait CameraBackend: Send {
    // ===== Enumeration =====

    /// Enumerate available cameras on this backend
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Get supported formats for a specific camera device
    fn get_formats(&self, device: &CameraDevice) -> Vec<CameraFormat>;

    // ===== Session =====

    /// Attach the camera input and the photo output
    fn configure(&mut self, device: &CameraDevice, format: &CameraFormat) -> BackendResult<()>;

    /// Check if input and output are attached
    fn is_configured(&self) -> bool;

    /// Start streaming frames. Starting a running session is a no-op.
    fn start(&mut self) -> BackendResult<()>;

    /// Stop streaming. The last frame stays in the preview channel.
    fn stop(&mut self) -> BackendResult<()>;

    /// Check if the session is streaming
    fn is_running(&self) -> bool;

    // ===== Photo output =====

    /// Request a photo of the newest frame
    ///
    /// Returns immediately; the encoded bytes (or the failure) arrive on
    /// the returned receiver.
    fn capture_photo(&mut self) -> PhotoReceiver;

    // ===== Preview =====

    /// Subscribe to the newest-frame channel
    ///
    /// Valid for the backend's whole lifetime, before and after configuration.
    fn preview_receiver(&self) -> FrameReceiver;

    // ===== Metadata =====

    /// Get the backend type identifier
    fn backend_type(&self) -> CameraBackendType;

    /// Check if this backend is available on the current system
    fn is_available(&self) -> bool;

    /// Get the configured camera device
    fn current_device(&self) -> Option<&CameraDevice>;

    /// Get the configured format
    fn current_format(&self) -> Option<&CameraFormat>;
}

/// Get a concrete backend instance for the given type
pub fn get_backend_for_type(
    backend_type: CameraBackendType,
    options: &BackendOptions,
) -> Box<dyn CameraBackend> {
    match backend_type {
        CameraBackendType::Virtual => Box::new(crate::backends::virtual_camera::VirtualBackend::new(
            options,
        )),
        #[cfg(feature = "v4l2")]
        CameraBackendType::V4l2 => Box::new(v4l2::V4l2Backend::new(options)),
        #[cfg(not(feature = "v4l2"))]
        CameraBackendType::V4l2 => {
            tracing::warn!("Built without the v4l2 feature, using the virtual camera");
            Box::new(crate::backends::virtual_camera::VirtualBackend::new(
                options,
            ))
        }
    }
}

/// Pick the format closest to the requested settings
///
/// Prefers the smallest pixel-count distance; formats in the requested
/// pixel format win ties. Returns `None` only for an empty list.
pub fn select_format(formats: &[CameraFormat], wanted: &FormatSettings) -> Option<CameraFormat> {
    let target_pixels = i64::from(wanted.width) * i64::from(wanted.height);

    formats
        .iter()
        .min_by_key(|f| {
            let pixels = i64::from(f.width) * i64::from(f.height);
            let diff = (pixels - target_pixels).abs();
            let format_penalty = match &wanted.pixel_format {
                Some(fourcc) if *fourcc != f.pixel_format => 1,
                _ => 0,
            };
            (diff, format_penalty)
        })
        .cloned()
        .map(|mut f| {
            if f.framerate.is_none() {
                f.framerate = wanted.framerate.map(Framerate::from_int);
            }
            f
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(width: u32, height: u32, fourcc: &str) -> CameraFormat {
        CameraFormat {
            width,
            height,
            framerate: None,
            pixel_format: fourcc.to_string(),
        }
    }

    #[test]
    fn test_select_format_closest_resolution() {
        let formats = [
            format(1920, 1080, "MJPG"),
            format(640, 480, "MJPG"),
            format(320, 240, "MJPG"),
        ];
        let wanted = FormatSettings {
            width: 700,
            height: 500,
            framerate: Some(30),
            pixel_format: None,
        };
        let chosen = select_format(&formats, &wanted).unwrap();
        assert_eq!((chosen.width, chosen.height), (640, 480));
        assert_eq!(chosen.framerate, Some(Framerate::from_int(30)));
    }

    #[test]
    fn test_select_format_prefers_pixel_format_on_tie() {
        let formats = [format(640, 480, "YUYV"), format(640, 480, "MJPG")];
        let wanted = FormatSettings {
            width: 640,
            height: 480,
            framerate: None,
            pixel_format: Some("MJPG".to_string()),
        };
        assert_eq!(
            select_format(&formats, &wanted).unwrap().pixel_format,
            "MJPG"
        );
    }

    #[test]
    fn test_select_format_empty() {
        assert!(select_format(&[], &FormatSettings::default()).is_none());
    }
}
