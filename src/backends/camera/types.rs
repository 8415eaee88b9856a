// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{oneshot, watch};

/// Camera backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CameraBackendType {
    /// Synthetic source (test pattern or still image), always available
    #[default]
    Virtual,
    /// Video4Linux2 devices (requires the `v4l2` feature)
    V4l2,
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::Virtual => write!(f, "Virtual"),
            CameraBackendType::V4l2 => write!(f, "V4L2"),
        }
    }
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub name: String,
    pub path: String,           // Device node or virtual source identifier
    pub driver: Option<String>, // Kernel driver name (V4L2 only)
}

/// Framerate as a fraction (numerator/denominator)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Framerate {
    pub num: u32,
    pub denom: u32,
}

impl Framerate {
    /// Create a new framerate from numerator and denominator
    pub fn new(num: u32, denom: u32) -> Self {
        Self {
            num,
            denom: if denom == 0 { 1 } else { denom },
        }
    }

    /// Create a framerate from an integer (e.g., 30 becomes 30/1)
    pub fn from_int(fps: u32) -> Self {
        Self { num: fps, denom: 1 }
    }

    /// Get the rounded-down integer framerate
    pub fn as_int(&self) -> u32 {
        self.num / self.denom
    }
}

impl std::fmt::Display for Framerate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.denom != 1 {
            write!(f, "{:.2}", self.num as f64 / self.denom as f64)
        } else {
            write!(f, "{}", self.num)
        }
    }
}

impl Default for Framerate {
    fn default() -> Self {
        Self { num: 30, denom: 1 }
    }
}

/// Camera format specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFormat {
    pub width: u32,
    pub height: u32,
    pub framerate: Option<Framerate>,
    pub pixel_format: String, // FourCC code (e.g., "MJPG", "YUYV", "RGBA")
}

impl std::fmt::Display for CameraFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(fps) = &self.framerate {
            write!(f, "{}x{} @ {}fps", self.width, self.height, fps)
        } else {
            write!(f, "{}x{}", self.width, self.height)
        }
    }
}

/// Pixel layout of frame data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 32-bit with alpha (4 bytes per pixel)
    RGBA,
    /// Packed 4:2:2 (Y0 U Y1 V), common raw webcam output
    YUYV,
}

/// A single frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    pub format: PixelFormat,
    /// Bytes per row, may include padding
    pub stride: u32,
    pub captured_at: Instant,
    /// Monotonic frame counter of the producing stream
    pub sequence: u64,
}

impl CameraFrame {
    /// Wrap tightly packed RGBA pixels
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>, sequence: u64) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            format: PixelFormat::RGBA,
            stride: width * 4,
            captured_at: Instant::now(),
            sequence,
        }
    }

    /// Sample one pixel as RGB, clamping coordinates into the frame
    pub fn pixel_rgb(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if self.width == 0 || self.height == 0 {
            return (0, 0, 0);
        }
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        let row = y * self.stride as usize;
        let data = &self.data;

        match self.format {
            PixelFormat::RGBA => {
                let idx = row + x * 4;
                match data.get(idx..idx + 3) {
                    Some(px) => (px[0], px[1], px[2]),
                    None => (0, 0, 0),
                }
            }
            PixelFormat::YUYV => {
                // Two pixels share chroma: Y0 U Y1 V
                let base = row + (x & !1) * 2;
                let Some(px) = data.get(base..base + 4) else {
                    return (0, 0, 0);
                };
                let luma = if x & 1 == 0 { px[0] } else { px[2] };
                yuv_to_rgb(luma, px[1], px[3])
            }
        }
    }

    /// Convert the frame to a packed RGB image
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        let len = (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(3)?;
        let mut rgb = Vec::with_capacity(len);
        for y in 0..self.height {
            for x in 0..self.width {
                let (r, g, b) = self.pixel_rgb(x, y);
                rgb.extend_from_slice(&[r, g, b]);
            }
        }
        RgbImage::from_raw(self.width, self.height, rgb)
    }
}

/// Convert YUV (BT.601) to RGB
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}

/// Latest-frame channel read by preview surfaces
pub type FrameReceiver = watch::Receiver<Option<Arc<CameraFrame>>>;

/// Latest-frame channel written by streaming threads
pub type FrameSender = watch::Sender<Option<Arc<CameraFrame>>>;

/// Completion of a photo request: encoded image bytes or the failure
pub type PhotoReceiver = oneshot::Receiver<BackendResult<Vec<u8>>>;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone)]
pub enum BackendError {
    /// Failed to open or set up the device
    InitializationFailed(String),
    /// Camera device not found
    DeviceNotFound(String),
    /// Format not supported
    FormatNotSupported(String),
    /// Operation requires a configured session
    NotConfigured,
    /// Photo output failed to produce an image
    CaptureFailed(String),
    /// General I/O error
    IoError(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            BackendError::NotConfigured => write!(f, "Session is not configured"),
            BackendError::CaptureFailed(msg) => write!(f, "Capture failed: {}", msg),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::IoError(err.to_string())
    }
}
