// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera backend
//!
//! A camera that needs no hardware: it streams either a scrolling test
//! pattern or a still image file. Used as the default backend and by the
//! test suite, since its frames are deterministic.

pub mod file_source;
pub mod pattern;

use crate::backends::camera::frame_loop::{LoopAction, StreamLoop};
use crate::backends::camera::types::*;
use crate::backends::camera::{BackendOptions, CameraBackend};
use crate::constants::{frame_interval, virtual_camera as vc};
use crate::pipelines::photo::{self, PhotoEncoder};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{oneshot, watch};
use tracing::{debug, info};

/// Synthetic camera backend
pub struct VirtualBackend {
    source: Option<PathBuf>,
    encoder: PhotoEncoder,
    frames: Arc<FrameSender>,
    sequence: Arc<AtomicU64>,
    device: Option<CameraDevice>,
    format: Option<CameraFormat>,
    still: Option<Arc<CameraFrame>>,
    stream: Option<StreamLoop>,
}

impl VirtualBackend {
    pub fn new(options: &BackendOptions) -> Self {
        let (frames, _) = watch::channel(None);
        Self {
            source: options.virtual_source.clone(),
            encoder: PhotoEncoder::new(options.quality),
            frames: Arc::new(frames),
            sequence: Arc::new(AtomicU64::new(0)),
            device: None,
            format: None,
            still: None,
            stream: None,
        }
    }

    fn device(&self) -> CameraDevice {
        match &self.source {
            Some(path) => CameraDevice {
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| vc::DEVICE_NAME.to_string()),
                path: path.to_string_lossy().into_owned(),
                driver: None,
            },
            None => CameraDevice {
                name: vc::DEVICE_NAME.to_string(),
                path: vc::DEVICE_PATH.to_string(),
                driver: None,
            },
        }
    }

    /// Produce the next frame of the configured source
    fn next_frame(
        still: Option<&Arc<CameraFrame>>,
        width: u32,
        height: u32,
        sequence: u64,
    ) -> CameraFrame {
        match still {
            Some(frame) => CameraFrame {
                sequence,
                captured_at: std::time::Instant::now(),
                ..CameraFrame::clone(frame)
            },
            None => pattern::render(width, height, sequence),
        }
    }
}

impl CameraBackend for VirtualBackend {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        vec![self.device()]
    }

    fn get_formats(&self, device: &CameraDevice) -> Vec<CameraFormat> {
        let framerate = Some(Framerate::from_int(vc::DEFAULT_FPS));

        if let Some(path) = &self.source {
            return match file_source::image_dimensions(path) {
                Ok((width, height)) => vec![CameraFormat {
                    width,
                    height,
                    framerate,
                    pixel_format: "RGBA".to_string(),
                }],
                Err(e) => {
                    debug!(device = %device.name, error = %e, "No formats for still source");
                    Vec::new()
                }
            };
        }

        [(1280, 720), (vc::DEFAULT_WIDTH, vc::DEFAULT_HEIGHT), (320, 240)]
            .into_iter()
            .map(|(width, height)| CameraFormat {
                width,
                height,
                framerate,
                pixel_format: "RGBA".to_string(),
            })
            .collect()
    }

    fn configure(&mut self, device: &CameraDevice, format: &CameraFormat) -> BackendResult<()> {
        if device.path != self.device().path {
            return Err(BackendError::DeviceNotFound(device.path.clone()));
        }
        if format.width == 0 || format.height == 0 {
            return Err(BackendError::FormatNotSupported(format.to_string()));
        }

        self.still = match &self.source {
            Some(path) => Some(Arc::new(file_source::load_image_as_frame(path)?)),
            None => None,
        };
        self.device = Some(device.clone());
        self.format = Some(format.clone());

        info!(device = %device.name, format = %format, "Virtual camera configured");
        Ok(())
    }

    fn is_configured(&self) -> bool {
        self.device.is_some()
    }

    fn start(&mut self) -> BackendResult<()> {
        let format = self.format.clone().ok_or(BackendError::NotConfigured)?;
        if self.stream.is_some() {
            return Ok(());
        }

        let (width, height) = (format.width, format.height);
        let interval = frame_interval(format.framerate.unwrap_or_default().as_int());

        // Publish a frame before returning so a capture right after start has input
        let first = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.frames.send_replace(Some(Arc::new(Self::next_frame(
            self.still.as_ref(),
            width,
            height,
            first,
        ))));

        let frames = Arc::clone(&self.frames);
        let sequence = Arc::clone(&self.sequence);
        let still = self.still.clone();
        self.stream = Some(StreamLoop::spawn("virtual-camera", move || {
            std::thread::sleep(interval);
            let seq = sequence.fetch_add(1, Ordering::SeqCst);
            let frame = Self::next_frame(still.as_ref(), width, height, seq);
            frames.send_replace(Some(Arc::new(frame)));
            LoopAction::Continue
        }));

        info!(format = %format, "Virtual camera streaming");
        Ok(())
    }

    fn stop(&mut self) -> BackendResult<()> {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            info!("Virtual camera stopped");
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.stream.is_some()
    }

    fn capture_photo(&mut self) -> PhotoReceiver {
        if !self.is_configured() {
            let (sender, receiver) = oneshot::channel();
            let _ = sender.send(Err(BackendError::NotConfigured));
            return receiver;
        }
        let latest = self.frames.borrow().clone();
        photo::request_photo(latest, self.encoder)
    }

    fn preview_receiver(&self) -> FrameReceiver {
        self.frames.subscribe()
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Virtual
    }

    fn is_available(&self) -> bool {
        self.source.as_ref().map(|p| p.is_file()).unwrap_or(true)
    }

    fn current_device(&self) -> Option<&CameraDevice> {
        self.device.as_ref()
    }

    fn current_format(&self) -> Option<&CameraFormat> {
        self.format.as_ref()
    }
}
