// SPDX-License-Identifier: GPL-3.0-only

//! Video4Linux2 camera backend
//!
//! Streams MJPG or YUYV frames from `/dev/video*` through memory-mapped
//! buffers. MJPG frames are decoded to RGBA on the streaming thread; YUYV
//! frames are passed through and converted on demand.

use super::frame_loop::{LoopAction, StreamLoop};
use super::types::*;
use super::{BackendOptions, CameraBackend};
use crate::constants::v4l2 as v4l2_consts;
use crate::pipelines::photo::{self, PhotoEncoder};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::capability::Flags;
use v4l::framesize::FrameSizeEnum;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

const SUPPORTED_FOURCCS: [&[u8; 4]; 2] = [b"MJPG", b"YUYV"];

/// V4L2 camera backend
pub struct V4l2Backend {
    encoder: PhotoEncoder,
    frames: Arc<FrameSender>,
    sequence: Arc<AtomicU64>,
    device: Option<CameraDevice>,
    format: Option<CameraFormat>,
    stream: Option<StreamLoop>,
}

/// State owned by the streaming thread
struct StreamState {
    _device: Device,
    stream: Stream<'static>,
    format: Format,
}

impl V4l2Backend {
    pub fn new(options: &BackendOptions) -> Self {
        let (frames, _) = watch::channel(None);
        Self {
            encoder: PhotoEncoder::new(options.quality),
            frames: Arc::new(frames),
            sequence: Arc::new(AtomicU64::new(0)),
            device: None,
            format: None,
            stream: None,
        }
    }

    fn is_supported(fourcc: FourCC) -> bool {
        SUPPORTED_FOURCCS.iter().any(|f| fourcc == FourCC::new(f))
    }

    fn open_and_set_format(path: &str, format: &CameraFormat) -> Result<(Device, Format), String> {
        let device =
            Device::with_path(path).map_err(|e| format!("Failed to open {}: {}", path, e))?;

        let fourcc_bytes: [u8; 4] = format
            .pixel_format
            .as_bytes()
            .try_into()
            .map_err(|_| format!("Invalid FourCC: {}", format.pixel_format))?;
        let requested = Format::new(format.width, format.height, FourCC::new(&fourcc_bytes));
        let actual = device
            .set_format(&requested)
            .map_err(|e| format!("Failed to set format: {}", e))?;

        if !Self::is_supported(actual.fourcc) {
            return Err(format!("Driver chose unsupported format {}", actual.fourcc));
        }

        Ok((device, actual))
    }

    fn decode(buf: &[u8], format: &Format, sequence: u64) -> Option<CameraFrame> {
        if format.fourcc == FourCC::new(b"MJPG") {
            let img = image::load_from_memory_with_format(buf, image::ImageFormat::Jpeg).ok()?;
            let rgba = img.to_rgba8();
            let (width, height) = rgba.dimensions();
            Some(CameraFrame::from_rgba(width, height, rgba.into_raw(), sequence))
        } else {
            Some(CameraFrame {
                width: format.width,
                height: format.height,
                data: Arc::from(buf),
                format: PixelFormat::YUYV,
                stride: format.stride,
                captured_at: Instant::now(),
                sequence,
            })
        }
    }
}

impl CameraBackend for V4l2Backend {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        let mut paths: Vec<String> = std::fs::read_dir("/dev")
            .into_iter()
            .flatten()
            .flatten()
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .map(|n| n.starts_with(v4l2_consts::DEVICE_PREFIX))
                    .unwrap_or(false)
            })
            .map(|e| e.path().to_string_lossy().into_owned())
            .collect();
        paths.sort();

        paths
            .into_iter()
            .filter_map(|path| {
                let dev = Device::with_path(&path).ok()?;
                let caps = dev.query_caps().ok()?;
                if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
                    return None;
                }
                let formats = dev.enum_formats().ok()?;
                if !formats.iter().any(|f| Self::is_supported(f.fourcc)) {
                    debug!(path = %path, "Skipping device without MJPG/YUYV");
                    return None;
                }
                Some(CameraDevice {
                    name: caps.card,
                    path,
                    driver: Some(caps.driver),
                })
            })
            .collect()
    }

    fn get_formats(&self, device: &CameraDevice) -> Vec<CameraFormat> {
        let Ok(dev) = Device::with_path(&device.path) else {
            return Vec::new();
        };

        let mut formats = Vec::new();
        for desc in dev.enum_formats().into_iter().flatten() {
            if !Self::is_supported(desc.fourcc) {
                continue;
            }
            let pixel_format = desc.fourcc.str().unwrap_or("MJPG").to_string();
            for size in dev.enum_framesizes(desc.fourcc).into_iter().flatten() {
                if let FrameSizeEnum::Discrete(discrete) = size.size {
                    formats.push(CameraFormat {
                        width: discrete.width,
                        height: discrete.height,
                        framerate: None,
                        pixel_format: pixel_format.clone(),
                    });
                }
            }
        }
        formats
    }

    fn configure(&mut self, device: &CameraDevice, format: &CameraFormat) -> BackendResult<()> {
        let (_, actual) = Self::open_and_set_format(&device.path, format)
            .map_err(BackendError::InitializationFailed)?;

        let configured = CameraFormat {
            width: actual.width,
            height: actual.height,
            framerate: format.framerate,
            pixel_format: actual.fourcc.str().unwrap_or("MJPG").to_string(),
        };
        info!(device = %device.name, format = %configured, "V4L2 device configured");

        self.device = Some(device.clone());
        self.format = Some(configured);
        Ok(())
    }

    fn is_configured(&self) -> bool {
        self.device.is_some()
    }

    fn start(&mut self) -> BackendResult<()> {
        let (Some(device), Some(format)) = (self.device.clone(), self.format.clone()) else {
            return Err(BackendError::NotConfigured);
        };
        if self.stream.is_some() {
            return Ok(());
        }

        // Open once here so start failures surface to the caller
        Self::open_and_set_format(&device.path, &format)
            .map_err(BackendError::InitializationFailed)?;

        let frames = Arc::clone(&self.frames);
        let sequence = Arc::clone(&self.sequence);
        let path = device.path.clone();

        self.stream = Some(StreamLoop::spawn_with_init(
            "v4l2-capture",
            move || {
                let (dev, actual) = Self::open_and_set_format(&path, &format)?;
                let stream = Stream::with_buffers(
                    &dev,
                    Type::VideoCapture,
                    v4l2_consts::BUFFER_COUNT,
                )
                .map_err(|e| format!("Failed to create stream: {}", e))?;
                Ok(StreamState {
                    _device: dev,
                    stream,
                    format: actual,
                })
            },
            move |state: &mut StreamState| {
                let (buf, meta) = match state.stream.next() {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!(error = %e, "Failed to dequeue frame");
                        return LoopAction::Stop;
                    }
                };
                let used = (meta.bytesused as usize).min(buf.len());
                let seq = sequence.fetch_add(1, Ordering::SeqCst);
                match Self::decode(&buf[..used], &state.format, seq) {
                    Some(frame) => {
                        frames.send_replace(Some(Arc::new(frame)));
                    }
                    None => debug!(sequence = seq, "Dropped undecodable frame"),
                }
                LoopAction::Continue
            },
        ));

        info!(device = %device.name, "V4L2 streaming");
        Ok(())
    }

    fn stop(&mut self) -> BackendResult<()> {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            info!("V4L2 streaming stopped");
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
        CameraBackendType::V4l2
    }

    fn is_available(&self) -> bool {
        !self.enumerate_cameras().is_empty()
    }

    fn current_device(&self) -> Option<&CameraDevice> {
        self.device.as_ref()
    }

    fn current_format(&self) -> Option<&CameraFormat> {
        self.format.as_ref()
    }
}
