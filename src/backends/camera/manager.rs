// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend lifecycle manager
//!
//! The manager provides:
//! - Thread-safe backend access (the session is shared by the controller
//!   and the preview surface)
//! - Lock-poisoning recovery, so a panicked streaming call does not wedge
//!   the whole session

use super::types::*;
use super::{BackendOptions, CameraBackend, get_backend_for_type};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// Camera backend manager
///
/// Cheap to clone; all clones share one backend.
#[derive(Clone)]
pub struct CameraBackendManager {
    backend: Arc<Mutex<Box<dyn CameraBackend>>>,
}

impl CameraBackendManager {
    /// Create a manager owning a new backend of the given type
    pub fn new(backend_type: CameraBackendType, options: &BackendOptions) -> Self {
        info!(backend = %backend_type, "Creating camera backend manager");
        Self::with_backend(get_backend_for_type(backend_type, options))
    }

    /// Create a manager around an existing backend instance
    pub fn with_backend(backend: Box<dyn CameraBackend>) -> Self {
        Self {
            backend: Arc::new(Mutex::new(backend)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn CameraBackend>> {
        self.backend
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Get the backend type
    pub fn backend_type(&self) -> CameraBackendType {
        self.lock().backend_type()
    }

    /// Check if the backend is available on this system
    pub fn is_available(&self) -> bool {
        self.lock().is_available()
    }

    /// Enumerate available cameras
    pub fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>> {
        let cameras = self.lock().enumerate_cameras();
        if cameras.is_empty() {
            Err(BackendError::DeviceNotFound("No cameras found".to_string()))
        } else {
            Ok(cameras)
        }
    }

    /// Get supported formats for a camera
    pub fn get_formats(&self, device: &CameraDevice) -> Vec<CameraFormat> {
        self.lock().get_formats(device)
    }

    /// Attach input and output
    pub fn configure(&self, device: &CameraDevice, format: &CameraFormat) -> BackendResult<()> {
        info!(device = %device.name, format = %format, "Configuring session");
        self.lock().configure(device, format)
    }

    /// Check if configured
    pub fn is_configured(&self) -> bool {
        self.lock().is_configured()
    }

    /// Start streaming
    pub fn start(&self) -> BackendResult<()> {
        self.lock().start()
    }

    /// Stop streaming
    pub fn stop(&self) -> BackendResult<()> {
        self.lock().stop()
    }

    /// Check if streaming
    pub fn is_running(&self) -> bool {
        self.lock().is_running()
    }

    /// Request a photo from the output
    pub fn capture_photo(&self) -> PhotoReceiver {
        self.lock().capture_photo()
    }

    /// Subscribe to preview frames
    pub fn preview_receiver(&self) -> FrameReceiver {
        self.lock().preview_receiver()
    }

    /// Get current device
    pub fn current_device(&self) -> Option<CameraDevice> {
        self.lock().current_device().cloned()
    }

    /// Get current format
    pub fn current_format(&self) -> Option<CameraFormat> {
        self.lock().current_format().cloned()
    }
}
