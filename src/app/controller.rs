// SPDX-License-Identifier: GPL-3.0-only

//! Capture controller
//!
//! The state machine behind the single camera screen:
//!
//! ```text
//! Idle → Authorizing → Configured → Running → Taken → Saved
//!             │                        ▲        │
//!             ▼                        └─retake─┘
//!           Denied
//! ```
//!
//! Every operation returns [`Transition::Ignored`] when it is not valid in
//! the current state, and leaves the state untouched in that case. Blocking
//! session calls run on the blocking pool.

use super::Message;
use super::state::CaptureState;
use crate::backends::camera::{
    BackendError, BackendOptions, BackendResult, CameraBackendManager, CameraDevice,
    select_format,
};
use crate::backends::permission::{self, AuthorizationStatus, CameraPermission};
use crate::config::{Config, FormatSettings};
use crate::errors::{CaptureError, CaptureErrorKind, CaptureResult};
use crate::storage::{DirectoryLibrary, PhotoLibrary};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Outcome of a valid-or-not operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The operation ran and the state changed
    Applied,
    /// The operation is not valid in the current state; nothing happened
    Ignored,
}

/// Which camera and format `configure` attaches
#[derive(Debug, Clone, Default)]
pub struct DeviceSelection {
    /// Device path; first enumerated device when unset
    pub device_path: Option<String>,
    pub format: FormatSettings,
}

impl From<&Config> for DeviceSelection {
    fn from(config: &Config) -> Self {
        Self {
            device_path: config.device_path.clone(),
            format: config.capture_format.clone(),
        }
    }
}

/// Owns the capture session and the UI-facing state
pub struct CaptureController {
    manager: CameraBackendManager,
    permission: Arc<dyn CameraPermission>,
    library: Arc<dyn PhotoLibrary>,
    selection: DeviceSelection,
    state: CaptureState,
    publisher: watch::Sender<CaptureState>,
}

impl CaptureController {
    pub fn new(
        manager: CameraBackendManager,
        permission: Arc<dyn CameraPermission>,
        library: Arc<dyn PhotoLibrary>,
        selection: DeviceSelection,
    ) -> Self {
        let state = CaptureState::default();
        let (publisher, _) = watch::channel(state.clone());
        Self {
            manager,
            permission,
            library,
            selection,
            state,
            publisher,
        }
    }

    /// Wire up backend, permission provider and photo library from `config`
    pub fn from_config(config: &Config) -> Self {
        let manager = CameraBackendManager::new(config.backend, &BackendOptions::from(config));
        Self::new(
            manager,
            permission::for_config(config),
            Arc::new(DirectoryLibrary::new(config.photo_dir())),
            DeviceSelection::from(config),
        )
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    /// Receive every published state
    pub fn subscribe(&self) -> watch::Receiver<CaptureState> {
        self.publisher.subscribe()
    }

    /// The shared session, for binding preview surfaces
    pub fn manager(&self) -> &CameraBackendManager {
        &self.manager
    }

    /// Dispatch a UI message to the matching operation
    pub async fn update(&mut self, message: Message) -> CaptureResult<Transition> {
        debug!(?message, phase = %self.state.phase(), "Handling message");
        match message {
            Message::Authorize => self.authorize().await,
            Message::Configure => self.configure().await,
            Message::Start => self.start().await,
            Message::Capture => self.capture().await,
            Message::Retake => self.retake().await,
            Message::Save => self.save().await,
            Message::Shutdown => self.shutdown().await,
        }
    }

    /// Check camera access and configure the session once granted
    pub async fn authorize(&mut self) -> CaptureResult<Transition> {
        if self.state.alert || self.state.authorization == AuthorizationStatus::Denied {
            debug!("Authorization was denied earlier, ignoring");
            return Ok(Transition::Ignored);
        }
        if self.state.is_configured || self.state.requesting_access {
            return Ok(Transition::Ignored);
        }

        let status = self.permission.status();
        info!(%status, "Camera authorization status");

        match status {
            AuthorizationStatus::Authorized => {
                self.state.authorization = AuthorizationStatus::Authorized;
                self.publish();
                self.configure().await
            }
            AuthorizationStatus::Unknown => {
                self.state.requesting_access = true;
                self.publish();

                let granted = self.permission.request_access().await;
                self.state.requesting_access = false;

                if granted {
                    info!("Camera access granted");
                    self.state.authorization = AuthorizationStatus::Authorized;
                    self.publish();
                    self.configure().await
                } else {
                    self.deny()
                }
            }
            AuthorizationStatus::Denied => self.deny(),
        }
    }

    fn deny(&mut self) -> CaptureResult<Transition> {
        warn!("Camera access denied");
        self.state.authorization = AuthorizationStatus::Denied;
        self.state.alert = true;
        self.state.last_error = Some(CaptureErrorKind::AuthorizationDenied);
        self.publish();
        Err(CaptureError::authorization_denied())
    }

    /// Attach camera input and photo output
    pub async fn configure(&mut self) -> CaptureResult<Transition> {
        if self.state.authorization != AuthorizationStatus::Authorized || self.state.is_configured
        {
            return Ok(Transition::Ignored);
        }

        let selection = self.selection.clone();
        let result = self
            .on_session(move |manager| {
                let device = select_device(manager, selection.device_path.as_deref())?;
                let formats = manager.get_formats(&device);
                let format = select_format(&formats, &selection.format).ok_or_else(|| {
                    BackendError::FormatNotSupported(format!("{} offers no formats", device.name))
                })?;
                manager.configure(&device, &format)?;
                Ok((device, format))
            })
            .await;

        match result {
            Ok((device, format)) => {
                info!(device = %device.name, format = %format, "Capture session configured");
                self.state.is_configured = true;
                self.state.last_error = None;
                self.publish();
                Ok(Transition::Applied)
            }
            Err(e) => {
                warn!(error = %e, "Failed to configure capture session");
                self.fail(CaptureErrorKind::DeviceUnavailable, e.to_string())
            }
        }
    }

    /// Start streaming
    pub async fn start(&mut self) -> CaptureResult<Transition> {
        if !self.state.is_configured || self.state.is_running || self.state.is_taken {
            return Ok(Transition::Ignored);
        }

        match self.on_session(|manager| manager.start()).await {
            Ok(()) => {
                self.state.is_running = true;
                self.state.last_error = None;
                self.publish();
                Ok(Transition::Applied)
            }
            Err(e) => {
                warn!(error = %e, "Failed to start capture session");
                self.fail(CaptureErrorKind::DeviceUnavailable, e.to_string())
            }
        }
    }

    /// Take a photo of the newest frame, then stop the session
    ///
    /// On failure the session keeps running and only `last_error` changes.
    pub async fn capture(&mut self) -> CaptureResult<Transition> {
        if !self.state.is_running || self.state.is_taken {
            return Ok(Transition::Ignored);
        }

        let receiver = self.manager.capture_photo();
        let result = receiver.await.unwrap_or_else(|_| {
            Err(BackendError::CaptureFailed(
                "photo output dropped the request".to_string(),
            ))
        });

        let bytes = match result {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => {
                warn!("Photo output returned no data");
                return self.fail(CaptureErrorKind::CaptureFailed, "empty photo");
            }
            Err(e) => {
                warn!(error = %e, "Photo capture failed");
                return self.fail(CaptureErrorKind::CaptureFailed, e.to_string());
            }
        };

        if let Err(e) = self.on_session(|manager| manager.stop()).await {
            warn!(error = %e, "Failed to stop session after capture");
        }

        info!(bytes = bytes.len(), "Photo captured");
        self.state.pending_image = Arc::from(bytes);
        self.state.is_running = false;
        self.state.is_taken = true;
        self.state.last_error = None;
        self.publish();
        Ok(Transition::Applied)
    }

    /// Discard the captured photo and resume the preview
    pub async fn retake(&mut self) -> CaptureResult<Transition> {
        if !self.state.is_taken {
            return Ok(Transition::Ignored);
        }

        if let Err(e) = self.on_session(|manager| manager.start()).await {
            warn!(error = %e, "Failed to restart capture session");
            return self.fail(CaptureErrorKind::DeviceUnavailable, e.to_string());
        }

        info!("Retaking photo");
        self.state.pending_image = Arc::default();
        self.state.saved_path = None;
        self.state.is_saved = false;
        self.state.is_taken = false;
        self.state.is_running = true;
        self.state.last_error = None;
        self.publish();
        Ok(Transition::Applied)
    }

    /// Write the captured photo to the photo library
    pub async fn save(&mut self) -> CaptureResult<Transition> {
        if !self.state.is_taken || self.state.is_saved || self.state.pending_image.is_empty() {
            return Ok(Transition::Ignored);
        }

        match self
            .library
            .save(Arc::clone(&self.state.pending_image))
            .await
        {
            Ok(path) => {
                self.state.is_saved = true;
                self.state.saved_path = Some(path);
                self.state.last_error = None;
                self.publish();
                Ok(Transition::Applied)
            }
            Err(e) => {
                warn!(error = %e, "Failed to save photo");
                self.fail(CaptureErrorKind::SaveFailed, e.to_string())
            }
        }
    }

    /// Stop a running session when the screen goes away
    pub async fn shutdown(&mut self) -> CaptureResult<Transition> {
        if !self.state.is_running {
            return Ok(Transition::Ignored);
        }

        if let Err(e) = self.on_session(|manager| manager.stop()).await {
            warn!(error = %e, "Failed to stop capture session");
        }
        self.state.is_running = false;
        self.publish();
        Ok(Transition::Applied)
    }

    fn fail(
        &mut self,
        kind: CaptureErrorKind,
        message: impl Into<String>,
    ) -> CaptureResult<Transition> {
        self.state.last_error = Some(kind);
        self.publish();
        Err(CaptureError::new(kind, message))
    }

    fn publish(&self) {
        debug_assert!(
            self.state.invariants_hold(),
            "capture state invariants violated: {:?}",
            self.state
        );
        self.publisher.send_replace(self.state.clone());
    }

    /// Run a blocking session call off the async threads
    async fn on_session<T, F>(&self, op: F) -> BackendResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&CameraBackendManager) -> BackendResult<T> + Send + 'static,
    {
        let manager = self.manager.clone();
        tokio::task::spawn_blocking(move || op(&manager))
            .await
            .map_err(|e| BackendError::Other(format!("Session task failed: {}", e)))?
    }
}

/// The configured device, or the first one the backend reports
fn select_device(
    manager: &CameraBackendManager,
    path: Option<&str>,
) -> BackendResult<CameraDevice> {
    let mut cameras = manager.enumerate_cameras()?;
    match path {
        Some(path) => cameras
            .into_iter()
            .find(|c| c.path == path)
            .ok_or_else(|| BackendError::DeviceNotFound(path.to_string())),
        None => Ok(cameras.remove(0)),
    }
}
