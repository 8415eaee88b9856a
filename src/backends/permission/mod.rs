// SPDX-License-Identifier: GPL-3.0-only

//! Camera authorization
//!
//! A [`CameraPermission`] answers "may this process use the camera?" with a
//! tri-state [`AuthorizationStatus`] and can ask the user (or the system)
//! when the answer is not known yet.

pub mod device;
pub mod portal;

pub use device::DevicePermission;
pub use portal::PortalPermission;

use crate::backends::camera::CameraBackendType;
use crate::config::{Config, PermissionMode};
use futures::future::BoxFuture;
use serde::Serialize;
use std::sync::Arc;

/// Camera authorization state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum AuthorizationStatus {
    /// Not asked yet
    #[default]
    Unknown,
    Authorized,
    Denied,
}

impl std::fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthorizationStatus::Unknown => write!(f, "unknown"),
            AuthorizationStatus::Authorized => write!(f, "authorized"),
            AuthorizationStatus::Denied => write!(f, "denied"),
        }
    }
}

/// Camera permission provider
pub trait CameraPermission: Send + Sync {
    /// Current status without prompting
    fn status(&self) -> AuthorizationStatus;

    /// Ask for access; resolves to whether access was granted
    fn request_access(&self) -> BoxFuture<'_, bool>;
}

/// Fixed answer, for the `Granted` mode and for tests
#[derive(Debug, Clone, Copy)]
pub struct StaticPermission {
    status: AuthorizationStatus,
    grant_on_request: bool,
}

impl StaticPermission {
    pub fn new(status: AuthorizationStatus, grant_on_request: bool) -> Self {
        Self {
            status,
            grant_on_request,
        }
    }

    pub fn granted() -> Self {
        Self::new(AuthorizationStatus::Authorized, true)
    }

    pub fn denied() -> Self {
        Self::new(AuthorizationStatus::Denied, false)
    }

    /// Status unknown; a request resolves to `grant`
    pub fn prompt(grant: bool) -> Self {
        Self::new(AuthorizationStatus::Unknown, grant)
    }
}

impl CameraPermission for StaticPermission {
    fn status(&self) -> AuthorizationStatus {
        self.status
    }

    fn request_access(&self) -> BoxFuture<'_, bool> {
        let grant = self.grant_on_request;
        Box::pin(async move { grant })
    }
}

/// Build the permission provider selected in `config`
///
/// The virtual camera has no device node, so `Device` mode grants it.
pub fn for_config(config: &Config) -> Arc<dyn CameraPermission> {
    match config.permission {
        PermissionMode::Portal => Arc::new(PortalPermission::new()),
        PermissionMode::Device if config.backend == CameraBackendType::Virtual => {
            Arc::new(StaticPermission::granted())
        }
        PermissionMode::Device => Arc::new(DevicePermission::new(config.device_path.clone())),
        PermissionMode::Granted => Arc::new(StaticPermission::granted()),
    }
}
