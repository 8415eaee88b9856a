// SPDX-License-Identifier: GPL-3.0-only

//! Device-node authorization
//!
//! Without a portal, camera access on Linux is file access: the process may
//! use a camera iff it can open `/dev/videoN` read-write (usually through
//! membership in the `video` group).

use super::{AuthorizationStatus, CameraPermission};
use crate::constants::v4l2::DEVICE_PREFIX;
use futures::future::BoxFuture;
use std::ffi::CString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Checks access to a device node, or to any video node when none is configured
#[derive(Debug, Clone)]
pub struct DevicePermission {
    path: Option<String>,
}

impl DevicePermission {
    pub fn new(path: Option<String>) -> Self {
        Self { path }
    }

    fn candidates(&self) -> Vec<PathBuf> {
        if let Some(path) = &self.path {
            return vec![PathBuf::from(path)];
        }
        std::fs::read_dir("/dev")
            .into_iter()
            .flatten()
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with(DEVICE_PREFIX))
                    .unwrap_or(false)
            })
            .collect()
    }
}

/// Status of a single node
///
/// Only a refused open is `Denied`; a missing node is `Unknown` and is left
/// to device selection to report.
pub fn node_status(path: &Path) -> AuthorizationStatus {
    let Ok(c_path) = CString::new(path.as_os_str().as_encoded_bytes()) else {
        return AuthorizationStatus::Unknown;
    };

    // SAFETY: c_path is a valid NUL-terminated string for the duration of the call
    let rc = unsafe { libc::access(c_path.as_ptr(), libc::R_OK | libc::W_OK) };
    if rc == 0 {
        return AuthorizationStatus::Authorized;
    }

    match std::io::Error::last_os_error().raw_os_error() {
        Some(libc::EACCES) | Some(libc::EPERM) | Some(libc::EROFS) => AuthorizationStatus::Denied,
        _ => AuthorizationStatus::Unknown,
    }
}

impl CameraPermission for DevicePermission {
    fn status(&self) -> AuthorizationStatus {
        let statuses: Vec<_> = self.candidates().iter().map(|p| node_status(p)).collect();
        debug!(?statuses, "Device node access");

        if statuses.contains(&AuthorizationStatus::Authorized) {
            AuthorizationStatus::Authorized
        } else if statuses.contains(&AuthorizationStatus::Denied) {
            AuthorizationStatus::Denied
        } else {
            AuthorizationStatus::Unknown
        }
    }

    /// Nothing to prompt for: grant unless a node refuses access
    fn request_access(&self) -> BoxFuture<'_, bool> {
        Box::pin(async move { self.status() != AuthorizationStatus::Denied })
    }
}
