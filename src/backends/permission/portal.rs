// SPDX-License-Identifier: GPL-3.0-only

//! XDG desktop portal camera authorization
//!
//! Calls `org.freedesktop.portal.Camera.AccessCamera` on the session bus and
//! waits for the `Response` signal of the resulting request object. The
//! request path is derived from a `handle_token` before the call, so the
//! signal subscription exists before the portal can answer.

use super::{AuthorizationStatus, CameraPermission};
use futures::StreamExt;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, warn};
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};

const PORTAL_DESTINATION: &str = "org.freedesktop.portal.Desktop";
const PORTAL_PATH: &str = "/org/freedesktop/portal/desktop";
const CAMERA_INTERFACE: &str = "org.freedesktop.portal.Camera";
const REQUEST_INTERFACE: &str = "org.freedesktop.portal.Request";

/// Portal response code for "granted"
const RESPONSE_SUCCESS: u32 = 0;

/// Portal-backed permission; the answer is cached for the process lifetime
#[derive(Debug, Default)]
pub struct PortalPermission {
    status: Mutex<AuthorizationStatus>,
}

impl PortalPermission {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_status(&self, status: AuthorizationStatus) {
        *self.status.lock().unwrap_or_else(|p| p.into_inner()) = status;
    }
}

impl CameraPermission for PortalPermission {
    fn status(&self) -> AuthorizationStatus {
        *self.status.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn request_access(&self) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            let granted = match access_camera().await {
                Ok(granted) => granted,
                Err(e) => {
                    warn!(error = %e, "Camera portal request failed");
                    false
                }
            };
            self.set_status(if granted {
                AuthorizationStatus::Authorized
            } else {
                AuthorizationStatus::Denied
            });
            granted
        })
    }
}

/// Request path the portal will use for `token` on this connection
pub fn request_path(unique_name: &str, token: &str) -> String {
    let sender = unique_name.trim_start_matches(':').replace('.', "_");
    format!("{}/request/{}/{}", PORTAL_PATH, sender, token)
}

async fn access_camera() -> Result<bool, String> {
    let connection = zbus::Connection::session()
        .await
        .map_err(|e| format!("Failed to connect to session D-Bus: {}", e))?;

    let camera = zbus::Proxy::new(&connection, PORTAL_DESTINATION, PORTAL_PATH, CAMERA_INTERFACE)
        .await
        .map_err(|e| format!("Failed to create camera portal proxy: {}", e))?;

    match camera.get_property::<bool>("IsCameraPresent").await {
        Ok(present) => debug!(present, "Camera portal presence"),
        Err(e) => debug!(error = %e, "Camera portal presence unknown"),
    }

    let unique_name = connection
        .unique_name()
        .map(|name| name.as_str().to_string())
        .ok_or_else(|| "Connection has no unique name".to_string())?;
    let token = format!("snapcam_{}", uuid::Uuid::new_v4().simple());
    let path = request_path(&unique_name, &token);

    let request = zbus::Proxy::new(
        &connection,
        PORTAL_DESTINATION,
        path.as_str(),
        REQUEST_INTERFACE,
    )
    .await
    .map_err(|e| format!("Failed to create request proxy: {}", e))?;
    let mut responses = request
        .receive_signal("Response")
        .await
        .map_err(|e| format!("Failed to subscribe to portal response: {}", e))?;

    let mut options: HashMap<&str, Value> = HashMap::new();
    options.insert("handle_token", Value::new(token.as_str()));

    let handle: OwnedObjectPath = camera
        .call("AccessCamera", &(options,))
        .await
        .map_err(|e| format!("AccessCamera failed: {}", e))?;
    info!(handle = %handle, "Waiting for camera portal response");

    let message = responses
        .next()
        .await
        .ok_or_else(|| "Portal response stream closed".to_string())?;
    let body = message.body();
    let (response, _results): (u32, HashMap<String, OwnedValue>) = body
        .deserialize()
        .map_err(|e| format!("Malformed portal response: {}", e))?;

    info!(response, "Camera portal answered");
    Ok(response == RESPONSE_SUCCESS)
}
