// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON in `$XDG_CONFIG_HOME/snapcam/config.json`. Every field has
//! a default, so partial or missing files load fine.

use crate::backends::camera::CameraBackendType;
use crate::constants::{app_info, virtual_camera};
use crate::errors::{AppError, AppResult};
use crate::pipelines::photo::EncodingQuality;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// How camera access is authorized
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum PermissionMode {
    /// Ask the XDG desktop portal (Flatpak-friendly)
    Portal,
    /// Check read/write access on the device node
    #[default]
    Device,
    /// Treat access as granted
    Granted,
}

/// Requested capture format
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatSettings {
    /// Resolution width
    pub width: u32,
    /// Resolution height
    pub height: u32,
    /// Framerate
    pub framerate: Option<u32>,
    /// Preferred pixel format (e.g., "MJPG", "YUYV")
    pub pixel_format: Option<String>,
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            width: virtual_camera::DEFAULT_WIDTH,
            height: virtual_camera::DEFAULT_HEIGHT,
            framerate: Some(virtual_camera::DEFAULT_FPS),
            pixel_format: None,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera backend to use
    pub backend: CameraBackendType,
    /// Camera device path; first enumerated device when unset
    pub device_path: Option<String>,
    /// Camera authorization provider
    pub permission: PermissionMode,
    /// Photo library directory; `~/Pictures/snapcam` when unset
    pub photo_directory: Option<PathBuf>,
    /// JPEG quality of saved photos
    pub photo_quality: EncodingQuality,
    /// Requested capture format
    pub capture_format: FormatSettings,
    /// Mirror camera preview horizontally (selfie mode)
    pub mirror_preview: bool,
    /// Image file streamed by the virtual camera instead of the test pattern
    pub virtual_source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: CameraBackendType::default(),
            device_path: None,
            permission: PermissionMode::default(),
            photo_directory: None,
            photo_quality: EncodingQuality::default(),
            capture_format: FormatSettings::default(),
            mirror_preview: true, // Default to mirrored (selfie mode)
            virtual_source: None,
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(app_info::APP_NAME).join(app_info::CONFIG_FILE))
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config = serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Write to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Directory of the photo library
    pub fn photo_dir(&self) -> PathBuf {
        self.photo_directory.clone().unwrap_or_else(default_photo_dir)
    }
}

/// `~/Pictures/snapcam`, or `./Pictures/snapcam` without a home directory
pub fn default_photo_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Pictures")))
        .unwrap_or_else(|| PathBuf::from("Pictures"))
        .join(app_info::APP_NAME)
}
