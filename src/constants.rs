// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Application identity
pub mod app_info {
    /// Name used for the config directory and the photo library folder
    pub const APP_NAME: &str = "snapcam";

    /// Config file name inside the config directory
    pub const CONFIG_FILE: &str = "config.json";

    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}

/// Photo output constants
pub mod photo {
    /// Filename prefix for saved photos
    pub const FILENAME_PREFIX: &str = "IMG";

    /// Timestamp pattern used in saved photo filenames
    pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

    /// Extension of encoded photos
    pub const EXTENSION: &str = "jpg";
}

/// Supported file formats for the still-image virtual source
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Virtual camera defaults
pub mod virtual_camera {
    /// Device path reported for the synthetic source
    pub const DEVICE_PATH: &str = "virtual:test-pattern";

    /// Device name reported for the synthetic source
    pub const DEVICE_NAME: &str = "Test Pattern";

    /// Default frame width
    pub const DEFAULT_WIDTH: u32 = 640;

    /// Default frame height
    pub const DEFAULT_HEIGHT: u32 = 480;

    /// Default framerate
    pub const DEFAULT_FPS: u32 = 30;

    /// Number of colour bars in the test pattern
    pub const BAR_COUNT: u32 = 8;
}

/// V4L2 capture constants
pub mod v4l2 {
    /// Number of mmap buffers requested from the driver
    pub const BUFFER_COUNT: u32 = 4;

    /// Prefix of video device nodes in /dev
    pub const DEVICE_PREFIX: &str = "video";
}

/// Terminal UI constants
pub mod ui {
    use super::Duration;

    /// Input poll interval; also bounds the redraw rate
    pub const POLL_INTERVAL: Duration = Duration::from_millis(16);

    /// Text shown until the first frame arrives
    pub const WAITING_MESSAGE: &str = "Waiting for camera...";

    /// Alert shown when camera access is denied
    pub const DENIED_MESSAGE: &str =
        "Camera access denied. Grant access in system settings and restart.";
}

/// Convert a framerate into the interval between frames
pub fn frame_interval(fps: u32) -> Duration {
    Duration::from_micros(1_000_000 / u64::from(fps.max(1)))
}
