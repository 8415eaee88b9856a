// SPDX-License-Identifier: GPL-3.0-only

//! Still-image source for the virtual camera
//!
//! Lets a picture file stand in for a camera: the image is decoded once at
//! configuration time and streamed repeatedly.

use crate::backends::camera::types::{BackendError, BackendResult, CameraFrame};
use crate::constants::file_formats;
use std::path::Path;
use tracing::info;

/// Read image dimensions without decoding the pixels
pub fn image_dimensions(path: &Path) -> BackendResult<(u32, u32)> {
    check_extension(path)?;
    image::image_dimensions(path).map_err(|e| {
        BackendError::DeviceNotFound(format!("Failed to read '{}': {}", path.display(), e))
    })
}

/// Decode an image file into an RGBA frame
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    check_extension(path)?;
    info!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| {
        BackendError::InitializationFailed(format!(
            "Failed to load image '{}': {}",
            path.display(),
            e
        ))
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    info!(width, height, "Image loaded successfully");

    Ok(CameraFrame::from_rgba(width, height, rgba.into_raw(), 0))
}

fn check_extension(path: &Path) -> BackendResult<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    if file_formats::is_image_extension(extension) {
        Ok(())
    } else {
        Err(BackendError::FormatNotSupported(format!(
            "Unsupported file format: {}",
            extension
        )))
    }
}
