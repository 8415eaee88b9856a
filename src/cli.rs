// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Taking photos without the terminal UI
//! - Printing the effective configuration

use snapcam::app::{CaptureController, Transition};
use snapcam::backends::camera::{BackendOptions, CameraBackendManager};
use snapcam::config::Config;
use snapcam::errors::CameraError;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// List all available cameras
pub fn list_cameras(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let manager = CameraBackendManager::new(config.backend, &BackendOptions::from(config));
    if !manager.is_available() {
        println!("Camera backend '{}' is not available on this system.", manager.backend_type());
        return Ok(());
    }

    let cameras = manager.enumerate_cameras().unwrap_or_default();
    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras ({}):", manager.backend_type());
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        println!("      Path: {}", camera.path);

        let formats = manager.get_formats(camera);
        if !formats.is_empty() {
            // Group formats by resolution and show best framerate
            let mut resolutions: Vec<(u32, u32, u32)> = Vec::new();
            for format in &formats {
                let fps = format.framerate.map(|f| f.as_int()).unwrap_or(30);
                if let Some(existing) = resolutions
                    .iter_mut()
                    .find(|(w, h, _)| *w == format.width && *h == format.height)
                {
                    if fps > existing.2 {
                        existing.2 = fps;
                    }
                } else {
                    resolutions.push((format.width, format.height, fps));
                }
            }

            // Sort by resolution (highest first)
            resolutions.sort_by(|a, b| (b.0 * b.1).cmp(&(a.0 * a.1)));

            let res_strs: Vec<String> = resolutions
                .iter()
                .take(3)
                .map(|(w, h, fps)| format!("{}x{}@{}fps", w, h, fps))
                .collect();

            println!("      Formats: {}", res_strs.join(", "));
        }
        println!();
    }

    Ok(())
}

/// Take a photo using the specified camera
///
/// Runs the capture state machine once: authorize, start, capture, save.
pub fn take_photo(
    config: &Config,
    camera_index: usize,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let manager = CameraBackendManager::new(config.backend, &BackendOptions::from(config));
    let cameras = manager.enumerate_cameras().unwrap_or_default();
    if cameras.is_empty() {
        return Err(CameraError::NoCameraFound.into());
    }

    let camera = cameras.get(camera_index).ok_or(CameraError::InvalidIndex {
        index: camera_index,
        count: cameras.len(),
    })?;
    println!("Using camera: {}", camera.name);

    let mut config = config.clone();
    config.device_path = Some(camera.path.clone());
    config.photo_directory = Some(output_dir(output.as_deref(), &config));

    let runtime = tokio::runtime::Runtime::new()?;
    let saved = runtime.block_on(async {
        let mut controller = CaptureController::from_config(&config);
        let mut frames = controller.manager().preview_receiver();

        controller.authorize().await?;
        if let Some(format) = controller.manager().current_format() {
            println!("Capture format: {}", format);
        }
        if controller.start().await? == Transition::Ignored {
            return Err("Capture session did not start".into());
        }

        // Wait for the first frame, then let exposure settle
        println!("Capturing...");
        tokio::time::timeout(Duration::from_secs(5), frames.wait_for(Option::is_some))
            .await
            .map_err(|_| "Timed out waiting for a camera frame")?
            .map(|_| ())?;
        tokio::time::sleep(Duration::from_millis(500)).await;

        controller.capture().await?;
        controller.save().await?;
        let saved = controller
            .state()
            .saved_path
            .clone()
            .ok_or("Photo library did not report a path")?;
        Ok::<_, Box<dyn std::error::Error>>(saved)
    })?;

    // If user specified a specific filename, rename the file
    if let Some(user_path) = output
        && !user_path.is_dir()
    {
        std::fs::rename(&saved, &user_path)?;
        println!("Photo saved: {}", user_path.display());
        return Ok(());
    }

    println!("Photo saved: {}", saved.display());
    Ok(())
}

/// Print the effective configuration as JSON
pub fn print_config(config: &Config, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(path) => eprintln!("Config file: {}", path.display()),
        None => eprintln!("No config directory, showing defaults"),
    }
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

/// Directory the photo is first written to
fn output_dir(output: Option<&Path>, config: &Config) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.to_path_buf(),
        Some(path) => path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
        None => config.photo_dir(),
    }
}
