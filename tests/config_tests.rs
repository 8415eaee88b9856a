// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use snapcam::Config;
use snapcam::backends::camera::CameraBackendType;
use snapcam::config::PermissionMode;
use snapcam::pipelines::photo::EncodingQuality;
use std::path::PathBuf;

fn temp_dir() -> PathBuf {
    std::env::temp_dir().join(format!("snapcam-config-{}", uuid::Uuid::new_v4()))
}

#[test]
fn test_config_default() {
    let config = Config::default();

    // Check sensible defaults
    assert!(
        config.mirror_preview,
        "Mirror preview should be enabled by default"
    );
    assert_eq!(config.backend, CameraBackendType::Virtual);
    assert_eq!(config.permission, PermissionMode::Device);
    assert_eq!(config.photo_quality, EncodingQuality::High);
    assert!(config.device_path.is_none());
}

#[test]
fn test_missing_file_yields_defaults() {
    let path = temp_dir().join("config.json");
    let config = Config::load_from(&path).expect("missing file is not an error");
    assert_eq!(config, Config::default());
}

#[test]
fn test_save_and_load() {
    let dir = temp_dir();
    let path = dir.join("nested").join("config.json");

    let config = Config {
        device_path: Some("/dev/video2".to_string()),
        photo_directory: Some(dir.join("photos")),
        mirror_preview: false,
        ..Default::default()
    };
    config.save_to(&path).expect("save config");

    let loaded = Config::load_from(&path).expect("load config");
    assert_eq!(loaded, config);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = temp_dir();
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.json");
    std::fs::write(&path, r#"{ "mirror_preview": false, "permission": "Granted" }"#).unwrap();

    let config = Config::load_from(&path).unwrap();
    assert!(!config.mirror_preview);
    assert_eq!(config.permission, PermissionMode::Granted);
    assert_eq!(config.capture_format, Default::default());

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_invalid_file_is_an_error() {
    let dir = temp_dir();
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.json");
    std::fs::write(&path, "not json").unwrap();

    assert!(Config::load_from(&path).is_err());

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_photo_dir_override() {
    let config = Config {
        photo_directory: Some(PathBuf::from("/tmp/shots")),
        ..Default::default()
    };
    assert_eq!(config.photo_dir(), PathBuf::from("/tmp/shots"));
    assert!(Config::default().photo_dir().ends_with("snapcam"));
}
