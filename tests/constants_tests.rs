// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use snapcam::constants::{app_info, file_formats, frame_interval, photo, ui};

#[test]
fn test_version_is_set() {
    assert!(!app_info::version().is_empty());
}

#[test]
fn test_photo_extension_is_supported_image() {
    assert!(file_formats::is_image_extension(photo::EXTENSION));
}

#[test]
fn test_timestamp_format_is_filename_safe() {
    let stamp = chrono::Local::now().format(photo::TIMESTAMP_FORMAT).to_string();
    assert_eq!(stamp.len(), "YYYYMMDD_HHMMSS".len());
    assert!(stamp.chars().all(|c| c.is_ascii_digit() || c == '_'));
}

#[test]
fn test_poll_interval_faster_than_frames() {
    // Redraw must keep up with a 30 fps preview
    assert!(ui::POLL_INTERVAL <= frame_interval(30));
}
