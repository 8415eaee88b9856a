// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic test pattern
//!
//! Vertical colour bars that scroll one pixel per frame, so a live preview
//! is visibly distinguishable from a frozen one.

use crate::backends::camera::types::CameraFrame;
use crate::constants::virtual_camera::BAR_COUNT;

const BAR_COLORS: [[u8; 3]; BAR_COUNT as usize] = [
    [235, 235, 235], // white
    [235, 235, 16],  // yellow
    [16, 235, 235],  // cyan
    [16, 235, 16],   // green
    [235, 16, 235],  // magenta
    [235, 16, 16],   // red
    [16, 16, 235],   // blue
    [16, 16, 16],    // black
];

/// Render frame number `sequence` of the pattern
pub fn render(width: u32, height: u32, sequence: u64) -> CameraFrame {
    let bar_width = (width / BAR_COUNT).max(1);
    let shift = (sequence % u64::from(width.max(1))) as u32;

    let mut row = Vec::with_capacity((width * 4) as usize);
    for x in 0..width {
        let bar = (((x + shift) % width.max(1)) / bar_width).min(BAR_COUNT - 1);
        let [r, g, b] = BAR_COLORS[bar as usize];
        row.extend_from_slice(&[r, g, b, 255]);
    }

    let mut data = Vec::with_capacity(row.len() * height as usize);
    for _ in 0..height {
        data.extend_from_slice(&row);
    }

    CameraFrame::from_rgba(width, height, data, sequence)
}
