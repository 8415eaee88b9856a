// SPDX-License-Identifier: GPL-3.0-only

//! Camera preview surface
//!
//! Binds to the session's frame channel once, asks the controller to start
//! the session, and from then on only renders. It never stops the session:
//! after a capture the last frame simply stays on screen.
//!
//! Frames are drawn with Unicode half-block characters, two vertical pixels
//! per terminal cell.

use super::{ControllerHandle, Message};
use crate::backends::camera::types::{CameraFrame, FrameReceiver};
use crate::constants::ui::WAITING_MESSAGE;
use ratatui::{buffer::Buffer, layout::Rect, style::Color, widgets::Widget};
use std::sync::Arc;

pub struct PreviewSurface {
    frames: FrameReceiver,
    frame: Option<Arc<CameraFrame>>,
    mirror: bool,
}

impl PreviewSurface {
    /// Bind to `frames` and start the session
    pub fn attach(handle: &ControllerHandle, frames: FrameReceiver, mirror: bool) -> Self {
        handle.send(Message::Start);
        Self::bind(frames, mirror)
    }

    /// Bind without starting, for surfaces whose session is driven elsewhere
    pub fn bind(mut frames: FrameReceiver, mirror: bool) -> Self {
        let frame = frames.borrow_and_update().clone();
        Self {
            frames,
            frame,
            mirror,
        }
    }

    /// Pull the newest frame; true if it changed
    pub fn refresh(&mut self) -> bool {
        match self.frames.has_changed() {
            Ok(true) => {
                self.frame = self.frames.borrow_and_update().clone();
                true
            }
            _ => false,
        }
    }

    pub fn frame(&self) -> Option<&CameraFrame> {
        self.frame.as_deref()
    }

    /// Display size in cells that fits `frame` into `area` keeping aspect ratio
    fn fit(frame: &CameraFrame, area: Rect) -> (u16, u16) {
        let frame_aspect = frame.width as f64 / frame.height.max(1) as f64;
        let term_width = area.width as f64;
        let term_height = (area.height as f64) * 2.0;

        if term_width / term_height > frame_aspect {
            let h = term_height;
            ((h * frame_aspect) as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            (w as u16, (w / frame_aspect / 2.0) as u16)
        }
    }
}

impl Widget for &PreviewSurface {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = self.frame() else {
            let x = area.x + (area.width.saturating_sub(WAITING_MESSAGE.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, WAITING_MESSAGE, ratatui::style::Style::default());
            }
            return;
        };

        let (display_width, display_height) = PreviewSurface::fit(frame, area);
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height as f64 * 2.0);

        for ty in 0..display_height {
            for tx in 0..display_width {
                let column = if self.mirror {
                    display_width - 1 - tx
                } else {
                    tx
                };
                let src_x = (column as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let (r, g, b) = frame.pixel_rgb(src_x, src_y_top);
                let top = Color::Rgb(r, g, b);
                let (r, g, b) = frame.pixel_rgb(src_x, src_y_bottom);
                let bottom = Color::Rgb(r, g, b);

                // Upper half block: fg is the top pixel, bg the bottom one
                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::watch;

    fn two_tone_frame() -> CameraFrame {
        // Left pixel red, right pixel blue
        CameraFrame::from_rgba(2, 2, vec![
            255, 0, 0, 255, 0, 0, 255, 255, //
            255, 0, 0, 255, 0, 0, 255, 255,
        ], 0)
    }

    #[test]
    fn test_refresh_picks_up_new_frames() {
        let (sender, receiver) = watch::channel(None);
        let mut surface = PreviewSurface::bind(receiver, false);
        assert!(surface.frame().is_none());
        assert!(!surface.refresh());

        sender.send_replace(Some(Arc::new(two_tone_frame())));
        assert!(surface.refresh());
        assert_eq!(surface.frame().map(|f| f.width), Some(2));
    }

    #[test]
    fn test_mirror_flips_columns() {
        let (_sender, receiver) = watch::channel(Some(Arc::new(two_tone_frame())));
        let area = Rect::new(0, 0, 2, 1);

        let mut buf = Buffer::empty(area);
        (&PreviewSurface::bind(receiver.clone(), false)).render(area, &mut buf);
        assert_eq!(buf[(0, 0)].fg, Color::Rgb(255, 0, 0));

        let mut mirrored = Buffer::empty(area);
        (&PreviewSurface::bind(receiver, true)).render(area, &mut mirrored);
        assert_eq!(mirrored[(0, 0)].fg, Color::Rgb(0, 0, 255));
    }

    #[test]
    fn test_waiting_message_without_frame() {
        let (_sender, receiver) = watch::channel(None);
        let area = Rect::new(0, 0, 40, 3);
        let mut buf = Buffer::empty(area);
        (&PreviewSurface::bind(receiver, false)).render(area, &mut buf);
        let row: String = (0..40).map(|x| buf[(x, 1)].symbol().to_string()).collect();
        assert!(row.contains(WAITING_MESSAGE));
    }
}
