// SPDX-License-Identifier: GPL-3.0-only

//! Terminal camera screen
//!
//! The interactive context: polls keys, sends [`Message`]s to the controller
//! task and redraws from the newest published [`CaptureState`].
//!
//! Keys: space/p capture, r retake, s save, q/Ctrl+C quit.

use crate::app::{self, CaptureController, CaptureState, Message, PreviewSurface, SessionPhase};
use crate::config::Config;
use crate::constants::ui::{DENIED_MESSAGE, POLL_INTERVAL};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use std::io::{self, stdout};
use tracing::info;

/// Run the camera screen until the user quits
pub fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;

    let controller = CaptureController::from_config(&config);
    let frames = controller.manager().preview_receiver();
    let handle = {
        let _guard = runtime.enter();
        app::spawn(controller)
    };

    // Screen entry: check access first so Start lands on a configured session
    handle.send(Message::Authorize);
    let mut preview = PreviewSurface::attach(&handle, frames, config.mirror_preview);

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &handle, &mut preview);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    runtime.block_on(handle.close());
    info!("Camera screen closed");

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    handle: &app::ControllerHandle,
    preview: &mut PreviewSurface,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        preview.refresh();
        let state = handle.state();

        terminal.draw(|f| {
            let area = f.area();

            let camera_area = Rect {
                height: area.height.saturating_sub(1),
                ..area
            };
            f.render_widget(&*preview, camera_area);

            let status_area = Rect {
                y: area.y + area.height.saturating_sub(1),
                height: 1.min(area.height),
                ..area
            };
            let message = controls_message(&state);
            f.render_widget(StatusBar { message: &message }, status_area);

            if state.alert {
                let popup = centered(area, 48, 5);
                f.render_widget(Clear, popup);
                f.render_widget(
                    Paragraph::new(DENIED_MESSAGE)
                        .wrap(Wrap { trim: true })
                        .block(Block::default().borders(Borders::ALL).title(" Camera ")),
                    popup,
                );
            }
        })?;

        if event::poll(POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }
            match key.code {
                KeyCode::Char('q') => break,
                code => {
                    if let Some(message) = message_for_key(code, &state) {
                        handle.send(message);
                    }
                }
            }
        }
    }

    Ok(())
}

/// Map a key to a message, honouring which buttons the state shows
///
/// The shutter is hidden once a photo is taken; retake and save only exist
/// while one is; save disappears once the photo is saved.
pub fn message_for_key(code: KeyCode, state: &CaptureState) -> Option<Message> {
    match code {
        KeyCode::Char(' ') | KeyCode::Char('p') | KeyCode::Enter if !state.is_taken => {
            Some(Message::Capture)
        }
        KeyCode::Char('r') if state.is_taken => Some(Message::Retake),
        KeyCode::Char('s') if state.is_taken && !state.is_saved => Some(Message::Save),
        _ => None,
    }
}

/// Status bar text for the buttons visible in `state`
pub fn controls_message(state: &CaptureState) -> String {
    match state.phase() {
        SessionPhase::Idle | SessionPhase::Configured => "Starting camera... | 'q' quit".to_string(),
        SessionPhase::Authorizing => "Requesting camera access... | 'q' quit".to_string(),
        SessionPhase::Denied => "'q' quit".to_string(),
        SessionPhase::Running => "'space' capture | 'q' quit".to_string(),
        SessionPhase::Taken => "'r' retake | 's' save | 'q' quit".to_string(),
        SessionPhase::Saved => match &state.saved_path {
            Some(path) => format!("'r' retake | Saved: {} | 'q' quit", path.display()),
            None => "'r' retake | Saved | 'q' quit".to_string(),
        },
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().fg(Color::White).bg(Color::DarkGray);
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }
        buf.set_stringn(area.x, area.y, self.message, area.width as usize, style);
    }
}
