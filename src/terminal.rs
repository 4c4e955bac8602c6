// SPDX-License-Identifier: GPL-3.0-only

//! Terminal-based scanner view
//!
//! Renders the camera preview with Unicode half-block characters, shows the
//! controller's code and status labels below it and pops up its alerts.

use crate::backends::camera::types::{CameraFrame, PreviewReceiver, SessionId};
use crate::constants::timing;
use crate::controller::{Alert, ScanController};
use crate::recognition::FrameRegion;

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
use std::sync::Arc;
use tracing::info;

/// Run the terminal scanner until the user quits
pub fn run(
    controller: ScanController,
    show_preview: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, controller, show_preview);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Follows the preview channel of whichever session is running
#[derive(Default)]
struct PreviewTracker {
    session: Option<SessionId>,
    receiver: Option<PreviewReceiver>,
}

impl PreviewTracker {
    fn update(&mut self, controller: &ScanController, widget: &mut FrameWidget) {
        let session = controller.scanner().session_id();
        if session != self.session {
            self.session = session;
            self.receiver = controller.scanner().preview_receiver();
            widget.clear();
        }

        if let Some(receiver) = self.receiver.as_mut()
            && receiver.has_changed().unwrap_or(false)
            && let Some(frame) = receiver.borrow_and_update().clone()
        {
            widget.update_frame(frame);
        }
        widget.set_highlight(controller.scanner().scanned_code().map(|code| code.bounds));
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut controller: ScanController,
    show_preview: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut frame_widget = FrameWidget::new();
    let mut preview = PreviewTracker::default();

    controller.view_did_appear();

    loop {
        controller.pump();
        if show_preview {
            preview.update(&controller, &mut frame_widget);
        }

        terminal.draw(|f| {
            let area = f.area();
            let [camera_area, code_area, status_area, help_area] = split_rows(area);

            if show_preview {
                f.render_widget(&frame_widget, camera_area);
            }
            f.render_widget(
                LabelLine {
                    text: controller.code_text(),
                    style: Style::default().fg(Color::Green),
                },
                code_area,
            );
            f.render_widget(
                LabelLine {
                    text: controller.status_text(),
                    style: Style::default(),
                },
                status_area,
            );
            f.render_widget(
                StatusBar {
                    message: &build_help_message(controller.is_capturing()),
                },
                help_area,
            );
            if let Some(alert) = controller.alert() {
                f.render_widget(AlertPopup { alert }, area);
            }
        })?;

        if event::poll(timing::UI_POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }

            // Any other key is swallowed while an alert is open
            if controller.alert().is_some() {
                if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                    controller.take_alert();
                }
                continue;
            }

            match key.code {
                KeyCode::Char('p') => {
                    controller.toggle_capture();
                }
                KeyCode::Char('s') => {
                    let position = controller.cycle_camera_position();
                    info!(position = %position, "Camera position changed from terminal");
                }
                KeyCode::Char('q') => break,
                _ => {}
            }
        }
    }

    controller.view_did_disappear();
    Ok(())
}

/// Camera area plus one row each for the code, status and key help
fn split_rows(area: Rect) -> [Rect; 4] {
    let footer = 3.min(area.height);
    let camera_height = area.height - footer;
    let row = |offset: u16| Rect {
        x: area.x,
        y: area.y + camera_height + offset,
        width: area.width,
        height: u16::from(offset < footer),
    };

    [
        Rect {
            height: camera_height,
            ..area
        },
        row(0),
        row(1),
        row(2),
    ]
}

fn build_help_message(capturing: bool) -> String {
    let toggle = if capturing { "'p' pause" } else { "'p' resume" };
    format!("{} | 's' switch camera | 'q' quit", toggle)
}

struct FrameWidget {
    frame: Option<Arc<CameraFrame>>,
    /// Last scanned code, outlined over the preview
    highlight: Option<FrameRegion>,
}

impl FrameWidget {
    fn new() -> Self {
        Self {
            frame: None,
            highlight: None,
        }
    }

    fn update_frame(&mut self, frame: Arc<CameraFrame>) {
        self.frame = Some(frame);
    }

    fn set_highlight(&mut self, region: Option<FrameRegion>) {
        self.highlight = region;
    }

    fn clear(&mut self) {
        self.frame = None;
        self.highlight = None;
    }
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let frame = match &self.frame {
            Some(frame) if frame.width > 0 && frame.height > 0 => frame,
            _ => {
                let msg = "Waiting for camera...";
                let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
                let y = area.y + area.height / 2;
                if y < area.y + area.height && x < area.x + area.width {
                    buf.set_string(x, y, msg, Style::default());
                }
                return;
            }
        };

        // Each terminal cell displays 2 vertical pixels using half-block characters
        let frame_aspect = frame.width as f64 / frame.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            let h = term_height;
            ((h * frame_aspect) as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            (w as u16, (w / frame_aspect / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        for ty in 0..display_height {
            for tx in 0..display_width {
                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(sample_pixel(frame, src_x, src_y_top));
                    cell.set_bg(sample_pixel(frame, src_x, src_y_bottom));
                }
            }
        }

        if let Some(region) = &self.highlight {
            let display = Rect::new(x_offset, y_offset, display_width, display_height);
            outline_region(region, display, buf);
        }
    }
}

/// Draw the border of a normalized `region` of the picture shown in `display`
fn outline_region(region: &FrameRegion, display: Rect, buf: &mut Buffer) {
    let to_cells = |fraction: f32, extent: u16| {
        ((fraction.clamp(0.0, 1.0) * extent as f32) as u16).min(extent.saturating_sub(1))
    };
    let left = display.x + to_cells(region.x, display.width);
    let top = display.y + to_cells(region.y, display.height);
    let right = display.x + to_cells(region.x + region.width, display.width);
    let bottom = display.y + to_cells(region.y + region.height, display.height);

    for y in top..=bottom {
        for x in left..=right {
            if (x == left || x == right || y == top || y == bottom)
                && let Some(cell) = buf.cell_mut((x, y))
            {
                cell.set_fg(Color::Green);
                cell.set_bg(Color::Green);
            }
        }
    }
}

fn sample_pixel(frame: &CameraFrame, x: u32, y: u32) -> Color {
    let (r, g, b) = frame.rgb_at(x, y);
    Color::Rgb(r, g, b)
}

/// Single centred line of text
struct LabelLine<'a> {
    text: &'a str,
    style: Style,
}

impl Widget for LabelLine<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        let text = truncate(self.text, area.width as usize);
        let width = text.chars().count() as u16;
        let x = area.x + area.width.saturating_sub(width) / 2;
        buf.set_string(x, area.y, text, self.style);
    }
}

struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        buf.set_string(
            area.x,
            area.y,
            truncate(self.message, area.width as usize),
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}

/// Centred modal box for a controller alert
struct AlertPopup<'a> {
    alert: &'a Alert,
}

impl Widget for AlertPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = area.width.min(50);
        let height = area.height.min(6);
        let popup = Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + (area.height - height) / 2,
            width,
            height,
        };

        Clear.render(popup, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.alert.title.as_str())
            .style(Style::default().fg(Color::Red));
        Paragraph::new(format!("{}\n\n[Enter] OK", self.alert.message))
            .block(block)
            .wrap(Wrap { trim: true })
            .render(popup, buf);
    }
}

/// Prefix of `text` at most `max_chars` characters long
fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
