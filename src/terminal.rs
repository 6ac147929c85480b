// SPDX-License-Identifier: GPL-3.0-only

//! Terminal front-end for the capture screen
//!
//! Renders camera frames to the terminal using Unicode half-block characters
//! for improved vertical resolution. Key presses become [`Message`]s for
//! [`CaptureScreen::update`]; the tasks it returns run on a single-threaded
//! runtime and post their results back over a channel.

use crate::app::{Alert, CaptureScreen, Message, SaveStatus, Screen};
use crate::backends::camera::{CameraFrame, Facing, open_capture_device};
use crate::backends::permissions::{Capability, DesktopPermissions, PermissionGateway};
use crate::config::Config;
use crate::constants::timing;
use crate::fl;
use crate::storage::{MediaStore, PhotoLibrary};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use std::io::{self, stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Run the interactive capture screen until the user quits
pub fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    // Open the device before touching the terminal so errors print normally
    let device = open_capture_device(&config)?;

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let gateway: Arc<dyn PermissionGateway> = Arc::new(DesktopPermissions::new(&config));
    let store: Arc<dyn MediaStore> = Arc::new(PhotoLibrary::new(config.photo_library_dir()));
    let (screen, task) = CaptureScreen::new(gateway, device, store);

    let result = runtime.block_on(run_app(&mut terminal, &config, screen, task));

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &Config,
    mut screen: CaptureScreen,
    startup: crate::app::Task,
) -> Result<(), Box<dyn std::error::Error>> {
    let (sender, mut receiver) = mpsc::unbounded_channel::<Message>();
    spawn_task(startup, &sender);

    loop {
        // Results of finished captures, saves and permission requests
        while let Ok(message) = receiver.try_recv() {
            spawn_task(screen.update(message), &sender);
        }

        terminal.draw(|f| draw(f, &screen, config))?;

        while event::poll(Duration::ZERO)? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }

            match map_key(key, View::of(&screen), screen.alert().is_some()) {
                KeyAction::Quit => {
                    info!("Quitting");
                    screen.shutdown();
                    return Ok(());
                }
                KeyAction::Send(message) => spawn_task(screen.update(message), &sender),
                KeyAction::OpenLibrary => open_library(config),
                KeyAction::Ignore => {}
            }
        }

        tokio::time::sleep(timing::FRAME_POLL).await;
    }
}

fn spawn_task(task: crate::app::Task, sender: &mpsc::UnboundedSender<Message>) {
    if let Some(future) = task.into_future() {
        let sender = sender.clone();
        tokio::spawn(async move {
            let message = future.await;
            // The receiver only goes away on quit
            let _ = sender.send(message);
        });
    }
}

fn open_library(config: &Config) {
    let dir = config.photo_library_dir();
    if let Err(e) = open::that_detached(&dir) {
        warn!(dir = %dir.display(), error = %e, "Failed to open photo library");
    }
}

// =============================================================================
// Input
// =============================================================================

/// Coarse screen state that decides what keys mean
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Checking,
    Denied,
    Live,
    Preview,
}

impl View {
    fn of(screen: &CaptureScreen) -> Self {
        match screen.screen() {
            Screen::AwaitingPermissions => View::Checking,
            Screen::PermissionsDenied(_) => View::Denied,
            Screen::Live(_) => View::Live,
            Screen::Preview(_) => View::Preview,
        }
    }
}

#[derive(Debug)]
enum KeyAction {
    Quit,
    Send(Message),
    OpenLibrary,
    Ignore,
}

fn map_key(key: KeyEvent, view: View, alert_shown: bool) -> KeyAction {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return KeyAction::Quit;
    }
    if key.code == KeyCode::Char('q') {
        return KeyAction::Quit;
    }

    // Alerts are modal
    if alert_shown {
        return match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char(' ') => {
                KeyAction::Send(Message::DismissAlert)
            }
            _ => KeyAction::Ignore,
        };
    }

    match (view, key.code) {
        (View::Denied, KeyCode::Char('g') | KeyCode::Enter) => {
            KeyAction::Send(Message::RequestPermissions)
        }
        (View::Live, KeyCode::Char(' ') | KeyCode::Enter) => KeyAction::Send(Message::Capture),
        (View::Live, KeyCode::Char('f')) => KeyAction::Send(Message::ToggleFacing),
        (View::Live, KeyCode::Char('t')) => KeyAction::Send(Message::ToggleTorch),
        (View::Preview, KeyCode::Char('r')) => KeyAction::Send(Message::Retake),
        (View::Preview, KeyCode::Char('s') | KeyCode::Enter) => KeyAction::Send(Message::Save),
        (View::Live | View::Preview, KeyCode::Char('o')) => KeyAction::OpenLibrary,
        _ => KeyAction::Ignore,
    }
}

// =============================================================================
// Drawing
// =============================================================================

fn draw(f: &mut Frame, screen: &CaptureScreen, config: &Config) {
    let [top, body, bottom] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(f.area());

    match screen.screen() {
        Screen::AwaitingPermissions => {
            f.render_widget(centered_text(fl!("permissions-checking")), body);
        }
        Screen::PermissionsDenied(permissions) => {
            let mut lines = Vec::new();
            for capability in permissions.missing() {
                let text = match capability {
                    Capability::Camera => fl!("permission-camera-required"),
                    Capability::MediaLibrary => fl!("permission-media-required"),
                };
                lines.push(Line::from(text));
            }
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                format!("[g] {}", fl!("permission-grant")),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            f.render_widget(
                Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true }),
                vertical_center(body, permissions.missing().len() as u16 + 2),
            );
        }
        Screen::Live(_) | Screen::Preview(_) => {
            let widget = FrameWidget {
                frame: screen.display_frame(),
                mirror: mirrored_view(screen.settings().facing, config.mirror_front),
            };
            f.render_widget(&widget, body);
        }
    }

    f.render_widget(top_bar(screen), top);
    f.render_widget(StatusBar { line: action_bar(screen) }, bottom);

    if let Some(alert) = screen.alert() {
        draw_alert(f, alert, body);
    }
}

fn centered_text(text: String) -> Paragraph<'static> {
    Paragraph::new(text).alignment(Alignment::Center)
}

fn vertical_center(area: Rect, height: u16) -> Rect {
    let height = height.min(area.height);
    Rect {
        x: area.x,
        y: area.y + (area.height - height) / 2,
        width: area.width,
        height,
    }
}

fn top_bar(screen: &CaptureScreen) -> StatusBar<'static> {
    let settings = screen.settings();
    let torch = if settings.torch_enabled {
        fl!("torch-on")
    } else {
        fl!("torch-off")
    };
    let facing = match settings.facing {
        Facing::Front => fl!("facing-front"),
        Facing::Back => fl!("facing-back"),
    };
    StatusBar {
        line: Line::from(format!(" {} | {} | {}", fl!("app-title"), facing, torch)),
    }
}

/// Bottom bar with the actions of the current mode; inactive ones are dimmed
fn action_bar(screen: &CaptureScreen) -> Line<'static> {
    let mut spans = vec![Span::raw(" ")];
    let mut push = |key: &str, label: String, enabled: bool| {
        let style = if enabled {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::Gray).add_modifier(Modifier::DIM)
        };
        spans.push(Span::styled(format!("[{}] {}  ", key, label), style));
    };

    match screen.screen() {
        Screen::Live(live) => {
            let idle = live.is_idle();
            push("Space", fl!("live-capture"), screen.can_capture());
            push("f", fl!("live-flip"), idle);
            let torch = if screen.settings().torch_enabled {
                fl!("torch-off")
            } else {
                fl!("torch-on")
            };
            push("t", torch, idle);
            push("o", fl!("hint-open-library"), true);
        }
        Screen::Preview(preview) => {
            let idle = preview.save.status() == SaveStatus::Idle;
            push("r", fl!("preview-retake"), idle);
            let save = if idle {
                fl!("preview-save")
            } else {
                fl!("preview-saving")
            };
            push("s", save, idle);
            push("o", fl!("hint-open-library"), true);
        }
        Screen::PermissionsDenied(_) => push("g", fl!("permission-grant"), true),
        Screen::AwaitingPermissions => {}
    }
    push("q", fl!("hint-quit"), true);

    Line::from(spans)
}

fn draw_alert(f: &mut Frame, alert: &Alert, area: Rect) {
    let width = area.width.min(60);
    let height = area.height.min(7);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    let border = if alert.is_error() {
        Color::Red
    } else {
        Color::Green
    };

    let mut lines = vec![Line::from(alert.body())];
    if let Some(detail) = alert.detail() {
        lines.push(Line::from(Span::styled(
            detail,
            Style::default().fg(Color::Gray),
        )));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        format!("[Enter] {}", fl!("alert-dismiss")),
        Style::default().add_modifier(Modifier::BOLD),
    )));

    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border))
                    .title(format!(" {} ", alert.title())),
            ),
        popup,
    );
}

/// Whether the feed and the photo previewed from it are shown mirrored
///
/// Preview keeps the live view's orientation; the saved file is never
/// mirrored.
fn mirrored_view(facing: Facing, mirror_front: bool) -> bool {
    facing == Facing::Front && mirror_front
}

/// Widget that renders a camera frame using half-block characters
struct FrameWidget {
    frame: Option<Arc<CameraFrame>>,
    mirror: bool,
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = &self.frame else {
            // No frame yet - show placeholder
            let msg = fl!("live-waiting");
            let x = area.x + (area.width.saturating_sub(msg.chars().count() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        };

        let Some((display_width, display_height)) = fit(frame, area) else {
            return;
        };

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        // Each cell shows two vertical pixels: ▀ in fg over bg
        for ty in 0..display_height {
            for tx in 0..display_width {
                let src_x = (tx as f64 * x_scale) as u32;
                let src_x = if self.mirror {
                    frame.width.saturating_sub(1).saturating_sub(src_x)
                } else {
                    src_x
                };
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(rgb(frame.pixel(src_x, src_y_top)));
                    cell.set_bg(rgb(frame.pixel(src_x, src_y_bottom)));
                }
            }
        }
    }
}

/// Display size in cells that keeps the frame's aspect ratio
fn fit(frame: &CameraFrame, area: Rect) -> Option<(u16, u16)> {
    if area.width == 0 || area.height == 0 {
        return None;
    }

    let frame_aspect = frame.width as f64 / frame.height as f64;
    let term_width = area.width as f64;
    let term_height = (area.height * 2) as f64;

    let (w, h) = if term_width / term_height > frame_aspect {
        (term_height * frame_aspect, term_height / 2.0)
    } else {
        (term_width, term_width / frame_aspect / 2.0)
    };

    let size = ((w as u16).min(area.width), (h as u16).min(area.height));
    (size.0 > 0 && size.1 > 0).then_some(size)
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(r, g, b)
}

/// One-line bar on a dark background
struct StatusBar<'a> {
    line: Line<'a>,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Style::default().bg(Color::DarkGray));
        Paragraph::new(self.line)
            .style(Style::default().fg(Color::White).bg(Color::DarkGray))
            .render(area, buf);
    }
}
