//! Screen layout and drawing.
//!
//! ```text
//! ┌ header: status · messages · cost ┐
//! │ messages (scrollable)            │
//! │ tool panel (while tools run)     │
//! │ typing indicator + timer         │
//! │ toast                            │
//! └ input ───────────────────────────┘
//! ```

use super::input::InputBuffer;
use super::spinner::Spinner;
use crate::chat::{ChatApp, ChatMessage, MessageRole, Modal, TimerBand};
use crate::connection::ConnectionState;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use tokio::time::Instant;

const MAX_INPUT_LINES: u16 = 6;

/// UI-only state that does not belong in [`ChatApp`].
pub struct ViewState {
    pub input: InputBuffer,
    /// Lines scrolled up from the bottom; 0 follows new output.
    pub scroll_from_bottom: u16,
    pub spinner: Spinner,
    pub started: Instant,
}

impl ViewState {
    pub fn new(now: Instant) -> Self {
        Self {
            input: InputBuffer::new(),
            scroll_from_bottom: 0,
            spinner: Spinner::default(),
            started: now,
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(lines);
    }
}

pub fn draw(frame: &mut Frame, app: &ChatApp, view: &mut ViewState, now: Instant) {
    let spin = view.spinner.frame_at(now.saturating_duration_since(view.started));

    let tools_height = if app.tools().is_visible() {
        app.tools().active_tools().len().max(1) as u16 + 2
    } else {
        0
    };
    let typing_height = u16::from(app.is_typing());
    let toast_height = u16::from(app.toast().is_some());
    let input_height = (view.input.line_count() as u16).clamp(1, MAX_INPUT_LINES) + 2;

    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(tools_height),
        Constraint::Length(typing_height),
        Constraint::Length(toast_height),
        Constraint::Length(input_height),
    ])
    .split(frame.area());

    frame.render_widget(header(app), chunks[0]);
    draw_messages(frame, app, view, chunks[1]);
    if tools_height > 0 {
        frame.render_widget(tool_panel(app, spin), chunks[2]);
    }
    if typing_height > 0 {
        frame.render_widget(typing_indicator(app, spin, now), chunks[3]);
    }
    if let Some(toast) = app.toast() {
        frame.render_widget(
            Paragraph::new(toast.message.as_str()).style(Style::default().fg(Color::Green)),
            chunks[4],
        );
    }
    draw_input(frame, app, view, chunks[5]);

    if let Some(modal) = app.modal() {
        draw_modal(frame, modal);
    }
}

fn header(app: &ChatApp) -> Paragraph<'static> {
    let (dot, status, color) = match app.connection_state() {
        ConnectionState::Connected => ("●", "Connected", Color::Green),
        ConnectionState::Disconnected => ("○", "Disconnected", Color::Red),
    };
    let conversation = app.conversation();
    Paragraph::new(Line::from(vec![
        Span::styled(format!("{} {}", dot, status), Style::default().fg(color)),
        Span::raw("  │  "),
        Span::raw(format!("{} messages", conversation.message_count)),
        Span::raw("  │  "),
        Span::styled(
            format!("${:.4}", conversation.total_cost),
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .style(Style::default().add_modifier(Modifier::BOLD))
}

fn message_lines(message: &ChatMessage) -> Vec<Line<'static>> {
    let label_style = match message.role {
        MessageRole::User => Style::default().fg(Color::Cyan),
        MessageRole::Assistant => Style::default().fg(Color::Magenta),
        MessageRole::Error => Style::default().fg(Color::Red),
    }
    .add_modifier(Modifier::BOLD);

    let mut lines = vec![Line::from(vec![
        Span::styled(message.role.label(), label_style),
        Span::styled(
            format!("  {}", message.time_label()),
            Style::default().fg(Color::DarkGray),
        ),
    ])];

    if let Some(thinking) = &message.thinking {
        lines.push(Line::from(Span::styled(
            format!("💭 Thinking: {}", thinking),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    let body_style = if message.role == MessageRole::Error {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    };
    lines.extend(
        message
            .rendered
            .lines
            .iter()
            .cloned()
            .map(|line| line.patch_style(body_style)),
    );

    if message.role == MessageRole::Assistant && message.finalized {
        let blocks = message.code_blocks().len();
        let hint = if blocks > 0 {
            format!("/copy to copy · /copy 1..{} for code", blocks)
        } else {
            "/copy to copy".to_string()
        };
        lines.push(Line::from(Span::styled(
            hint,
            Style::default().fg(Color::DarkGray),
        )));
    }

    lines.push(Line::default());
    lines
}

fn draw_messages(frame: &mut Frame, app: &ChatApp, view: &mut ViewState, area: Rect) {
    let lines: Vec<Line<'static>> = app
        .conversation()
        .messages
        .iter()
        .flat_map(message_lines)
        .collect();

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    let total = paragraph.line_count(area.width) as u16;
    let max_scroll = total.saturating_sub(area.height);
    view.scroll_from_bottom = view.scroll_from_bottom.min(max_scroll);
    let top = max_scroll - view.scroll_from_bottom;

    frame.render_widget(paragraph.scroll((top, 0)), area);
}

fn tool_panel(app: &ChatApp, spin: &str) -> Paragraph<'static> {
    let lines: Vec<Line<'static>> = app
        .tools()
        .active_tools()
        .iter()
        .map(|tool| {
            Line::from(vec![
                Span::raw(format!("{} ", tool.icon())),
                Span::styled(tool.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(format!("  {} ", tool.description)),
                Span::styled(spin.to_string(), Style::default().fg(Color::Magenta)),
            ])
        })
        .collect();

    Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta))
            .title(format!(
                " 🔧 Using tools {} · {} used ",
                spin,
                app.tools().history().len()
            )),
    )
}

fn typing_indicator(app: &ChatApp, spin: &str, now: Instant) -> Paragraph<'static> {
    let mut spans = vec![Span::styled(
        format!("{} Assistant is typing ", spin),
        Style::default().fg(Color::DarkGray),
    )];
    if let Some((elapsed, band)) = app.timer().display(now) {
        let color = match band {
            TimerBand::Fast => Color::Green,
            TimerBand::Slow => Color::Yellow,
            TimerBand::VerySlow => Color::Red,
        };
        spans.push(Span::styled(elapsed, Style::default().fg(color)));
    }
    Paragraph::new(Line::from(spans))
}

fn draw_input(frame: &mut Frame, app: &ChatApp, view: &ViewState, area: Rect) {
    let enabled = app.input_enabled();
    let border = if enabled { Color::Cyan } else { Color::DarkGray };
    let title = if enabled {
        " Message (Enter to send, Alt+Enter for newline, /help) "
    } else {
        " Waiting for response... "
    };

    let inner_height = area.height.saturating_sub(2);
    let (line, column) = view.input.cursor_position();
    let scroll = (line as u16).saturating_sub(inner_height.saturating_sub(1));

    let input = Paragraph::new(view.input.text().to_string())
        .scroll((scroll, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .title(title),
        );
    frame.render_widget(input, area);

    if app.modal().is_none() {
        frame.set_cursor_position((
            area.x + 1 + column as u16,
            area.y + 1 + line as u16 - scroll,
        ));
    }
}

fn draw_modal(frame: &mut Frame, modal: &Modal) {
    let (title, body, hint) = match modal {
        Modal::Alert(message) => (" Notice ", message.as_str(), "Enter to close"),
        Modal::Confirm { prompt, .. } => (" Confirm ", prompt.as_str(), "y / n"),
        Modal::Help(text) => (" Help ", text.as_str(), "Enter to close"),
    };

    let mut lines: Vec<Line> = body.lines().map(Line::raw).collect();
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        hint,
        Style::default().fg(Color::DarkGray),
    )));

    let height = lines.len() as u16 + 2;
    let area = centered(frame.area(), 60, height);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(title),
        ),
        area,
    );
}

/// Rect of at most `width` x `height` centered in `area`.
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
