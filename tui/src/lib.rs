//! TUI rendering for the sign-in form using ratatui.

mod input;
mod theme;

pub use input::{InputPump, apply_event, handle_events};
pub use theme::{Glyphs, Palette, glyphs, palette, spinner_frame, styles};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph, Wrap},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use signin_engine::{App, AuthClient, Field, FlowPhase, Notification, SigninForm, ValidatorKey};

const CARD_WIDTH: u16 = 56;
const TOAST_HEIGHT: u16 = 4;

/// Main draw function. `tick` advances the spinner.
pub fn draw<A: AuthClient + 'static>(frame: &mut Frame, app: &App<A>, tick: usize) {
    let options = app.ui_options();
    let palette = palette(options);
    let glyphs = glyphs(options);

    let bg_block = Block::default().style(Style::default().bg(palette.bg_dark));
    frame.render_widget(bg_block, frame.area());

    let card = card_area(frame.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title
            Constraint::Length(1), // Email label
            Constraint::Length(3), // Email input
            Constraint::Length(1), // Email error
            Constraint::Length(1), // Password label
            Constraint::Length(3), // Password input
            Constraint::Length(1), // Password error
            Constraint::Length(1), // Submit
            Constraint::Length(1), // Status
            Constraint::Min(0),    // Notification
        ])
        .split(card);

    let title = Paragraph::new(Line::from(Span::styled(
        "Sign in",
        Style::default()
            .fg(palette.text_primary)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(title, chunks[0]);

    draw_field(frame, app, Field::Email, [chunks[1], chunks[2], chunks[3]], &palette, &glyphs);
    draw_field(frame, app, Field::Password, [chunks[4], chunks[5], chunks[6]], &palette, &glyphs);

    let submit = Paragraph::new(Line::from(Span::styled(
        "[ Sign in ]",
        styles::submit(&palette, app.can_submit()),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(submit, chunks[7]);

    draw_status(frame, app, chunks[8], tick, &palette, &glyphs);

    if let Some(notification) = app.notification() {
        draw_notification(frame, notification, chunks[9], &palette, &glyphs);
    }
}

fn card_area(area: Rect) -> Rect {
    let inner = Rect {
        x: area.x.saturating_add(1),
        y: area.y.saturating_add(1),
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    };
    let width = CARD_WIDTH.min(inner.width);
    Rect {
        x: inner.x + (inner.width - width) / 2,
        width,
        ..inner
    }
}

fn draw_field<A: AuthClient + 'static>(
    frame: &mut Frame,
    app: &App<A>,
    field: Field,
    [label_area, input_area, error_area]: [Rect; 3],
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let form = app.form();
    let focused = app.focus() == field;
    let state = form.field(field);
    let invalid = state.touched() && state.is_invalid();

    let marker = if focused { glyphs.focus } else { " " };
    let label = Line::from(vec![
        Span::styled(format!("{marker} "), styles::label(palette, focused)),
        Span::styled(field.label(), styles::label(palette, focused)),
    ]);
    frame.render_widget(Paragraph::new(label), label_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(styles::field_border(palette, focused, invalid))
        .padding(Padding::horizontal(1));
    let inner = block.inner(input_area);

    let raw = form.credentials().value(field).unwrap_or_default();
    let shown = match field {
        Field::Email => raw.to_string(),
        Field::Password => glyphs.mask.to_string().repeat(raw.chars().count()),
    };
    let visible = tail_fitting(&shown, usize::from(inner.width.saturating_sub(1)));
    let text_width = visible.width() as u16;

    let input = Paragraph::new(Span::styled(
        visible,
        Style::default().fg(palette.text_primary),
    ))
    .block(block);
    frame.render_widget(input, input_area);

    if focused && inner.width > 0 && inner.height > 0 {
        frame.set_cursor_position(Position::new(
            inner.x + text_width.min(inner.width - 1),
            inner.y,
        ));
    }

    if let Some(message) = field_error(form, field) {
        let line = Line::from(Span::styled(
            format!("  {} {message}", glyphs.error),
            styles::field_error(palette),
        ));
        frame.render_widget(Paragraph::new(line), error_area);
    }
}

/// The error line under `field`, if it has been touched and fails a validator.
fn field_error(form: &SigninForm, field: Field) -> Option<String> {
    let state = form.field(field);
    if !state.touched() {
        return None;
    }
    // First failure in table order.
    match state.errors().next()? {
        ValidatorKey::Required => Some(format!("{} is required", field.label())),
        ValidatorKey::Email => Some("Enter a valid email address".to_string()),
        // Server errors apply to both fields; shown once, under the password.
        ValidatorKey::Server => match field {
            Field::Email => None,
            Field::Password => form.server_error().map(ToString::to_string),
        },
    }
}

/// Longest suffix of `text` that fits in `max_width` columns.
fn tail_fitting(text: &str, max_width: usize) -> &str {
    if text.width() <= max_width {
        return text;
    }
    let mut width = 0;
    let mut start = text.len();
    for (idx, c) in text.char_indices().rev() {
        let w = c.width().unwrap_or(0);
        if width + w > max_width {
            break;
        }
        width += w;
        start = idx;
    }
    &text[start..]
}

fn draw_status<A: AuthClient + 'static>(
    frame: &mut Frame,
    app: &App<A>,
    area: Rect,
    tick: usize,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let line = if let Some(email) = app.signed_in() {
        Line::from(Span::styled(
            format!("{} Signed in as {email}", glyphs.ok),
            Style::default().fg(palette.success),
        ))
    } else {
        match app.phase() {
            FlowPhase::Idle => Line::from(Span::styled(
                "Enter sign in | Tab switch field | Esc quit",
                Style::default().fg(palette.text_muted),
            )),
            FlowPhase::Validating => Line::from(Span::styled(
                "Validating...",
                Style::default().fg(palette.text_muted),
            )),
            FlowPhase::Authenticating { .. } => {
                let spinner = spinner_frame(tick, app.ui_options());
                let pending = app.in_flight();
                let text = if pending > 1 {
                    format!("{spinner} Signing in... ({pending} pending)")
                } else {
                    format!("{spinner} Signing in...")
                };
                Line::from(Span::styled(text, Style::default().fg(palette.accent)))
            }
            FlowPhase::ErrorDisplayed => Line::from(Span::styled(
                format!("{} Sign in failed. Edit and press Enter to retry", glyphs.error),
                Style::default().fg(palette.warning),
            )),
        }
    };
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_notification(
    frame: &mut Frame,
    notification: &Notification,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    if area.height < 3 {
        return;
    }
    let height = TOAST_HEIGHT.min(area.height);
    let toast = Rect {
        y: area.y + area.height - height,
        height,
        ..area
    };

    let title = notification.title().unwrap_or("Error");
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.error))
        .title(Span::styled(
            format!(" {} {title} ", glyphs.error),
            Style::default()
                .fg(palette.error)
                .add_modifier(Modifier::BOLD),
        ))
        .style(Style::default().bg(palette.bg_panel));
    let body = Paragraph::new(notification.message().to_string())
        .style(Style::default().fg(palette.text_primary))
        .wrap(Wrap { trim: true })
        .block(block);

    frame.render_widget(Clear, toast);
    frame.render_widget(body, toast);
}
