pub mod keymap;
pub mod screens;

mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::{Mode, ViewState};

pub use theme::Theme;

pub fn render(frame: &mut Frame<'_>, state: &ViewState) {
    let area = frame.area();
    if state.account.is_none() {
        screens::connect::render(frame, area, state);
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Info bar
            Constraint::Min(0),    // Item list with input line
            Constraint::Length(1), // Bottom bar
        ])
        .split(area);

    let theme = Theme::default();
    render_info_bar(frame, layout[0], state, &theme);
    screens::items::render(frame, layout[1], state);
    render_bottom_bar(frame, layout[2], state, &theme);
}

fn render_info_bar(frame: &mut Frame<'_>, area: Rect, state: &ViewState, theme: &Theme) {
    let account = state
        .account
        .as_ref()
        .map(|account| account.short())
        .unwrap_or_else(|| "-".to_string());
    let refresh = state
        .last_refresh
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());

    let status = if state.busy {
        Span::styled("SYNC", Style::default().fg(theme.accent))
    } else if state.last_error.is_some() {
        Span::styled("ERR", Style::default().fg(theme.error))
    } else {
        Span::styled("OK", Style::default().fg(theme.positive))
    };

    let mut parts = vec![
        Span::styled("Account", Style::default().fg(theme.dim)),
        Span::raw(format!(": {account}  ")),
        Span::styled("Items", Style::default().fg(theme.dim)),
        Span::raw(format!(": {}  ", state.items.len())),
        Span::styled("Refresh", Style::default().fg(theme.dim)),
        Span::raw(format!(": {refresh}  ")),
        status,
    ];
    if let Some(message) = &state.last_error {
        parts.push(Span::raw("  "));
        parts.push(Span::styled(
            format!("Errore: {message}"),
            Style::default().fg(theme.error),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(parts)), area);
}

fn render_bottom_bar(frame: &mut Frame<'_>, area: Rect, state: &ViewState, theme: &Theme) {
    let hints: &[(&str, &str)] = if state.editing.is_some() {
        &[("Enter", "save"), ("Esc", "cancel")]
    } else if state.mode == Mode::Compose {
        &[("Enter", "add"), ("Esc", "cancel")]
    } else {
        &[
            ("a", "add"),
            ("e", "edit"),
            ("t", "toggle"),
            ("d", "delete"),
            ("w", "wallet"),
            ("r", "refresh"),
            ("q", "quit"),
        ]
    };

    let mut parts = Vec::new();
    for (index, (key, label)) in hints.iter().enumerate() {
        if index > 0 {
            parts.push(Span::raw("  "));
        }
        parts.push(Span::styled(*key, Style::default().fg(theme.accent)));
        parts.push(Span::raw(format!(" {label}")));
    }

    frame.render_widget(Paragraph::new(Line::from(parts)), area);
}
