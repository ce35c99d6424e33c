use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::Span,
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use crate::{app::ViewState, ui::theme::Theme};

/// Calculates a centered rect for the connect box
fn centered_box(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(vertical[1]);

    horizontal[1]
}

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &ViewState) {
    let theme = Theme::default();

    let box_width = 46;
    let box_height = 5;
    let card_area = centered_box(box_width, box_height, area);

    frame.render_widget(Clear, card_area);

    let block = Block::default()
        .title(" taccuino ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border));

    let inner = block.inner(card_area);
    frame.render_widget(block, card_area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Status line
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Key hints
        ])
        .margin(1)
        .split(inner);

    let status = if state.busy {
        Span::styled("Connessione al wallet…", Style::default().fg(theme.accent))
    } else if state.last_error.is_some() {
        Span::styled("Wallet non collegato.", Style::default().fg(theme.error))
    } else {
        Span::styled("In attesa del wallet…", Style::default().fg(theme.text))
    };
    frame.render_widget(Paragraph::new(status).alignment(Alignment::Center), rows[0]);

    let hints = Span::styled(
        "r riprova   w cambia account   q esci",
        Style::default().fg(theme.dim),
    );
    frame.render_widget(Paragraph::new(hints).alignment(Alignment::Center), rows[2]);

    // Error message below the box (only shown when there's an error)
    if let Some(message) = &state.last_error {
        let y = card_area.y + card_area.height + 1;
        if y < area.y + area.height {
            let error_area = Rect {
                x: card_area.x,
                y,
                width: card_area.width,
                height: 1,
            };
            frame.render_widget(
                Paragraph::new(Span::styled(
                    format!("Errore: {message}"),
                    Style::default().fg(theme.error),
                ))
                .alignment(Alignment::Center),
                error_area,
            );
        }
    }
}
