use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::{
    app::{Mode, ViewState},
    ui::theme::Theme,
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &ViewState) {
    let theme = Theme::default();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    render_input_line(frame, layout[0], state, &theme);
    render_list(frame, layout[1], state, &theme);
}

fn render_input_line(frame: &mut Frame<'_>, area: Rect, state: &ViewState, theme: &Theme) {
    let composing = state.mode == Mode::Compose && state.editing.is_none();
    let (content, style) = if composing {
        (
            format!("{}│", state.input),
            Style::default().fg(theme.accent),
        )
    } else {
        (
            "premi a per aggiungere una nuova attività".to_string(),
            Style::default().fg(theme.dim),
        )
    };

    let border = if composing {
        Style::default().fg(theme.accent)
    } else {
        Style::default().fg(theme.border)
    };
    let block = Block::default()
        .title("Nuova attività")
        .borders(Borders::ALL)
        .border_style(border);

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(content, style))).block(block),
        area,
    );
}

fn render_list(frame: &mut Frame<'_>, area: Rect, state: &ViewState, theme: &Theme) {
    let title = format!("Attività ({})", state.items.len());
    let block = Block::default().borders(Borders::ALL).title(title);

    if state.items.is_empty() {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "Nessuna attività.",
                Style::default().fg(theme.dim),
            )))
            .block(block)
            .alignment(Alignment::Center),
            area,
        );
        return;
    }

    let me = state.account.as_ref();
    let items = state
        .items
        .iter()
        .map(|item| {
            // The row under edit shows the live draft instead of the
            // ledger's content.
            if let Some((_, draft)) = state
                .editing
                .as_ref()
                .filter(|(editing, _)| *editing == item.id)
            {
                return ListItem::new(Line::from(vec![
                    Span::styled("[edit] ", Style::default().fg(theme.accent)),
                    Span::styled(format!("{draft}│"), Style::default().fg(theme.accent)),
                ]));
            }

            let check = if item.completed { "[x]" } else { "[ ]" };
            let owner = if me == Some(&item.creator) {
                "me".to_string()
            } else {
                item.creator.short()
            };
            let content_style = if item.completed {
                Style::default()
                    .fg(theme.dim)
                    .add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default().fg(theme.text)
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{check} "), Style::default().fg(theme.dim)),
                Span::styled(item.content.clone(), content_style),
                Span::styled(format!("  {owner}"), Style::default().fg(theme.dim)),
            ]))
        })
        .collect::<Vec<_>>();

    let mut list_state = ListState::default();
    list_state.select(Some(state.selected));

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("» ");

    frame.render_stateful_widget(list, area, &mut list_state);
}
