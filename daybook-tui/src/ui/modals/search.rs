use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};

use daybook_types::FollowStatus;

use super::utils::centered_rect;
use crate::app::App;
use crate::ui::theme::THEME;

/// User search. Enter on fresh results follows the highlighted user.
pub fn render_search_modal(frame: &mut Frame, app: &mut App, area: Rect) {
    let theme = &THEME;
    let modal_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, modal_area);

    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
        .title(" Find People ")
        .title_alignment(Alignment::Center)
        .style(Style::default().bg(theme.background));
    let inner = outer.inner(modal_area);
    frame.render_widget(outer, modal_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    // Follow status of each result, from the outgoing list
    let outgoing = &app.requests.outgoing;
    let status_of = |id: uuid::Uuid| {
        outgoing
            .iter()
            .find(|e| e.followee_id == id)
            .map(|e| e.status)
    };

    let Some(search) = app.search.as_mut() else {
        return;
    };

    let input = Paragraph::new(format!("{}_", search.query))
        .style(Style::default().fg(theme.text))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.primary))
                .title(" Username "),
        );
    frame.render_widget(input, chunks[0]);

    if search.loading {
        frame.render_widget(
            Paragraph::new(Span::styled("⟳ Searching...", Style::default().fg(theme.warning)))
                .alignment(Alignment::Center),
            chunks[1],
        );
    } else if let Some(error) = &search.error {
        frame.render_widget(
            Paragraph::new(Span::styled(error.clone(), Style::default().fg(theme.error)))
                .alignment(Alignment::Center),
            chunks[1],
        );
    } else if search.last_query.is_some() && search.results.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled("No one by that name", Style::default().fg(theme.text_dim)))
                .alignment(Alignment::Center),
            chunks[1],
        );
    } else {
        let items: Vec<ListItem> = search
            .results
            .iter()
            .map(|user| {
                let badge = match status_of(user.id) {
                    Some(FollowStatus::Accepted) => Span::styled(" following", Style::default().fg(theme.success)),
                    Some(FollowStatus::Pending) => Span::styled(" requested", Style::default().fg(theme.warning)),
                    _ => Span::raw(""),
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("@{}", user.username), Style::default().fg(theme.primary)),
                    badge,
                ]))
            })
            .collect();
        let list = List::new(items)
            .highlight_style(Style::default().bg(theme.highlight_bg).add_modifier(Modifier::BOLD))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, chunks[1], &mut search.list_state);
    }

    let hint = if search.last_query.as_deref() == Some(search.query.as_str()) && !search.results.is_empty() {
        "Enter: Follow | ↑/↓: Move | Esc: Close"
    } else {
        "Enter: Search | Esc: Close"
    };
    frame.render_widget(
        Paragraph::new(Span::styled(hint, Style::default().fg(theme.text_dim))).alignment(Alignment::Center),
        chunks[2],
    );
}
