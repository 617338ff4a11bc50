use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::utils::centered_rect;
use crate::ui::theme::THEME;

pub fn render_delete_account_modal(frame: &mut Frame, area: Rect) {
    let theme = &THEME;
    let modal_area = centered_rect(50, 30, area);
    frame.render_widget(Clear, modal_area);

    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Delete your account?",
            Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Your posts, likes, follows and schedule go with it. This cannot be undone.",
            Style::default().fg(theme.text),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "y: Delete | any other key: Cancel",
            Style::default().fg(theme.text_dim),
        )),
    ];

    let modal = Paragraph::new(content)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.error).add_modifier(Modifier::BOLD))
                .title(" Confirm ")
                .title_alignment(Alignment::Center)
                .style(Style::default().bg(theme.background)),
        );
    frame.render_widget(modal, modal_area);
}
