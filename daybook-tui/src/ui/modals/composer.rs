use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use daybook_types::MAX_POST_LENGTH;

use super::utils::centered_rect;
use crate::app::{App, ComposerField, ComposerMode};
use crate::ui::theme::THEME;

/// New post or schedule entry form, with validation errors under each field
pub fn render_composer_modal(frame: &mut Frame, app: &mut App, area: Rect) {
    let theme = &THEME;
    let Some(composer) = app.composer.as_ref() else {
        return;
    };

    let (title, time_label) = match composer.mode {
        ComposerMode::Post => (" New Post ", "Time block (optional, HH:MM-HH:MM)"),
        ComposerMode::ScheduleEntry => (" New Schedule Entry ", "Time block (HH:MM-HH:MM)"),
    };

    let modal_area = centered_rect(70, 60, area);
    frame.render_widget(Clear, modal_area);

    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
        .title(title)
        .title_alignment(Alignment::Center)
        .style(Style::default().bg(theme.background));
    let inner = outer.inner(modal_area);
    frame.render_widget(outer, modal_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(4),    // Text
            Constraint::Length(1), // Text error
            Constraint::Length(3), // Time block
            Constraint::Length(1), // Time error
            Constraint::Length(1), // Instructions
        ])
        .split(inner);

    let field_style = |field: ComposerField| {
        if composer.focus == field {
            Style::default().fg(theme.primary).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.border)
        }
    };
    let cursor = |field: ComposerField| if composer.focus == field { "_" } else { "" };

    let count = composer.text.trim().chars().count();
    let count_style = if count > MAX_POST_LENGTH {
        Style::default().fg(theme.error)
    } else {
        Style::default().fg(theme.text_dim)
    };
    let text = Paragraph::new(format!("{}{}", composer.text, cursor(ComposerField::Text)))
        .style(Style::default().fg(theme.text))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(field_style(ComposerField::Text))
                .title(" What are you doing? ")
                .title_bottom(Line::from(Span::styled(
                    format!(" {}/{} ", count, MAX_POST_LENGTH),
                    count_style,
                ))),
        );
    frame.render_widget(text, chunks[0]);
    render_field_error(frame, composer.text_error(), chunks[1]);

    let time = Paragraph::new(format!("{}{}", composer.time_block, cursor(ComposerField::TimeBlock)))
        .style(Style::default().fg(theme.text))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(field_style(ComposerField::TimeBlock))
                .title(format!(" {} ", time_label)),
        );
    frame.render_widget(time, chunks[2]);
    render_field_error(frame, composer.time_error(), chunks[3]);

    let instructions = if composer.submitting {
        Span::styled("Sending...", Style::default().fg(theme.warning))
    } else {
        Span::styled(
            "Enter: Submit | Tab: Next field | Esc: Cancel",
            Style::default().fg(theme.text_dim),
        )
    };
    frame.render_widget(
        Paragraph::new(Line::from(instructions)).alignment(Alignment::Center),
        chunks[4],
    );
}

fn render_field_error(frame: &mut Frame, error: Option<&str>, area: Rect) {
    if let Some(error) = error {
        let line = Paragraph::new(Span::styled(
            format!(" ✗ {}", error),
            Style::default().fg(THEME.error),
        ));
        frame.render_widget(line, area);
    }
}
