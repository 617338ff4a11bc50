pub mod theme;
mod formatting;
mod modals;
mod tabs;

use ratatui::{
    layout::Alignment,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, Screen};
use self::tabs::{render_auth_screen, render_main_screen, render_username_prompt};
use self::theme::THEME;

const MIN_WIDTH: u16 = 60;
const MIN_HEIGHT: u16 = 20;

/// Render the UI
pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    frame.render_widget(Clear, area);
    frame.render_widget(Block::default().style(Style::default().bg(THEME.background)), area);

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let warning = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Terminal Too Small",
                Style::default().fg(THEME.error).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                format!("Minimum size: {}x{}", MIN_WIDTH, MIN_HEIGHT),
                Style::default().fg(THEME.text),
            )),
            Line::from(Span::styled(
                format!("Current size: {}x{}", area.width, area.height),
                Style::default().fg(THEME.warning),
            )),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(THEME.error)),
        );
        frame.render_widget(warning, area);
        return;
    }

    match app.screen {
        Screen::Auth => render_auth_screen(frame, app),
        Screen::UsernamePrompt => render_username_prompt(frame, app),
        Screen::Main => render_main_screen(frame, app),
    }

    if app.show_help {
        modals::render_help_modal(frame, app, area);
    }
}

/// Shown while the saved session is checked
pub fn render_loading(frame: &mut Frame, attempt: u32) {
    let area = frame.area();
    frame.render_widget(Clear, area);
    let message = if attempt == 0 {
        "⟳ Loading...".to_string()
    } else {
        format!("⟳ Still loading, retrying ({})...", attempt)
    };
    let loading = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            message,
            Style::default().fg(THEME.warning).add_modifier(Modifier::BOLD),
        )),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title(" Daybook "));
    frame.render_widget(loading, area);
}
