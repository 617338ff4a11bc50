use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::utils::centered_rect;
use crate::app::{App, Screen, Tab};
use crate::ui::theme::THEME;

type Shortcuts = Vec<(&'static str, Vec<(&'static str, &'static str)>)>;

pub fn render_help_modal(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &THEME;
    let modal_area = centered_rect(80, 85, area);
    frame.render_widget(Clear, modal_area);

    let mut lines = vec![Line::from("")];
    for (category, items) in get_shortcuts_for_context(app) {
        lines.push(Line::from(Span::styled(
            category,
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        )));
        for (key, description) in items {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<15}", key), Style::default().fg(theme.success)),
                Span::styled(description, Style::default().fg(theme.text)),
            ]));
        }
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        "Press ? or Esc to close",
        Style::default().fg(theme.text_dim),
    )));

    let help = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
                .title(" Keyboard Shortcuts ")
                .title_alignment(Alignment::Center)
                .style(Style::default().bg(theme.background)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(help, modal_area);
}

/// Shortcut groups relevant to what is on screen
pub fn get_shortcuts_for_context(app: &App) -> Shortcuts {
    match app.screen {
        Screen::Auth => vec![(
            "Sign in",
            vec![
                ("Enter", "Log in or register"),
                ("Tab", "Switch between log in and register"),
                ("Esc", "Quit"),
            ],
        )],
        Screen::UsernamePrompt => vec![(
            "Username",
            vec![("Enter", "Save username"), ("Esc", "Log out")],
        )],
        Screen::Main => {
            let mut shortcuts: Shortcuts = vec![(
                "Everywhere",
                vec![
                    ("Tab/Shift+Tab", "Next/previous tab"),
                    ("j/k or ↑/↓", "Move selection"),
                    ("r", "Refresh"),
                    ("n", "New post or schedule entry"),
                    ("/", "Find people"),
                    ("Shift+L", "Log out"),
                    ("Shift+D", "Delete account"),
                    ("q", "Quit"),
                ],
            )];
            shortcuts.push(match app.current_tab {
                Tab::Requests => (
                    "Requests",
                    vec![
                        ("a", "Accept request"),
                        ("x", "Reject request"),
                        ("u", "Unfollow"),
                    ],
                ),
                Tab::Schedule => (
                    "Schedule",
                    vec![("d", "Delete entry"), ("[ / ]", "Previous/next day")],
                ),
                _ => (
                    "Feed",
                    vec![
                        ("l", "Like or unlike"),
                        ("c", "Mark your post completed"),
                        ("d", "Delete your post"),
                    ],
                ),
            });
            shortcuts
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_shortcuts_follow_the_tab() {
        let mut app = App::new(Arc::new(crate::api::ApiClient::default()));
        app.screen = Screen::Main;
        app.current_tab = Tab::Requests;
        let shortcuts = get_shortcuts_for_context(&app);
        assert_eq!(shortcuts.last().map(|(name, _)| *name), Some("Requests"));

        app.current_tab = Tab::World;
        let shortcuts = get_shortcuts_for_context(&app);
        assert!(shortcuts[1].1.iter().any(|(key, _)| *key == "l"));
    }
}
