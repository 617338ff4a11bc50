use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use daybook_types::{FeedScope, FollowStatus};

use super::formatting::*;
use super::modals::*;
use super::theme::{ThemeColors, THEME};
use crate::app::{App, AuthMode, NoticeLevel, Tab};

const LOGO_LINES: &[&str] = &[
    "  ___               _              _   ",
    " |   \\ __ _ _  _   | |__  ___  ___| |__",
    " | |) / _` | || |  | '_ \\/ _ \\/ _ \\ / /",
    " |___/\\__,_|\\_, |  |_.__/\\___/\\___/_\\_\\",
    "            |__/                        ",
];

pub fn render_auth_screen(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    let theme = &THEME;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
        .split(area);

    let header = Paragraph::new("Daybook - Self, Friends, World")
        .style(Style::default().fg(theme.text).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, chunks[0]);

    let mut lines = vec![Line::from("")];
    for logo_line in LOGO_LINES {
        lines.push(Line::from(Span::styled(
            *logo_line,
            Style::default().fg(theme.primary).add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(""));

    let (title, other) = match app.auth.mode {
        AuthMode::Login => ("Log in", "register"),
        AuthMode::Register => ("Create an account", "log in"),
    };
    lines.push(Line::from(Span::styled(
        title,
        Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Email: ", Style::default().fg(theme.text_dim)),
        Span::styled(
            format!("{}_", app.auth.email),
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        ),
    ]));
    lines.push(Line::from(""));

    if app.auth.loading {
        lines.push(Line::from(Span::styled("Signing in...", Style::default().fg(theme.warning))));
    } else if let Some(error) = &app.auth.error {
        lines.push(Line::from(Span::styled(error.clone(), Style::default().fg(theme.error))));
    }
    if let Some(notice) = &app.notice {
        lines.push(Line::from(Span::styled(
            notice.message.clone(),
            Style::default().fg(notice_color(notice.level, theme)),
        )));
    }

    let body = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(body, chunks[1]);

    let footer = Paragraph::new(format!("Enter: Continue | Tab: Switch to {} | Esc: Quit", other))
        .style(Style::default().fg(theme.text_dim))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(theme.border)));
    frame.render_widget(footer, chunks[2]);
}

pub fn render_username_prompt(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    let theme = &THEME;
    let modal_area = centered_rect(60, 40, area);
    frame.render_widget(Clear, modal_area);

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Pick a username",
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "3-20 letters, digits or underscores. Friends find you by it.",
            Style::default().fg(theme.text_dim),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("@{}_", app.username_prompt.input),
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    if app.username_prompt.submitting {
        lines.push(Line::from(Span::styled("Saving...", Style::default().fg(theme.warning))));
    } else if let Some(error) = &app.username_prompt.error {
        lines.push(Line::from(Span::styled(error.clone(), Style::default().fg(theme.error))));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter: Save | Esc: Log out",
        Style::default().fg(theme.text_dim),
    )));

    let prompt = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.accent))
                .title(" Welcome ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(prompt, modal_area);
}

pub fn render_main_screen(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab header
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Page actions
            Constraint::Length(3), // Status bar
        ])
        .split(area);

    render_tab_header(frame, app, chunks[0]);

    match app.current_tab {
        Tab::Requests => render_requests_tab(frame, app, chunks[1]),
        Tab::Schedule => render_schedule_tab(frame, app, chunks[1]),
        tab => {
            if let Some(scope) = tab.scope() {
                render_feed_tab(frame, app, scope, chunks[1]);
            }
        }
    }

    render_page_actions(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Modals, bottom to top
    if app.search.is_some() {
        render_search_modal(frame, app, area);
    }
    if app.composer.is_some() {
        render_composer_modal(frame, app, area);
    }
    if app.confirm_delete_account {
        render_delete_account_modal(frame, area);
    }
}

pub fn render_tab_header(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &THEME;

    let mut spans = vec![];
    for (i, tab) in Tab::ALL.iter().enumerate() {
        let style = if *tab == app.current_tab {
            Style::default()
                .fg(theme.success)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(theme.text_dim)
        };
        let label = match tab {
            Tab::Requests if pending_incoming(app) > 0 => {
                format!(" {} ({}) ", tab.title(), pending_incoming(app))
            }
            _ => format!(" {} ", tab.title()),
        };
        spans.push(Span::styled(label, style));
        if i < Tab::ALL.len() - 1 {
            spans.push(Span::raw(" | "));
        }
    }

    let who = app
        .current_user
        .as_ref()
        .map(|u| format!(" @{} ", u.display_name()))
        .unwrap_or_default();

    let header = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border))
                .title(Span::styled(who, Style::default().fg(theme.primary))),
        );
    frame.render_widget(header, area);
}

fn pending_incoming(app: &App) -> usize {
    app.requests.incoming.iter().filter(|e| e.is_pending()).count()
}

pub fn get_action_bar_text(app: &App) -> &'static str {
    if app.composer.is_some() || app.search.is_some() || app.confirm_delete_account {
        return "";
    }
    match app.current_tab {
        Tab::Self_ => "l: Like | c: Complete | d: Delete | n: New post | r: Refresh",
        Tab::Friends | Tab::World => "l: Like | n: New post | /: Find people | r: Refresh",
        Tab::Requests => "a: Accept | x: Reject | u: Unfollow | /: Find people | r: Refresh",
        Tab::Schedule => "n: Add entry | d: Delete | [/]: Previous/next day | r: Refresh",
    }
}

pub fn render_page_actions(frame: &mut Frame, app: &App, area: Rect) {
    let widget = Paragraph::new(get_action_bar_text(app))
        .style(Style::default().fg(THEME.text).bg(THEME.background))
        .alignment(Alignment::Center);
    frame.render_widget(widget, area);
}

/// The notice if one is up, otherwise the global shortcuts
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &THEME;
    frame.render_widget(Clear, area);

    let (text, style) = match &app.notice {
        Some(notice) => (
            notice.message.clone(),
            Style::default()
                .fg(notice_color(notice.level, theme))
                .add_modifier(Modifier::BOLD),
        ),
        None => (
            "Tab/Shift+Tab: Switch | j/k: Move | ?: Help | Shift+L: Logout | Shift+D: Delete account | q: Quit"
                .to_string(),
            Style::default().fg(theme.text_dim),
        ),
    };

    let footer = Paragraph::new(text)
        .style(style.bg(theme.background))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(theme.border)));
    frame.render_widget(footer, area);
}

fn notice_color(level: NoticeLevel, theme: &ThemeColors) -> ratatui::style::Color {
    match level {
        NoticeLevel::Info => theme.success,
        NoticeLevel::Error => theme.error,
    }
}

fn message_block(lines: Vec<Line<'static>>, title: String, frame: &mut Frame, area: Rect) {
    let widget = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(widget, area);
}

fn create_error_display(error_message: &str, theme: &ThemeColors) -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(Span::styled(
            error_message.to_string(),
            Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("Press r to try again", Style::default().fg(theme.text_dim))),
    ]
}

fn create_loading_display(message: &str, theme: &ThemeColors) -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("⟳ {}", message),
            Style::default().fg(theme.warning).add_modifier(Modifier::BOLD),
        )),
    ]
}

fn create_empty_display(headline: &str, hint: &str, theme: &ThemeColors) -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(Span::styled(
            headline.to_string(),
            Style::default().fg(theme.warning).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(hint.to_string(), Style::default().fg(theme.text_dim))),
    ]
}

pub fn render_feed_tab(frame: &mut Frame, app: &mut App, scope: FeedScope, area: Rect) {
    let theme = &THEME;
    let title = format!(" {} ", scope.title());
    let my_id = app.current_user.as_ref().map(|u| u.id);

    let Some(feed) = app.feeds.get(&scope) else {
        message_block(create_loading_display("Loading posts...", theme), title, frame, area);
        return;
    };

    if let Some(error) = &feed.error {
        if feed.posts.is_empty() {
            message_block(create_error_display(error, theme), title, frame, area);
            return;
        }
    }
    if feed.posts.is_empty() {
        let lines = if feed.loading || !feed.loaded {
            create_loading_display("Loading posts...", theme)
        } else {
            let hint = match scope {
                FeedScope::Self_ => "Press n to share what you're up to",
                FeedScope::Friends => "Press / to find people to follow",
                FeedScope::World => "Press n to write the first post",
            };
            create_empty_display("No posts yet", hint, theme)
        };
        message_block(lines, title, frame, area);
        return;
    }

    let post_width = area.width.saturating_sub(BORDER_PADDING) as usize;
    let selected = feed.list_state.selected();
    let last = feed.posts.len() - 1;

    let items: Vec<ListItem> = feed
        .posts
        .iter()
        .enumerate()
        .map(|(i, post)| {
            let is_selected = selected == Some(i);
            let header_style = if is_selected {
                Style::default().fg(theme.success).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.primary)
            };
            let prefix = if is_selected { "▶ " } else { "  " };
            let author = post.author_username.clone().unwrap_or_else(|| "someone".to_string());

            let mut header = vec![
                Span::styled(prefix, header_style),
                Span::styled(format!("@{}", author), header_style),
                Span::raw(" • "),
                Span::styled(format_timestamp(&post.created_at), Style::default().fg(theme.text_dim)),
            ];
            if let Some((start, end)) = post.time_block() {
                header.push(Span::raw(" • "));
                header.push(Span::styled(
                    format_time_block(start, end),
                    Style::default().fg(theme.secondary),
                ));
            }
            if app.inflight.contains(&post.id) {
                header.push(Span::styled(" ⟳", Style::default().fg(theme.warning)));
            }

            let mut lines = vec![Line::from(header)];
            lines.extend(format_post_content(&post.content, is_selected, theme, post_width));

            let like_style = if post.liked_by_user {
                Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.text_dim)
            };
            let heart = if post.liked_by_user { "♥" } else { "♡" };
            let mut footer = vec![
                Span::raw("  "),
                Span::styled(format!("{} {}", heart, post.likes_count), like_style),
            ];
            if post.completed {
                footer.push(Span::styled("  ✓ done", Style::default().fg(theme.success)));
            } else if my_id == Some(post.author_id) && post.time_block().is_some() {
                footer.push(Span::styled("  ○ open", Style::default().fg(theme.text_dim)));
            }
            lines.push(Line::from(footer));

            if i < last {
                lines.push(Line::from(""));
            }
            ListItem::new(lines)
        })
        .collect();

    let title = if feed.loading {
        format!(" {} ⟳ ", scope.title())
    } else {
        title
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(theme.highlight_bg));

    if let Some(feed) = app.feeds.get_mut(&scope) {
        frame.render_stateful_widget(list, area, &mut feed.list_state);
    }
}

pub fn render_requests_tab(frame: &mut Frame, app: &mut App, area: Rect) {
    let theme = &THEME;
    let title = " Requests ".to_string();
    let requests = &app.requests;

    if requests.is_empty() {
        let lines = if requests.loading {
            create_loading_display("Loading requests...", theme)
        } else if let Some(error) = &requests.error {
            create_error_display(error, theme)
        } else {
            create_empty_display("No follow requests", "Press / to find people to follow", theme)
        };
        message_block(lines, title, frame, area);
        return;
    }

    let status_style = |status: FollowStatus| match status {
        FollowStatus::Pending => Style::default().fg(theme.warning),
        FollowStatus::Accepted => Style::default().fg(theme.success),
        FollowStatus::Rejected => Style::default().fg(theme.error),
    };

    let mut items: Vec<ListItem> = requests
        .incoming
        .iter()
        .map(|edge| {
            let who = edge.follower_username.clone().unwrap_or_else(|| "someone".to_string());
            let mut spans = vec![
                Span::styled("← ", Style::default().fg(theme.text_dim)),
                Span::styled(format!("@{}", who), Style::default().fg(theme.primary)),
                Span::raw(" wants to follow you "),
                Span::styled(format!("[{}]", edge.status), status_style(edge.status)),
            ];
            if app.inflight.contains(&edge.id) {
                spans.push(Span::styled(" ⟳", Style::default().fg(theme.warning)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    items.extend(requests.outgoing.iter().map(|edge| {
        let who = edge.followee_username.clone().unwrap_or_else(|| "someone".to_string());
        let mut spans = vec![
            Span::styled("→ ", Style::default().fg(theme.text_dim)),
            Span::raw("You follow "),
            Span::styled(format!("@{}", who), Style::default().fg(theme.primary)),
            Span::raw(" "),
            Span::styled(format!("[{}]", edge.status), status_style(edge.status)),
        ];
        if app.inflight.contains(&edge.followee_id) {
            spans.push(Span::styled(" ⟳", Style::default().fg(theme.warning)));
        }
        ListItem::new(Line::from(spans))
    }));

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(theme.highlight_bg).add_modifier(Modifier::BOLD))
        .highlight_symbol("▶ ");
    frame.render_stateful_widget(list, area, &mut app.requests.list_state);
}

pub fn render_schedule_tab(frame: &mut Frame, app: &mut App, area: Rect) {
    let theme = &THEME;
    let schedule = &app.schedule;
    let title = format!(" Schedule for {} ", schedule.date.format("%a %d %b %Y"));

    if schedule.entries.is_empty() {
        let lines = if schedule.loading {
            create_loading_display("Loading schedule...", theme)
        } else if let Some(error) = &schedule.error {
            create_error_display(error, theme)
        } else {
            create_empty_display("Nothing planned", "Press n to add a time block", theme)
        };
        message_block(lines, title, frame, area);
        return;
    }

    let width = area.width.saturating_sub(BORDER_PADDING + 14) as usize;
    let items: Vec<ListItem> = schedule
        .entries
        .iter()
        .map(|entry| {
            let mut spans = vec![
                Span::styled(
                    format_time_block(entry.start_time, entry.end_time),
                    Style::default().fg(theme.secondary).add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::styled(truncate(&entry.text, width), Style::default().fg(theme.text)),
            ];
            if app.inflight.contains(&entry.id) {
                spans.push(Span::styled(" ⟳", Style::default().fg(theme.warning)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(theme.highlight_bg))
        .highlight_symbol("▶ ");
    frame.render_stateful_widget(list, area, &mut app.schedule.list_state);
}
