use chrono::{DateTime, Local, NaiveTime, Utc};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use super::theme::ThemeColors;

// Total horizontal padding from borders (2 per side)
pub const BORDER_PADDING: u16 = 4;

/// Format timestamp for display, in local time
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

pub fn format_time_block(start: NaiveTime, end: NaiveTime) -> String {
    format!("{}-{}", start.format("%H:%M"), end.format("%H:%M"))
}

/// Wrap post content to `max_width`, indented, with @mentions highlighted
pub fn format_post_content(
    content: &str,
    is_selected: bool,
    theme: &ThemeColors,
    max_width: usize,
) -> Vec<Line<'static>> {
    let wrap_width = max_width.saturating_sub(4).max(10);
    let mut lines = Vec::new();

    for line in content.lines() {
        for wrapped in textwrap::wrap(line, wrap_width) {
            let mut spans = vec![Span::raw("  ")];
            for (i, word) in wrapped.split(' ').enumerate() {
                if i > 0 {
                    spans.push(Span::raw(" "));
                }
                spans.push(styled_word(word, is_selected, theme));
            }
            lines.push(Line::from(spans));
        }
    }

    lines
}

fn styled_word(word: &str, is_selected: bool, theme: &ThemeColors) -> Span<'static> {
    let style = if word.starts_with('@') {
        Style::default().fg(theme.primary).add_modifier(Modifier::BOLD)
    } else if is_selected {
        Style::default().fg(theme.text).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.text)
    };
    Span::styled(word.to_string(), style)
}

/// Truncate to `max` characters, ending with "..." when cut
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::THEME;

    #[test]
    fn test_time_block_format() {
        let start = NaiveTime::from_hms_opt(9, 5, 0).unwrap();
        let end = NaiveTime::from_hms_opt(10, 30, 0).unwrap();
        assert_eq!(format_time_block(start, end), "09:05-10:30");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer line", 10), "a much ...");
    }

    #[test]
    fn test_post_content_wraps() {
        let lines = format_post_content("one two three four five six", false, &THEME, 16);
        assert!(lines.len() > 1);
        let text: String = lines
            .iter()
            .flat_map(|l| l.spans.iter().map(|s| s.content.to_string()))
            .collect();
        assert!(text.contains("six"));
    }
}
