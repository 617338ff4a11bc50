//! Form validation shared by the server and the client composer.
//!
//! Every check reports problems per field so the client can render them next
//! to the offending input instead of as a single banner.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::ScheduleEntryDraft;

pub const MAX_POST_LENGTH: usize = 280;
pub const MAX_SCHEDULE_TEXT_LENGTH: usize = 200;
pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// First message recorded for `field`, if any
    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

fn check_text(errors: &mut ValidationErrors, field: &str, text: &str, max: usize) {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        errors.add(field, "Cannot be empty");
    } else {
        let count = trimmed.chars().count();
        if count > max {
            errors.add(
                field,
                format!("Exceeds {} character limit (current: {})", max, count),
            );
        }
    }
}

fn check_time_order(errors: &mut ValidationErrors, start: NaiveTime, end: NaiveTime) {
    if end <= start {
        errors.add("end_time", "End time must be after start time");
    }
}

/// Validate post content and its optional time block
pub fn validate_post(
    content: &str,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_text(&mut errors, "content", content, MAX_POST_LENGTH);

    match (start_time, end_time) {
        (Some(start), Some(end)) => check_time_order(&mut errors, start, end),
        (Some(_), None) => errors.add("end_time", "End time is required when a start time is set"),
        (None, Some(_)) => errors.add("start_time", "Start time is required when an end time is set"),
        (None, None) => {}
    }

    errors.into_result()
}

pub fn validate_schedule_entry(draft: &ScheduleEntryDraft) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_text(&mut errors, "text", &draft.text, MAX_SCHEDULE_TEXT_LENGTH);
    check_time_order(&mut errors, draft.start_time, draft.end_time);
    errors.into_result()
}

/// Usernames are 3-20 ASCII letters, digits or underscores
pub fn validate_username(username: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let len = username.chars().count();

    if len < USERNAME_MIN_LENGTH || len > USERNAME_MAX_LENGTH {
        errors.add(
            "username",
            format!(
                "Must be between {} and {} characters",
                USERNAME_MIN_LENGTH, USERNAME_MAX_LENGTH
            ),
        );
    } else if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        errors.add("username", "Only letters, digits and underscores are allowed");
    }

    errors.into_result()
}

pub fn validate_email(email: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        errors.add("email", "Enter a valid email address");
    }
    errors.into_result()
}

/// Parse a composer time block such as `09:00-10:30`. An empty string means no block.
pub fn parse_time_block(input: &str) -> Result<Option<(NaiveTime, NaiveTime)>, ValidationErrors> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    let mut errors = ValidationErrors::new();
    let Some((start, end)) = input.split_once('-') else {
        errors.add("time_block", "Use the form HH:MM-HH:MM");
        return Err(errors);
    };

    let start = NaiveTime::parse_from_str(start.trim(), "%H:%M");
    let end = NaiveTime::parse_from_str(end.trim(), "%H:%M");
    match (start, end) {
        (Ok(start), Ok(end)) => {
            check_time_order(&mut errors, start, end);
            errors.into_result().map(|_| Some((start, end)))
        }
        (Err(_), _) => {
            errors.add("start_time", "Not a valid HH:MM time");
            Err(errors)
        }
        (_, Err(_)) => {
            errors.add("end_time", "Not a valid HH:MM time");
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_post_content_limits() {
        assert!(validate_post("Morning run", None, None).is_ok());

        let errors = validate_post("   ", None, None).unwrap_err();
        assert_eq!(errors.for_field("content"), Some("Cannot be empty"));

        let long = "a".repeat(MAX_POST_LENGTH + 1);
        let errors = validate_post(&long, None, None).unwrap_err();
        assert!(errors.for_field("content").unwrap().contains("280"));

        // Limit counts characters, not bytes
        let emoji = "🌅".repeat(MAX_POST_LENGTH);
        assert!(validate_post(&emoji, None, None).is_ok());
    }

    #[test]
    fn test_post_time_block_rules() {
        assert!(validate_post("Standup", Some(hm(9, 0)), Some(hm(9, 15))).is_ok());

        let errors = validate_post("Standup", Some(hm(9, 0)), None).unwrap_err();
        assert!(errors.for_field("end_time").is_some());

        let errors = validate_post("Standup", None, Some(hm(9, 0))).unwrap_err();
        assert!(errors.for_field("start_time").is_some());

        let errors = validate_post("Standup", Some(hm(10, 0)), Some(hm(9, 0))).unwrap_err();
        assert_eq!(
            errors.for_field("end_time"),
            Some("End time must be after start time")
        );
    }

    #[test]
    fn test_errors_are_reported_per_field() {
        let errors = validate_post("", Some(hm(10, 0)), Some(hm(10, 0))).unwrap_err();
        assert_eq!(errors.errors.len(), 2);
        assert!(errors.for_field("content").is_some());
        assert!(errors.for_field("end_time").is_some());
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("early_bird42").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(21)).is_err());
        assert!(validate_username("no spaces").is_err());
        assert!(validate_username("dash-name").is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("ada@example").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ada.example.com").is_err());
    }

    #[test]
    fn test_schedule_entry_rules() {
        let mut draft = ScheduleEntryDraft {
            date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
            start_time: hm(14, 0),
            end_time: hm(15, 30),
            text: "Write report".to_string(),
        };
        assert!(validate_schedule_entry(&draft).is_ok());

        draft.end_time = hm(13, 0);
        draft.text = String::new();
        let errors = validate_schedule_entry(&draft).unwrap_err();
        assert!(errors.for_field("text").is_some());
        assert!(errors.for_field("end_time").is_some());
    }

    #[test]
    fn test_parse_time_block() {
        assert_eq!(parse_time_block(""), Ok(None));
        assert_eq!(
            parse_time_block(" 09:00 - 10:30 "),
            Ok(Some((hm(9, 0), hm(10, 30))))
        );
        assert!(parse_time_block("9am-10am").is_err());
        assert!(parse_time_block("10:00").is_err());
        assert!(parse_time_block("11:00-10:00").is_err());
    }
}
