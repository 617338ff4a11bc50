use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::FollowStatus;

// Custom serde module for DateTime to ensure RFC3339 string format
mod datetime_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = date.to_rfc3339();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Unset until the user claims one
    #[serde(default)]
    pub username: Option<String>,
    #[serde(with = "datetime_format")]
    pub join_date: DateTime<Utc>,
}

impl User {
    /// Name to show in lists, falling back to the email's local part
    pub fn display_name(&self) -> &str {
        match &self.username {
            Some(name) => name,
            None => self.email.split('@').next().unwrap_or(&self.email),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    #[serde(default)]
    pub author_username: Option<String>,
    pub content: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub completed: bool,
    /// Derived from the likes table on every read
    #[serde(default)]
    pub likes_count: u32,
    /// Whether the requesting user has a like row for this post
    #[serde(default)]
    pub liked_by_user: bool,
}

impl Post {
    /// Flip the viewer's like. The count never drops below zero.
    pub fn toggle_like(&mut self) {
        if self.liked_by_user {
            self.liked_by_user = false;
            self.likes_count = self.likes_count.saturating_sub(1);
        } else {
            self.liked_by_user = true;
            self.likes_count = self.likes_count.saturating_add(1);
        }
    }

    pub fn time_block(&self) -> Option<(NaiveTime, NaiveTime)> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Like {
    pub post_id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowEdge {
    pub id: Uuid,
    pub follower_id: Uuid,
    pub followee_id: Uuid,
    #[serde(default)]
    pub follower_username: Option<String>,
    #[serde(default)]
    pub followee_username: Option<String>,
    pub status: FollowStatus,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub text: String,
}

// Request/Response types for API
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    pub session_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateSessionResponse {
    pub user: User,
    pub valid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
}

pub type UpdatePostRequest = CreatePostRequest;

#[derive(Debug, Serialize, Deserialize)]
pub struct SetCompletedRequest {
    pub completed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeStatus {
    pub liked: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateFollowRequest {
    pub followee_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateFollowStatusRequest {
    pub status: FollowStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetUsernameRequest {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
}

/// Body for creating or replacing a schedule entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntryDraft {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountDeleted {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleEntryDeleted {
    pub id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
    /// Field-level problems for validation failures
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<crate::validation::FieldError>,
}

/// Uniform result wrapper returned by the privileged `/functions` endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Collapse the envelope into a `Result`, treating a success without data as an error
    pub fn into_result(self) -> Result<T, String> {
        match (self.success, self.data, self.error) {
            (true, Some(data), _) => Ok(data),
            (true, None, _) => Err("Response is missing its data payload".to_string()),
            (false, _, Some(error)) => Err(error),
            (false, _, None) => Err("Unknown error".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post(likes_count: u32, liked_by_user: bool) -> Post {
        Post {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            author_username: Some("ada".to_string()),
            content: "deep work".to_string(),
            created_at: Utc::now(),
            start_time: None,
            end_time: None,
            completed: false,
            likes_count,
            liked_by_user,
        }
    }

    #[test]
    fn test_toggle_like_adjusts_count() {
        let mut post = sample_post(3, false);
        post.toggle_like();
        assert!(post.liked_by_user);
        assert_eq!(post.likes_count, 4);

        post.toggle_like();
        assert!(!post.liked_by_user);
        assert_eq!(post.likes_count, 3);
    }

    #[test]
    fn test_unlike_at_zero_stays_at_zero() {
        // A stale count can say 0 while the viewer still has a like row
        let mut post = sample_post(0, true);
        post.toggle_like();
        assert!(!post.liked_by_user);
        assert_eq!(post.likes_count, 0);
    }

    #[test]
    fn test_envelope_wire_shape() {
        let ok = serde_json::to_value(Envelope::ok(UserSummary {
            id: Uuid::nil(),
            username: "ada".to_string(),
        }))
        .unwrap();
        assert_eq!(ok["success"], true);
        assert_eq!(ok["data"]["username"], "ada");
        assert!(ok.get("error").is_none());

        let err = serde_json::to_value(Envelope::<UserSummary>::err("Username is taken")).unwrap();
        assert_eq!(err["success"], false);
        assert_eq!(err["error"], "Username is taken");
        assert!(err.get("data").is_none());
    }

    #[test]
    fn test_envelope_into_result() {
        let ok: Envelope<u32> = serde_json::from_str(r#"{"success":true,"data":7}"#).unwrap();
        assert_eq!(ok.into_result(), Ok(7));

        let err: Envelope<u32> =
            serde_json::from_str(r#"{"success":false,"error":"nope"}"#).unwrap();
        assert_eq!(err.into_result(), Err("nope".to_string()));

        let empty: Envelope<u32> = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(empty.into_result().is_err());
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let mut user = User {
            id: Uuid::new_v4(),
            email: "grace@example.com".to_string(),
            username: None,
            join_date: Utc::now(),
        };
        assert_eq!(user.display_name(), "grace");
        user.username = Some("hopper".to_string());
        assert_eq!(user.display_name(), "hopper");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn post_with(likes_count: u32, liked_by_user: bool) -> Post {
        Post {
            id: Uuid::nil(),
            author_id: Uuid::nil(),
            author_username: None,
            content: String::new(),
            created_at: Utc::now(),
            start_time: None,
            end_time: None,
            completed: false,
            likes_count,
            liked_by_user,
        }
    }

    proptest! {
        #[test]
        fn like_count_never_underflows(start in 0u32..5, liked in any::<bool>(), toggles in 0usize..50) {
            let mut post = post_with(start, liked);
            for _ in 0..toggles {
                post.toggle_like();
            }
            // u32 cannot go negative; the flag and count must still be coherent
            prop_assert!(post.likes_count <= start + 1);
        }

        #[test]
        fn double_toggle_is_identity_when_count_positive(start in 1u32..1000, liked in any::<bool>()) {
            let original = post_with(start, liked);
            let mut post = original.clone();
            post.toggle_like();
            post.toggle_like();
            prop_assert_eq!(post, original);
        }
    }
}
