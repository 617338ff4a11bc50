use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a follow edge. Edges start out pending and are answered by the followee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FollowStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl FollowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowStatus::Pending => "pending",
            FollowStatus::Accepted => "accepted",
            FollowStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(FollowStatus::Pending),
            "accepted" => Some(FollowStatus::Accepted),
            "rejected" => Some(FollowStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for FollowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which feed a post list belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeedScope {
    /// The viewer's own posts
    #[serde(rename = "self")]
    Self_,
    /// Posts by users the viewer follows (accepted edges only)
    Friends,
    #[default]
    World,
}

impl FeedScope {
    pub const ALL: [FeedScope; 3] = [FeedScope::Self_, FeedScope::Friends, FeedScope::World];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedScope::Self_ => "self",
            FeedScope::Friends => "friends",
            FeedScope::World => "world",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "self" => Some(FeedScope::Self_),
            "friends" => Some(FeedScope::Friends),
            "world" => Some(FeedScope::World),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            FeedScope::Self_ => "Self",
            FeedScope::Friends => "Friends",
            FeedScope::World => "World",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_status_round_trips_through_str() {
        for status in [FollowStatus::Pending, FollowStatus::Accepted, FollowStatus::Rejected] {
            assert_eq!(FollowStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(FollowStatus::parse("ACCEPTED"), Some(FollowStatus::Accepted));
        assert_eq!(FollowStatus::parse("maybe"), None);
    }

    #[test]
    fn test_feed_scope_serializes_self_keyword() {
        let json = serde_json::to_string(&FeedScope::Self_).unwrap();
        assert_eq!(json, "\"self\"");
        let parsed: FeedScope = serde_json::from_str("\"friends\"").unwrap();
        assert_eq!(parsed, FeedScope::Friends);
    }
}
