use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::enums::FollowStatus;
use crate::models::FollowEdge;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Only the followed user can answer a follow request")]
    NotFollowee,
    #[error("Follow request was already {0}")]
    NotPending(FollowStatus),
    #[error("A follow request can only be accepted or rejected")]
    InvalidTarget,
}

impl FollowEdge {
    /// A fresh request from `follower_id` to `followee_id`
    pub fn pending(follower_id: Uuid, followee_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            follower_id,
            followee_id,
            follower_username: None,
            followee_username: None,
            status: FollowStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Answer a pending request. Only the followee may do so, and only once.
    pub fn transition(&self, actor: Uuid, to: FollowStatus) -> Result<FollowEdge, TransitionError> {
        if actor != self.followee_id {
            return Err(TransitionError::NotFollowee);
        }
        if self.status != FollowStatus::Pending {
            return Err(TransitionError::NotPending(self.status));
        }
        if to == FollowStatus::Pending {
            return Err(TransitionError::InvalidTarget);
        }

        let mut next = self.clone();
        next.status = to;
        Ok(next)
    }

    pub fn is_pending(&self) -> bool {
        self.status == FollowStatus::Pending
    }

    pub fn is_accepted(&self) -> bool {
        self.status == FollowStatus::Accepted
    }
}
