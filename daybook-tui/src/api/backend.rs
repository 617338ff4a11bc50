use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::ApiResult;
use daybook_types::{
    CreatePostRequest, FeedScope, FollowEdge, FollowStatus, LoginResponse, Post, ScheduleEntry,
    ScheduleEntryDraft, User, UserSummary,
};

/// Everything the client needs from the server.
///
/// The app holds this as `Arc<dyn Backend>` so remote mutations can run on
/// spawned tasks. `ApiClient` is the HTTP implementation.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Replace the bearer token used for subsequent requests
    fn set_session_token(&self, token: Option<String>);

    async fn register(&self, email: &str) -> ApiResult<LoginResponse>;
    async fn login(&self, email: &str) -> ApiResult<LoginResponse>;
    async fn logout(&self) -> ApiResult<()>;
    async fn validate_session(&self) -> ApiResult<User>;

    async fn feed(&self, scope: FeedScope, limit: Option<u32>) -> ApiResult<Vec<Post>>;
    async fn create_post(&self, request: &CreatePostRequest) -> ApiResult<Post>;
    async fn set_completed(&self, post_id: Uuid, completed: bool) -> ApiResult<()>;
    async fn delete_post(&self, post_id: Uuid) -> ApiResult<()>;
    async fn like(&self, post_id: Uuid) -> ApiResult<()>;
    async fn unlike(&self, post_id: Uuid) -> ApiResult<()>;

    async fn follow(&self, followee_id: Uuid) -> ApiResult<FollowEdge>;
    async fn unfollow(&self, followee_id: Uuid) -> ApiResult<()>;
    async fn outgoing_follows(&self) -> ApiResult<Vec<FollowEdge>>;
    async fn pending_requests(&self) -> ApiResult<Vec<FollowEdge>>;
    async fn answer_request(&self, edge_id: Uuid, status: FollowStatus) -> ApiResult<FollowEdge>;

    async fn set_username(&self, username: &str) -> ApiResult<User>;
    async fn search_users(&self, query: &str) -> ApiResult<Vec<UserSummary>>;
    async fn delete_account(&self) -> ApiResult<()>;

    async fn schedule_for(&self, date: NaiveDate) -> ApiResult<Vec<ScheduleEntry>>;
    async fn create_schedule_entry(&self, draft: &ScheduleEntryDraft) -> ApiResult<ScheduleEntry>;
    async fn delete_schedule_entry(&self, entry_id: Uuid) -> ApiResult<()>;
}
