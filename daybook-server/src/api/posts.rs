use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use super::{require_user, ApiError, ApiResult};
use crate::state::AppState;
use daybook_types::{
    validate_post, CreatePostRequest, FeedScope, Post, SetCompletedRequest, UpdatePostRequest,
};

pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid {} ID", what)))
}

#[derive(Deserialize)]
pub struct GetPostsQuery {
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    limit: Option<i64>,
}

/// GET /posts?scope=self|friends|world&limit=N
pub async fn get_posts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<GetPostsQuery>,
) -> ApiResult<Json<Vec<Post>>> {
    let viewer = require_user(&state, &headers)?;

    let scope = match query.scope.as_deref() {
        None => FeedScope::default(),
        Some(raw) => FeedScope::parse(raw)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown feed scope '{}'", raw)))?,
    };
    let limit = state.settings.feed_limit(query.limit);

    let posts = state.posts().list(scope, &viewer, limit)?;
    tracing::debug!("Feed {} for {}: {} posts", scope.as_str(), viewer, posts.len());

    Ok(Json(posts))
}

/// POST /posts - Create a new post
pub async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreatePostRequest>,
) -> ApiResult<Json<Post>> {
    let author_id = require_user(&state, &headers)?;
    validate_post(&payload.content, payload.start_time, payload.end_time)?;

    let author = state
        .users()
        .get_by_id(&author_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let post = Post {
        id: Uuid::new_v4(),
        author_id,
        author_username: author.username,
        content: payload.content.trim().to_string(),
        created_at: Utc::now(),
        start_time: payload.start_time,
        end_time: payload.end_time,
        completed: false,
        likes_count: 0,
        liked_by_user: false,
    };
    state.posts().create(&post)?;

    Ok(Json(post))
}

/// GET /posts/:id - Get a single post by ID
pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Post>> {
    let viewer = require_user(&state, &headers)?;
    let post_id = parse_id(&post_id, "post")?;

    let post = state
        .posts()
        .get_by_id(&post_id, &viewer)?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    Ok(Json(post))
}

/// Load a post and check that `user_id` wrote it
fn owned_post(state: &AppState, post_id: &Uuid, user_id: &Uuid) -> Result<Post, ApiError> {
    let post = state
        .posts()
        .get_by_id(post_id, user_id)?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    if post.author_id != *user_id {
        return Err(ApiError::Forbidden(
            "You don't have permission to modify this post".to_string(),
        ));
    }

    Ok(post)
}

/// PUT /posts/:id - Update content and time block
pub async fn update_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<UpdatePostRequest>,
) -> ApiResult<Json<Post>> {
    let user_id = require_user(&state, &headers)?;
    let post_id = parse_id(&post_id, "post")?;
    validate_post(&payload.content, payload.start_time, payload.end_time)?;

    owned_post(&state, &post_id, &user_id)?;
    state.posts().update(
        &post_id,
        payload.content.trim(),
        payload.start_time,
        payload.end_time,
    )?;

    let post = owned_post(&state, &post_id, &user_id)?;
    Ok(Json(post))
}

/// PUT /posts/:id/completed - Mark a post done or not done
pub async fn set_completed(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<SetCompletedRequest>,
) -> ApiResult<Json<Post>> {
    let user_id = require_user(&state, &headers)?;
    let post_id = parse_id(&post_id, "post")?;

    owned_post(&state, &post_id, &user_id)?;
    state.posts().set_completed(&post_id, payload.completed)?;

    let post = owned_post(&state, &post_id, &user_id)?;
    Ok(Json(post))
}

/// DELETE /posts/:id - Delete a post
///
/// Likes are removed first. That step is best effort: a failure is logged
/// and the post is deleted anyway.
pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let user_id = require_user(&state, &headers)?;
    let post_id = parse_id(&post_id, "post")?;

    owned_post(&state, &post_id, &user_id)?;

    if let Err(e) = state.likes().delete_for_post(&post_id) {
        tracing::warn!("Failed to delete likes for post {}: {:#}", post_id, e);
    }

    state.posts().delete(&post_id)?;

    Ok(Json(serde_json::json!({
        "message": "Post deleted successfully",
        "post_id": post_id
    })))
}
