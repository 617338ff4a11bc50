use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use uuid::Uuid;

use super::posts::parse_id;
use super::{require_user, ApiError, ApiResult};
use crate::state::AppState;
use daybook_types::LikeStatus;

fn ensure_post_exists(state: &AppState, post_id: &Uuid, viewer: &Uuid) -> Result<(), ApiError> {
    state
        .posts()
        .get_by_id(post_id, viewer)?
        .map(|_| ())
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))
}

/// POST /posts/:id/like - Like a post (idempotent)
pub async fn like_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<LikeStatus>> {
    let user_id = require_user(&state, &headers)?;
    let post_id = parse_id(&post_id, "post")?;
    ensure_post_exists(&state, &post_id, &user_id)?;

    if state.likes().like(&user_id, &post_id)? {
        tracing::debug!("User {} liked post {}", user_id, post_id);
    }

    Ok(Json(LikeStatus { liked: true }))
}

/// DELETE /posts/:id/like - Remove a like (idempotent)
pub async fn unlike_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<LikeStatus>> {
    let user_id = require_user(&state, &headers)?;
    let post_id = parse_id(&post_id, "post")?;

    state.likes().unlike(&user_id, &post_id)?;

    Ok(Json(LikeStatus { liked: false }))
}

/// GET /posts/:id/like - Has the caller liked this post
pub async fn get_like(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<LikeStatus>> {
    let user_id = require_user(&state, &headers)?;
    let post_id = parse_id(&post_id, "post")?;

    let liked = state.likes().exists(&user_id, &post_id)?;
    Ok(Json(LikeStatus { liked }))
}
