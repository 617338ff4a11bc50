use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use super::posts::parse_id;
use super::{require_user, ApiError, ApiResult};
use crate::db::repositories::FollowRequest;
use crate::state::AppState;
use daybook_types::{
    CreateFollowRequest, FollowEdge, FollowStatus, TransitionError, UpdateFollowStatusRequest,
};

/// POST /follows - Ask to follow a user
pub async fn create_follow(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateFollowRequest>,
) -> ApiResult<Json<FollowEdge>> {
    let follower_id = require_user(&state, &headers)?;

    if payload.followee_id == follower_id {
        return Err(ApiError::BadRequest("You cannot follow yourself".to_string()));
    }
    if state.users().get_by_id(&payload.followee_id)?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let outcome = state.follows().request(&follower_id, &payload.followee_id)?;
    if let FollowRequest::Created(edge) = &outcome {
        tracing::info!("Follow request {} from {} to {}", edge.id, follower_id, payload.followee_id);
    }

    Ok(Json(outcome.into_edge()))
}

/// DELETE /follows/:followee_id - Stop following (or withdraw a request)
pub async fn delete_follow(
    State(state): State<AppState>,
    Path(followee_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let follower_id = require_user(&state, &headers)?;
    let followee_id = parse_id(&followee_id, "user")?;

    let removed = state.follows().delete(&follower_id, &followee_id)? > 0;

    Ok(Json(serde_json::json!({
        "removed": removed,
        "followee_id": followee_id
    })))
}

/// GET /follows/outgoing - Edges the caller created
pub async fn get_outgoing(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<FollowEdge>>> {
    let user_id = require_user(&state, &headers)?;
    Ok(Json(state.follows().outgoing(&user_id)?))
}

#[derive(Deserialize)]
pub struct IncomingQuery {
    #[serde(default)]
    status: Option<String>,
}

/// GET /follows/incoming?status=pending - Edges pointing at the caller
pub async fn get_incoming(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<IncomingQuery>,
) -> ApiResult<Json<Vec<FollowEdge>>> {
    let user_id = require_user(&state, &headers)?;
    let status = match query.status.as_deref() {
        None => None,
        Some(raw) => Some(
            FollowStatus::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown follow status '{}'", raw)))?,
        ),
    };

    Ok(Json(state.follows().incoming(&user_id, status)?))
}

/// PUT /follows/:id/status - Accept or reject a pending request
pub async fn update_status(
    State(state): State<AppState>,
    Path(edge_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<UpdateFollowStatusRequest>,
) -> ApiResult<Json<FollowEdge>> {
    let user_id = require_user(&state, &headers)?;
    let edge_id = parse_id(&edge_id, "follow")?;

    let edge = state
        .follows()
        .get(&edge_id)?
        .ok_or_else(|| ApiError::NotFound("Follow request not found".to_string()))?;

    let next = edge.transition(user_id, payload.status)?;
    if state.follows().set_status(&edge_id, next.status)? == 0 {
        // Answered or removed by another request since it was read
        return Err(match state.follows().get(&edge_id)? {
            Some(current) => TransitionError::NotPending(current.status).into(),
            None => ApiError::NotFound("Follow request not found".to_string()),
        });
    }
    tracing::info!("Follow {} is now {}", edge_id, next.status);

    Ok(Json(next))
}
