//! Privileged operations. Every response is a `{success, data|error}` envelope.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::HeaderMap,
    response::Response,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::posts::parse_id;
use super::{require_user, respond, ApiError, ApiResult};
use crate::state::AppState;
use daybook_types::{
    validate_schedule_entry, validate_username, AccountDeleted, ScheduleEntry,
    ScheduleEntryDeleted, ScheduleEntryDraft, SetUsernameRequest, User, UserSummary,
};

const SEARCH_LIMIT: i64 = 20;

/// Malformed bodies and query strings still answer with an envelope
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

fn query<T>(params: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    params
        .map(|Query(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// POST /functions/delete-account
pub async fn delete_account(State(state): State<AppState>, headers: HeaderMap) -> Response {
    respond(delete_account_inner(&state, &headers))
}

fn delete_account_inner(state: &AppState, headers: &HeaderMap) -> ApiResult<AccountDeleted> {
    let user_id = require_user(state, headers)?;

    // Sessions, posts, likes, follows and schedule entries cascade
    if state.users().delete(&user_id)? == 0 {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    tracing::info!("Deleted account {}", user_id);

    Ok(AccountDeleted { user_id })
}

/// POST /functions/set-username
pub async fn set_username(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SetUsernameRequest>, JsonRejection>,
) -> Response {
    respond(body(payload).and_then(|payload| set_username_inner(&state, &headers, payload)))
}

fn set_username_inner(
    state: &AppState,
    headers: &HeaderMap,
    payload: SetUsernameRequest,
) -> ApiResult<User> {
    let user_id = require_user(state, headers)?;
    let username = payload.username.trim();
    validate_username(username)?;

    let users = state.users();
    if users.username_taken(username, &user_id)? || !users.set_username(&user_id, username)? {
        return Err(ApiError::Conflict(format!("Username '{}' is already taken", username)));
    }

    users
        .get_by_id(&user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

/// GET /functions/search-users?q=
pub async fn search_users(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Query<SearchQuery>, QueryRejection>,
) -> Response {
    respond(query(params).and_then(|params| search_users_inner(&state, &headers, &params.q)))
}

fn search_users_inner(state: &AppState, headers: &HeaderMap, q: &str) -> ApiResult<Vec<UserSummary>> {
    let user_id = require_user(state, headers)?;
    if q.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(state.users().search(q, &user_id, SEARCH_LIMIT)?)
}

#[derive(Deserialize)]
pub struct ScheduleQuery {
    date: NaiveDate,
}

/// GET /functions/schedule?date=YYYY-MM-DD
pub async fn list_schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Query<ScheduleQuery>, QueryRejection>,
) -> Response {
    respond(query(params).and_then(|params| list_schedule_inner(&state, &headers, params.date)))
}

fn list_schedule_inner(
    state: &AppState,
    headers: &HeaderMap,
    date: NaiveDate,
) -> ApiResult<Vec<ScheduleEntry>> {
    let user_id = require_user(state, headers)?;
    Ok(state.schedule().list_for_day(&user_id, date)?)
}

/// POST /functions/schedule
pub async fn create_schedule_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    draft: Result<Json<ScheduleEntryDraft>, JsonRejection>,
) -> Response {
    respond(body(draft).and_then(|draft| create_entry_inner(&state, &headers, &draft)))
}

fn create_entry_inner(
    state: &AppState,
    headers: &HeaderMap,
    draft: &ScheduleEntryDraft,
) -> ApiResult<ScheduleEntry> {
    let user_id = require_user(state, headers)?;
    validate_schedule_entry(draft)?;
    Ok(state.schedule().create(&user_id, draft)?)
}

/// PUT /functions/schedule/:id
pub async fn update_schedule_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
    headers: HeaderMap,
    draft: Result<Json<ScheduleEntryDraft>, JsonRejection>,
) -> Response {
    respond(body(draft).and_then(|draft| update_entry_inner(&state, &headers, &entry_id, &draft)))
}

fn update_entry_inner(
    state: &AppState,
    headers: &HeaderMap,
    entry_id: &str,
    draft: &ScheduleEntryDraft,
) -> ApiResult<ScheduleEntry> {
    let user_id = require_user(state, headers)?;
    let entry_id = parse_id(entry_id, "schedule entry")?;
    validate_schedule_entry(draft)?;

    let schedule = state.schedule();
    if schedule.update(&user_id, &entry_id, draft)? == 0 {
        return Err(ApiError::NotFound("Schedule entry not found".to_string()));
    }
    schedule
        .get(&user_id, &entry_id)?
        .ok_or_else(|| ApiError::NotFound("Schedule entry not found".to_string()))
}

/// DELETE /functions/schedule/:id
pub async fn delete_schedule_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    respond(delete_entry_inner(&state, &headers, &entry_id))
}

fn delete_entry_inner(
    state: &AppState,
    headers: &HeaderMap,
    entry_id: &str,
) -> ApiResult<ScheduleEntryDeleted> {
    let user_id = require_user(state, headers)?;
    let id = parse_id(entry_id, "schedule entry")?;

    if state.schedule().delete(&user_id, &id)? == 0 {
        return Err(ApiError::NotFound("Schedule entry not found".to_string()));
    }
    Ok(ScheduleEntryDeleted { id })
}
