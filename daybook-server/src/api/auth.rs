use axum::{extract::State, http::HeaderMap, Json};
use daybook_types::{validate_email, LoginRequest, LoginResponse, RegisterRequest, ValidateSessionResponse};

use super::{bearer_token, require_user, ApiError, ApiResult};
use crate::state::AppState;

/// POST /auth/register - Create an account with no username and log it in
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Json<LoginResponse>> {
    validate_email(&payload.email)?;

    let users = state.users();
    if users.get_by_email(&payload.email)?.is_some() {
        return Err(ApiError::Conflict("An account with that email already exists".to_string()));
    }

    let user = users.create(&payload.email)?;
    let session_token = state.session_manager.create_session(user.id)?;
    tracing::info!("Registered user {}", user.id);

    Ok(Json(LoginResponse { user, session_token }))
}

/// POST /auth/login - Start a session for an existing account
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state
        .users()
        .get_by_email(&payload.email)?
        .ok_or_else(|| ApiError::NotFound(format!("No account for '{}'", payload.email.trim())))?;

    let session_token = state.session_manager.create_session(user.id)?;

    Ok(Json(LoginResponse { user, session_token }))
}

/// POST /auth/logout - Delete the caller's session
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let token = bearer_token(&headers)?;
    state.session_manager.delete_session(token)?;

    Ok(Json(serde_json::json!({
        "message": "Logged out successfully"
    })))
}

/// GET /auth/validate - Return the user behind the bearer token
pub async fn validate_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<ValidateSessionResponse>> {
    let user_id = require_user(&state, &headers)?;
    let user = state
        .users()
        .get_by_id(&user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ValidateSessionResponse { user, valid: true }))
}
