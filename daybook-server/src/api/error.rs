use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use daybook_types::{Envelope, ErrorResponse, TransitionError, ValidationErrors};
use serde::Serialize;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    Validation(ValidationErrors),
    InternalError(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show a client. Internal details are logged, not returned.
    pub fn client_message(&self) -> String {
        match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::Conflict(msg) => msg.clone(),
            ApiError::Validation(errors) => errors.to_string(),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An unexpected error occurred".to_string()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let label = status.canonical_reason().unwrap_or("Error").to_string();

        let error_response = match self {
            ApiError::Validation(errors) => ErrorResponse {
                error: label,
                details: Some(errors.to_string()),
                fields: errors.errors,
            },
            other => ErrorResponse {
                error: label,
                details: Some(other.client_message()),
                fields: Vec::new(),
            },
        };

        (status, Json(error_response)).into_response()
    }
}

/// Render a function result as a `{success, data|error}` envelope
pub fn respond<T: Serialize>(result: ApiResult<T>) -> Response {
    match result {
        Ok(data) => (StatusCode::OK, Json(Envelope::ok(data))).into_response(),
        Err(err) => {
            let status = err.status();
            (status, Json(Envelope::<T>::err(err.client_message()))).into_response()
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(format!("{:#}", err))
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<TransitionError> for ApiError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::NotFollowee => ApiError::Forbidden(err.to_string()),
            TransitionError::NotPending(_) => ApiError::Conflict(err.to_string()),
            TransitionError::InvalidTarget => ApiError::BadRequest(err.to_string()),
        }
    }
}
