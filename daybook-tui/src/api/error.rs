use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl ApiError {
    /// Map an HTTP status and server message to the matching variant
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            404 => ApiError::NotFound(message),
            401 | 403 => ApiError::Unauthorized(message),
            400 | 422 => ApiError::BadRequest(message),
            409 => ApiError::Conflict(message),
            _ => ApiError::Api(message),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
