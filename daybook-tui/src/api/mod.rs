mod backend;
mod client;
mod error;

pub use backend::Backend;
pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
