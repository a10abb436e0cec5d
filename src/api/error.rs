use crate::http::RouteError;

pub use super::auth::AuthError;

pub type Result<T, E = RouteError<ApiError>> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("failed to authenticate: {0}")]
    Auth(#[from] AuthError),
    #[error("failed to read http body: {0}")]
    ParseHttpBody(#[from] hyper::Error),
    #[error("failed to parse json: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
