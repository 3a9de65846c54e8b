//! Daemon error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lexisub_lib::LexisubError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Library error: {0}")]
    Library(#[from] LexisubError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Session is not accepting subtitles ({0})")]
    SessionInactive(String),

    #[error("Subtitle feed is full, retry later")]
    FeedFull,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::Library(LexisubError::InvalidWord(_))
            | ServerError::Library(LexisubError::UnknownFormat(_))
            | ServerError::Library(LexisubError::UnknownStatus(_))
            | ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Library(LexisubError::Remote(_)) => StatusCode::BAD_GATEWAY,
            ServerError::SessionInactive(_) => StatusCode::CONFLICT,
            ServerError::FeedFull => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }
        (status, self.to_string()).into_response()
    }
}
