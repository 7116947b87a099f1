//! Errors raised by the client.
//!
//! - [`StorageError`] when the persisted key-value file cannot be read or written.
//! - [`StoreError`] for every store operation: request failures, client-side
//!   validation, persistence, and results discarded after a session change.
//! - [`AppError`] at the application boundary (configuration and wiring).
use thiserror::Error;

use crate::api::ApiError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Rejected before any request was issued.
    #[error("{0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("no active session")]
    NoSession,
    /// The session identity changed while the request was in flight.
    #[error("operation discarded: session changed")]
    Cancelled,
}

impl StoreError {
    /// Message shown to the user, falling back to `fallback` when the
    /// underlying error carries no text.
    pub fn user_message(&self, fallback: &str) -> String {
        let message = match self {
            Self::Api(err) => err.message(),
            other => other.to_string(),
        };
        if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("invalid base_url: {0}")]
    BaseUrl(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ApiError> for AppError {
    fn from(value: ApiError) -> Self {
        Self::Store(StoreError::Api(value))
    }
}
