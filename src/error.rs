//! Error types
//!
//! `HandlerError` is what endpoint hooks return; `RequestHandler::run` turns
//! every variant into a 500 JSON response. `ServerError` covers startup.

use thiserror::Error;

/// Failure raised inside an endpoint hook
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Message(String),
}

impl HandlerError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// Failure while bringing the server up
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid listen address: {0}")]
    Address(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
