//! `AppError`, the one error type used across the store, services, HTTP handlers
//! and CLI, plus the crate-wide `Result` alias.
//!
//! Third-party errors that are not `Clone` are kept behind an `Arc` so `AppError`
//! itself stays `Clone`. The last three variants are client errors: their text is
//! sent to HTTP callers unchanged.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// Query, pool or decode failure in PostgreSQL.
    #[error("Database error: {0}")]
    Db(Arc<sqlx::Error>),

    /// A request body that is not valid JSON. Reported to clients as 400.
    #[error("Invalid JSON body: {0}")]
    JsonParse(Arc<serde_json::Error>),

    /// Socket bind or other I/O failure.
    #[error("I/O error: {0}")]
    Io(Arc<std::io::Error>),

    /// A setting from the environment or the command line is unusable.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Command failed: {0}")]
    Cli(String),

    /// Interactive prompt failed (closed terminal, no TTY).
    #[error("Prompt error: {0}")]
    Dialoguer(Arc<dialoguer::Error>),

    #[error("Progress bar template error: {0}")]
    Template(Arc<indicatif::style::TemplateError>),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Status sent to HTTP clients for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::JsonParse(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = if status.is_server_error() {
            error!("Request failed: {}", self);
            json!({
                "status": "error",
                "message": "Internal server error",
                "details": self.to_string(),
            })
        } else {
            json!({
                "status": "error",
                "message": self.to_string(),
            })
        };
        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Db(Arc::new(err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::JsonParse(Arc::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(Arc::new(err))
    }
}

impl From<dialoguer::Error> for AppError {
    fn from(err: dialoguer::Error) -> Self {
        AppError::Dialoguer(Arc::new(err))
    }
}

impl From<indicatif::style::TemplateError> for AppError {
    fn from(err: indicatif::style::TemplateError) -> Self {
        AppError::Template(Arc::new(err))
    }
}
