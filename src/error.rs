use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::response;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Failed to reach backend: {0}")]
    FetchError(String),

    #[error("Backend request timed out: {0}")]
    Timeout(String),

    #[error("Backend answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Error parsing backend response: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Request superseded by a newer one")]
    Cancelled,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::FetchError(_) | AppError::Status { .. } => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            AppError::ParseError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Cancelled => StatusCode::CONFLICT,
        }
    }

    /// Stable machine-readable name, reported in the `/api` envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::FetchError(_) => "fetch",
            AppError::Timeout(_) => "timeout",
            AppError::Status { .. } => "backend_status",
            AppError::ParseError(_) => "parse",
            AppError::ConfigError(_) => "config",
            AppError::Cancelled => "cancelled",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        response::failure(&self)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else if err.is_decode() {
            AppError::ParseError(err.to_string())
        } else {
            AppError::FetchError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ParseError(err.to_string())
    }
}

impl From<std::env::VarError> for AppError {
    fn from(err: std::env::VarError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
