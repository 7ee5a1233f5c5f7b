use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// HTTP-facing error envelope. Every variant carries the caller-visible message;
/// `code` is the stable outcome code clients switch on.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not Found: {message}")]
    NotFound { code: &'static str, message: String },

    #[error("Conflict: {message}")]
    Conflict { code: &'static str, message: String },

    #[error("Validation error: {message}")]
    ValidationError { code: &'static str, message: String },

    #[error("External service error: {message}")]
    ExternalService { code: &'static str, message: String },

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound { code, .. }
            | AppError::Conflict { code, .. }
            | AppError::ValidationError { code, .. }
            | AppError::ExternalService { code, .. } => code,
            AppError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            AppError::ExternalService { .. } => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            AppError::NotFound { message, .. }
            | AppError::Conflict { message, .. }
            | AppError::ValidationError { message, .. }
            | AppError::ExternalService { message, .. }
            | AppError::Internal(message) => message,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = self.message().to_string();

        if status.is_server_error() {
            tracing::error!("Error: {}: {}", status, message);
        } else {
            tracing::warn!("Request rejected: {} ({}): {}", status, code, message);
        }

        let body = Json(json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}
