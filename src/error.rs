use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    db::LedgerError,
    report::{filter::FieldError, RenderError, ValidationError},
    services::AuthError,
};

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Auth(AuthError::MissingToken) => (StatusCode::UNAUTHORIZED, "NO_TOKEN"),
            AppError::Auth(AuthError::InvalidToken) => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            AppError::Auth(AuthError::UserNotFound) => (StatusCode::UNAUTHORIZED, "USER_NOT_FOUND"),
            AppError::Auth(AuthError::InvalidCredentials) => {
                (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS")
            }
            AppError::Auth(AuthError::Hashing(_) | AuthError::Signing(_))
            | AppError::Ledger(_)
            | AppError::Render(_)
            | AppError::Database(_)
            | AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SERVER_ERROR"),
        }
    }
}

// Convert AppError to an HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let (message, details) = match self {
            AppError::Validation(err) => {
                ("Invalid request parameters".to_string(), Some(err.details))
            }
            AppError::Auth(ref err) if !status.is_server_error() => (err.to_string(), None),
            _ => {
                // the cause stays in the log, the caller gets a generic message
                tracing::error!(error = ?self, "request failed");
                ("Server error".to_string(), None)
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

pub type Result<T> = std::result::Result<T, AppError>;
