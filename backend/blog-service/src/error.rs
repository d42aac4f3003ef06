/// Error types for Blog Service
///
/// Every operation returns `Result<T, AppError>`. Errors are converted to
/// `{"error": "<message>"}` responses; 5xx kinds never expose their detail.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::fmt;

/// Result type for blog-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Message returned for every 5xx response.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Message returned when a file path escapes the upload directory.
pub const INVALID_PATH_MESSAGE: &str = "Invalid file path";

/// Application error types
#[derive(Debug)]
pub enum AppError {
    /// Invalid argument or failed validation
    BadRequest(String),

    /// Requested resource does not exist
    NotFound(String),

    /// Requested file path resolves outside the upload directory
    Security(String),

    /// Database operation failed
    DatabaseError(String),

    /// Reading or writing stored files failed
    Storage(String),

    /// Unclassified failure
    Internal(String),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn post_not_found(post_id: i64) -> Self {
        AppError::NotFound(format!("Post {} not found", post_id))
    }

    pub fn comment_not_found(post_id: i64, comment_id: i64) -> Self {
        AppError::NotFound(format!(
            "Comment {} not found for post {}",
            comment_id, post_id
        ))
    }

    /// Message safe to return to API clients.
    pub fn public_message(&self) -> &str {
        match self {
            AppError::BadRequest(msg) | AppError::NotFound(msg) => msg,
            AppError::Security(_) => INVALID_PATH_MESSAGE,
            AppError::DatabaseError(_) | AppError::Storage(_) | AppError::Internal(_) => {
                INTERNAL_ERROR_MESSAGE
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Security(msg) => write!(f, "Security violation: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Security(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        match self {
            AppError::Security(_) => tracing::warn!(error = %self, "rejected file path"),
            _ if status.is_server_error() => tracing::error!(error = %self, "request failed"),
            _ => tracing::debug!(error = %self, "request rejected"),
        }

        HttpResponse::build(status).json(serde_json::json!({
            "error": self.public_message(),
        }))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
