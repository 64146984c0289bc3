//! Error types for the shared crate
//!
//! Standardized error types used across the server. Every error maps to the
//! uniform `{success: false, message}` envelope at the HTTP boundary.

use crate::http::StatusCode;
use crate::response::ApiResponse;
use thiserror::Error;

/// Unified error type for the system
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input
    #[error("{message}")]
    Validation { message: String },

    /// Permission denied
    #[error("Permission denied: {message}")]
    Forbidden { message: String },

    /// Resource not found
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// Invalid request (e.g. empty allowed-update set)
    #[error("Invalid request: {message}")]
    Invalid { message: String },

    /// Operation not permitted in the current lifecycle state
    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    /// Database error
    #[error("Database error: {message}")]
    Database { message: String },

    /// Internal server error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ApiError {
    // ========== Convenient constructors ==========

    /// Create a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    /// Create a Forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden { message: message.into() }
    }

    /// Create a NotFound error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    /// Create an Invalid error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid { message: message.into() }
    }

    /// Create an InvalidState error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState { message: message.into() }
    }

    /// Create a Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database { message: message.into() }
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    // ========== Error inspection methods ==========

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Invalid { .. } => StatusCode::BAD_REQUEST,
            Self::InvalidState { .. } => StatusCode::BAD_REQUEST,
            Self::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the user-visible error message
    pub fn message(&self) -> String {
        match self {
            Self::Validation { message } => message.clone(),
            Self::Forbidden { message } => message.clone(),
            Self::NotFound { resource } => format!("{} not found", resource),
            Self::Invalid { message } => message.clone(),
            Self::InvalidState { message } => message.clone(),
            // Store/internal failures never leak detail in the envelope message
            Self::Database { .. } => "Database error".to_string(),
            Self::Internal { .. } => "Internal server error".to_string(),
        }
    }

    /// Internal detail, attached to responses in development builds only
    fn detail(&self) -> Option<String> {
        match self {
            Self::Database { message } | Self::Internal { message } => Some(message.clone()),
            _ => None,
        }
    }
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = if cfg!(debug_assertions) {
            match self.detail() {
                Some(detail) => ApiResponse::<()>::error_with_detail(self.message(), detail),
                None => ApiResponse::<()>::error(self.message()),
            }
        } else {
            ApiResponse::<()>::error(self.message())
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ApiError::not_found("Issue").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::forbidden("nope").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::invalid("bad").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::invalid_state("already rejected").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::database("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_detail_never_reaches_message() {
        let err = ApiError::database("connection refused at 10.0.0.1");
        assert_eq!(err.message(), "Database error");
    }
}
