//! Error type system for the user service
//!
//! This module provides:
//! - A single error enum shared by the store, the auth helpers and the handlers
//! - HTTP status code mapping
//! - Sanitized failure envelopes with trace IDs

use crate::api::middleware::current_trace_id;
use crate::api::models::ApiResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Public message used for every login failure
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

/// Public message used for failures whose details must stay server-side
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Main error type for the user service
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    // Storage errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    PoolError(String),

    // User store errors
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error("Invalid user record: {0}")]
    InvalidUserRecord(String),

    // API-related errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Request timed out: {0}")]
    RequestTimeout(String),

    // Crypto errors
    #[error("Password hashing error: {0}")]
    PasswordHashError(String),

    #[error("Token signing error: {0}")]
    TokenError(String),

    // Runtime errors
    #[error("Task error: {0}")]
    TaskError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ServiceError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ServiceError::RequestTimeout(_) => StatusCode::REQUEST_TIMEOUT,

            // Existing clients of /login and /register only know 200 and 500,
            // so credential and store rejections stay on 500.
            ServiceError::InvalidCredentials
            | ServiceError::UserNotFound(_)
            | ServiceError::DuplicateUsername(_)
            | ServiceError::InvalidUserRecord(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 500 Internal Server Error
            ServiceError::DatabaseError(_)
            | ServiceError::PoolError(_)
            | ServiceError::PasswordHashError(_)
            | ServiceError::TokenError(_)
            | ServiceError::TaskError(_)
            | ServiceError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type name for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            ServiceError::DatabaseError(_) => "DatabaseError",
            ServiceError::PoolError(_) => "PoolError",
            ServiceError::UserNotFound(_) => "UserNotFound",
            ServiceError::DuplicateUsername(_) => "DuplicateUsername",
            ServiceError::InvalidUserRecord(_) => "InvalidUserRecord",
            ServiceError::InvalidRequest(_) => "InvalidRequest",
            ServiceError::InvalidCredentials => "InvalidCredentials",
            ServiceError::RouteNotFound(_) => "RouteNotFound",
            ServiceError::MethodNotAllowed(_) => "MethodNotAllowed",
            ServiceError::RequestTimeout(_) => "RequestTimeout",
            ServiceError::PasswordHashError(_) => "PasswordHashError",
            ServiceError::TokenError(_) => "TokenError",
            ServiceError::TaskError(_) => "TaskError",
            ServiceError::IoError(_) => "IoError",
        }
    }

    /// Message that is safe to return to the client.
    ///
    /// Driver errors, hashing failures and signing failures are replaced with a
    /// generic message; the full error only goes to the log.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::InvalidCredentials | ServiceError::UserNotFound(_) => {
                INVALID_CREDENTIALS_MESSAGE.to_string()
            }
            ServiceError::DuplicateUsername(_) => "Username already exists".to_string(),
            ServiceError::InvalidUserRecord(reason) => format!("Invalid user record: {}", reason),
            ServiceError::InvalidRequest(reason) => format!("Invalid request: {}", reason),
            ServiceError::RouteNotFound(_) => "Route not found".to_string(),
            ServiceError::MethodNotAllowed(_) => "Method not allowed".to_string(),
            ServiceError::RequestTimeout(_) => "Request timed out".to_string(),
            _ => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }

    /// Build the failure envelope for this error, tagged with the current request's trace ID
    pub fn to_envelope(&self) -> ApiResponse<()> {
        ApiResponse::failed(self.public_message(), self.error_type(), current_trace_id())
    }
}

/// Implement IntoResponse for ServiceError to enable automatic error handling in Axum
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let envelope = self.to_envelope();

        let trace_id = envelope.trace_id.as_deref().unwrap_or_default();
        if status_code.is_server_error() {
            tracing::error!(
                error_type = self.error_type(),
                trace_id = %trace_id,
                status_code = %status_code,
                "Request failed: {}",
                self
            );
        } else {
            tracing::warn!(
                error_type = self.error_type(),
                trace_id = %trace_id,
                status_code = %status_code,
                "Request rejected: {}",
                self
            );
        }

        (status_code, Json(envelope)).into_response()
    }
}

/// Result type alias for operations that can fail with ServiceError
pub type Result<T> = std::result::Result<T, ServiceError>;
