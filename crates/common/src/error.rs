//! Error types for the interactions service.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Why an inbound credential could not be resolved to a participant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    /// The identity service could not be reached or timed out.
    #[error("identity service unavailable: {0}")]
    Unavailable(String),

    /// The identity service answered with a non-200 status.
    #[error("identity service rejected the credential (status {0})")]
    Rejected(u16),

    /// The credential or the identity payload could not be understood.
    #[error("malformed credential: {0}")]
    Malformed(String),
}

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Configuration required: define a default {0} configuration for this event or a custom one")]
    ConfigurationRequired(String),

    #[error("Too many choices: {selected} selected, at most {allowed} allowed")]
    TooManyChoices { selected: usize, allowed: usize },

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthFailure),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidConfigValue(_)
            | Self::ConfigurationRequired(_)
            | Self::TooManyChoices { .. }
            | Self::BadRequest(_)
            | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Auth(AuthFailure::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,

            // 5xx Server Errors
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidConfigValue(_) => "INVALID_CONFIG_VALUE",
            Self::ConfigurationRequired(_) => "CONFIGURATION_REQUIRED",
            Self::TooManyChoices { .. } => "TOO_MANY_CHOICES",
            Self::Auth(AuthFailure::Unavailable(_)) => "AUTH_UNAVAILABLE",
            Self::Auth(AuthFailure::Rejected(_)) => "AUTH_REJECTED",
            Self::Auth(AuthFailure::Malformed(_)) => "AUTH_MALFORMED",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
