//! Error types for trek
//!
//! Caller-visible failures map to stable codes:
//! - `VALIDATION_ERROR` (400): malformed or semantically invalid input
//! - `NOT_FOUND` (404): a referenced entity does not exist
//! - `CONFLICT` (409): the operation would duplicate existing state
//! - `INTERNAL_ERROR` (500): store, IO and serialization failures
//!
//! CLI exit codes:
//! - 0: Success
//! - 2: User error (validation, not found, conflict, bad config)
//! - 4: Operation failed (store or IO error)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the trek CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Stable error codes reported to callers
pub mod codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const CONFLICT: &str = "CONFLICT";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Main error type for trek operations
#[derive(Error, Debug)]
pub enum Error {
    // Caller-visible
    #[error("{0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Internal
    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),
}

impl Error {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Whether this failure is the caller's to fix
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::NotFound { .. }
                | Error::Conflict(_)
                | Error::InvalidConfig(_)
        )
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) | Error::InvalidConfig(_) => codes::VALIDATION_ERROR,
            Error::NotFound { .. } => codes::NOT_FOUND,
            Error::Conflict(_) => codes::CONFLICT,
            _ => codes::INTERNAL_ERROR,
        }
    }

    /// HTTP-style status class for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) | Error::InvalidConfig(_) => 400,
            Error::NotFound { .. } => 404,
            Error::Conflict(_) => 409,
            _ => 500,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        if self.is_user_error() {
            exit_codes::USER_ERROR
        } else {
            exit_codes::OPERATION_FAILED
        }
    }

    /// Message safe to show a caller; internal failures stay generic
    pub fn public_message(&self) -> String {
        if self.is_user_error() {
            self.to_string()
        } else {
            INTERNAL_MESSAGE.to_string()
        }
    }

    /// Structured fields for caller-visible errors
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::NotFound { entity, id } => Some(serde_json::json!({
                "entity": entity,
                "id": id,
            })),
            Error::InvalidConfig(message) => Some(serde_json::json!({ "message": message })),
            Error::LockFailed(path) => Some(serde_json::json!({
                "path": path.to_string_lossy(),
            })),
            _ => None,
        }
    }
}

/// Result type alias for trek operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.public_message(),
            code: err.code(),
            details: if err.is_user_error() {
                err.details()
            } else {
                None
            },
        }
    }
}
