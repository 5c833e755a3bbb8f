//! Error types for teamboard
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad request, unknown id, bad config)
//! - 3: Rejected by a constraint (duplicate name, illegal state transition)
//! - 4: Operation failed (storage unreadable, lock timeout, IO)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the teamboard CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const REJECTED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for teamboard operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Constraint rejections (exit code 3)
    #[error("{kind} name must be unique: '{name}' already exists")]
    AlreadyExists { kind: &'static str, name: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    // Operation failures (exit code 4)
    #[error("Collection {path} is malformed: {message}")]
    CorruptCollection { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn already_exists(kind: &'static str, name: impl Into<String>) -> Self {
        Error::AlreadyExists {
            kind,
            name: name.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidArgument(_) | Error::NotFound { .. } | Error::InvalidConfig(_) => {
                exit_codes::USER_ERROR
            }

            Error::AlreadyExists { .. } | Error::InvalidState(_) => exit_codes::REJECTED,

            Error::CorruptCollection { .. }
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Envelope `kind` for the exit code: `user_error`, `rejected` or
    /// `operation_failed`.
    pub fn kind(&self) -> &'static str {
        match self.exit_code() {
            exit_codes::USER_ERROR => "user_error",
            exit_codes::REJECTED => "rejected",
            _ => "operation_failed",
        }
    }

    /// True when the failure came from the backing medium rather than the caller.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::CorruptCollection { .. }
                | Error::Io(_)
                | Error::Json(_)
                | Error::LockFailed(_)
        )
    }

    /// Structured fields for JSON error output.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::NotFound { kind, id } => Some(serde_json::json!({
                "kind": kind,
                "id": id,
            })),
            Error::AlreadyExists { kind, name } => Some(serde_json::json!({
                "kind": kind,
                "name": name,
            })),
            Error::CorruptCollection { path, .. } | Error::LockFailed(path) => {
                Some(serde_json::json!({ "path": path.display().to_string() }))
            }
            _ => None,
        }
    }
}

/// Result type alias for teamboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// The `error` object of a JSON error envelope
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub message: String,
    pub code: i32,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            message: err.to_string(),
            code: err.exit_code(),
            kind: err.kind(),
            details: err.details(),
        }
    }
}
