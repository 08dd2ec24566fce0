//! Error types for the Tandem application.

use thiserror::Error;

/// A shared error type for the entire Tandem application.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait. The variants map one-to-one
/// onto the failure modes a turn can hit: a missing conversation record, a
/// process that could not be spawned or exited non-zero, a cancelled stream,
/// and storage-layer failures.
#[derive(Error, Debug)]
pub enum TandemError {
    /// Entity not found error with type information
    #[error("{entity_type} not found: '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// The assistant binary could not be spawned (missing executable,
    /// permission denied, broken pipe setup).
    #[error("failed to start assistant process: {0}")]
    ProcessSpawn(String),

    /// The assistant process ran but exited with a non-zero status.
    #[error("assistant process failed with status {code:?}")]
    ProcessExit { code: Option<i32> },

    /// The stream was cancelled before the process completed.
    #[error("assistant stream cancelled")]
    Cancelled,

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Storage-layer error that is not a plain IO failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal error (should not happen in normal operation)
    #[error("internal error: {0}")]
    Internal(String),
}

impl TandemError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a ProcessSpawn error
    pub fn process_spawn(message: impl Into<String>) -> Self {
        Self::ProcessSpawn(message.into())
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a Cancelled error
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if this error came from the assistant process itself, as
    /// opposed to storage or internal failures.
    pub fn is_process_failure(&self) -> bool {
        matches!(self, Self::ProcessSpawn(_) | Self::ProcessExit { .. })
    }
}

impl From<std::io::Error> for TandemError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for TandemError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// A type alias for `Result<T, TandemError>`.
pub type Result<T> = std::result::Result<T, TandemError>;
