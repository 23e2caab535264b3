//! Error types for the sync engine.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for sync engine operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that can surface from the sync engine's public operations.
///
/// Per-file failures during a sweep or a watch event are never returned;
/// they are reported on the notification channel instead.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Enable was requested with no rules defined.
    #[error("no sync rules specified")]
    NoRules,

    /// A destination directory could not be created.
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Notify error.
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
