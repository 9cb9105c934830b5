//! Error types for vault access and watching.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while opening, indexing or watching a vault.
#[derive(Error, Debug)]
pub enum VaultError {
    /// The configured root is missing or not a directory.
    #[error("Vault root '{0}' is not a directory")]
    NotADirectory(PathBuf),

    /// IO error on a vault path.
    #[error("IO error at '{path}': {source}")]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// File system watching error.
    #[error("File watching error: {0}")]
    Watch(#[from] notify::Error),

    /// A blocking task was cancelled or panicked.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl VaultError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VaultError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
