//! Error types for the sibling linker.
//!
//! Failures are scoped to the narrowest unit of work: a [`ConfigError`] aborts
//! one scan, a [`StoreError`] aborts one document. Nothing here is fatal to
//! the hosting process.

use crate::types::DocumentId;
use thiserror::Error;

/// Invalid linker configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The eligibility pattern does not compile.
    #[error("Invalid eligibility pattern '{pattern}': {source}")]
    InvalidPattern {
        /// Pattern as configured.
        pattern: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// The target property name is not identifier-safe.
    #[error("Invalid property name '{0}': expected a letter or '_' followed by letters, digits, '_' or '-'")]
    InvalidProperty(String),

    /// The quiescence window is outside the supported range.
    #[error("Quiescence window of {0}ms is out of range (100..=60000)")]
    QuiescenceOutOfRange(u64),
}

/// Errors raised by a document store collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Document does not exist.
    #[error("Document not found: {0}")]
    NotFound(DocumentId),

    /// The document's metadata block could not be parsed.
    #[error("Malformed frontmatter in {id}: {message}")]
    Parse {
        /// Document whose metadata block is malformed.
        id: DocumentId,
        /// Parser message.
        message: String,
    },

    /// Read or write failure.
    #[error("IO error on {id}: {source}")]
    Io {
        /// Document being read or written.
        id: DocumentId,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Build an IO error, folding `NotFound` into [`StoreError::NotFound`].
    pub fn io(id: DocumentId, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound(id)
        } else {
            StoreError::Io { id, source }
        }
    }

    /// Whether this is a metadata parse failure.
    pub fn is_parse(&self) -> bool {
        matches!(self, StoreError::Parse { .. })
    }
}

/// Errors that abort a whole scan.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Configuration could not be compiled.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The working set could not be enumerated.
    #[error("Could not enumerate documents: {0}")]
    Enumerate(#[source] StoreError),
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for scans.
pub type ScanResult<T> = std::result::Result<T, ScanError>;
