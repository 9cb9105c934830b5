//! Shared value types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// In-memory view of a document's leading metadata block.
///
/// `serde_yaml::Mapping` keeps insertion order, so untouched keys are
/// re-serialized where they were.
pub type Frontmatter = serde_yaml::Mapping;

/// Identity of a document within the collection.
///
/// A vault-relative, `/`-separated path such as `daily/2024-01-01.md`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Create an identity from a path-like string.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// File name without its extension, used for eligibility matching.
    pub fn short_name(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => name,
            Some(dot) => &name[..dot],
        }
    }

    /// Extension of the final path segment, without the dot.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(dot) => Some(&name[dot + 1..]),
        }
    }

    /// Folder portion of the identity (empty at the vault root).
    pub fn folder(&self) -> &str {
        match self.0.rfind('/') {
            Some(slash) => &self.0[..slash],
            None => "",
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for DocumentId {
    fn from(path: String) -> Self {
        Self(path)
    }
}

/// Working set of a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanScope {
    /// A single document.
    Document(DocumentId),
    /// Every document the store enumerates.
    Vault,
}

impl fmt::Display for ScanScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanScope::Document(id) => write!(f, "document {}", id),
            ScanScope::Vault => f.write_str("vault"),
        }
    }
}

/// Kind of document change reported by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Document was created.
    Created,
    /// Document contents were modified.
    Modified,
    /// Document was removed.
    Removed,
}

/// A "document changed" notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Changed document.
    pub id: DocumentId,
    /// What happened to it.
    pub kind: ChangeKind,
}

impl ChangeEvent {
    /// Create a change event.
    pub fn new(id: impl Into<DocumentId>, kind: ChangeKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    /// Shorthand for a modification event.
    pub fn modified(id: impl Into<DocumentId>) -> Self {
        Self::new(id, ChangeKind::Modified)
    }

    /// Whether this event should trigger a scan for the given text extension.
    pub fn qualifies(&self, text_extension: &str) -> bool {
        matches!(self.kind, ChangeKind::Created | ChangeKind::Modified)
            && self.id.extension() == Some(text_extension)
    }
}
