//! Collaborator traits.
//!
//! The engine never touches files directly. Document enumeration, text reads,
//! metadata read-modify-write and link resolution are injected through these
//! traits so hosts (and tests) can supply their own implementations.

use crate::error::StoreResult;
use crate::types::{DocumentId, Frontmatter, ScanScope};
use async_trait::async_trait;

/// Mutation applied to a document's frontmatter. Returns `true` when it
/// changed the mapping and the block must be written back.
pub type FrontmatterMutation<'a> = &'a mut (dyn FnMut(&mut Frontmatter) -> bool + Send);

/// Access to the document collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Enumerate every text document in the collection.
    async fn list_documents(&self) -> StoreResult<Vec<DocumentId>>;

    /// Read the full text of a document.
    ///
    /// Fails with [`StoreError::NotFound`](crate::StoreError::NotFound) if
    /// the document does not exist.
    async fn read_text(&self, id: &DocumentId) -> StoreResult<String>;

    /// Scoped read-modify-write of a document's metadata block.
    ///
    /// The mutation runs exactly once against the parsed block (an empty
    /// mapping if the document has none). The block is re-serialized, with
    /// untouched keys in their original order, only when the mutation
    /// reports a change. Returns whether a write happened.
    ///
    /// Fails with [`StoreError::Parse`](crate::StoreError::Parse) if the
    /// existing block is malformed; the mutation is not invoked in that case.
    async fn process_frontmatter(
        &self,
        id: &DocumentId,
        mutate: FrontmatterMutation<'_>,
    ) -> StoreResult<bool>;
}

/// Maps a reference token to a concrete document.
#[async_trait]
pub trait LinkResolver: Send + Sync {
    /// Resolve `token` as written inside `source`.
    ///
    /// Returns `None` when nothing matches or the match is ambiguous.
    async fn resolve(&self, token: &str, source: &DocumentId) -> Option<DocumentId>;
}

/// User-facing message sink.
pub trait Notifier: Send + Sync {
    /// Show a message to the user.
    fn notify(&self, message: &str);
}

/// Something the scheduler can ask to run a scan.
#[async_trait]
pub trait ScanRunner: Send + Sync {
    /// Run a scan over `scope`, returning whether anything changed.
    async fn run_scan(&self, scope: ScanScope) -> bool;
}

/// Notifier that drops every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _message: &str) {}
}
