//! Mock Implementations for Testing
//!
//! In-memory stand-ins for the collaborator traits. They are:
//!
//! - **Deterministic**: a document resolves by case-insensitive short name, or
//!   not at all when the name is shared
//! - **Observable**: every read, write and resolution is tracked
//! - **Configurable**: reads and writes can be made to fail per document
//!
//! # Example
//!
//! ```ignore
//! use siblink_core::test_support::mocks::MockDocumentStore;
//!
//! let store = MockDocumentStore::new()
//!     .with_document("2024-01-01.md", "Met [[Alice]] and [[Bob]]\n")
//!     .with_document("Alice.md", "")
//!     .with_document("Bob.md", "");
//! assert_eq!(store.stats().reads.len(), 0);
//! ```

use async_trait::async_trait;
use serde_yaml::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::traits::{DocumentStore, FrontmatterMutation, LinkResolver, Notifier, ScanRunner};
use crate::types::{DocumentId, Frontmatter, ScanScope};

// ============================================================================
// Mock Document Store
// ============================================================================

#[derive(Debug, Clone)]
struct MockDocument {
    body: String,
    /// `Err` holds the raw text of a malformed block.
    frontmatter: Result<Frontmatter, String>,
}

impl MockDocument {
    fn render(&self) -> String {
        match &self.frontmatter {
            Ok(mapping) if mapping.is_empty() => self.body.clone(),
            Ok(mapping) => format!(
                "---\n{}---\n{}",
                serde_yaml::to_string(mapping).unwrap_or_default(),
                self.body
            ),
            Err(raw) => format!("---\n{}\n---\n{}", raw, self.body),
        }
    }
}

/// Operation counters for [`MockDocumentStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockStoreStats {
    /// Number of enumerations.
    pub list_count: usize,
    /// Documents read, in order.
    pub reads: Vec<DocumentId>,
    /// Documents written, in order.
    pub writes: Vec<DocumentId>,
    /// Number of resolution requests.
    pub resolve_count: usize,
}

#[derive(Debug, Default)]
struct MockState {
    documents: BTreeMap<DocumentId, MockDocument>,
    failing_reads: BTreeSet<DocumentId>,
    failing_writes: BTreeSet<DocumentId>,
    failing_list: bool,
    stats: MockStoreStats,
}

/// In-memory document store and resolver.
#[derive(Debug, Default)]
pub struct MockDocumentStore {
    state: Mutex<MockState>,
}

impl MockDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_document(self, id: impl Into<DocumentId>, body: &str) -> Self {
        self.insert(id, body);
        self
    }

    /// Add a document without frontmatter.
    pub fn insert(&self, id: impl Into<DocumentId>, body: &str) {
        self.put(id.into(), body, Ok(Frontmatter::new()));
    }

    /// Add a document with a YAML frontmatter block.
    ///
    /// # Panics
    ///
    /// Panics if `yaml` is not a mapping.
    pub fn insert_with_frontmatter(&self, id: impl Into<DocumentId>, yaml: &str, body: &str) {
        let mapping: Frontmatter =
            serde_yaml::from_str(yaml).expect("mock frontmatter must be a YAML mapping");
        self.put(id.into(), body, Ok(mapping));
    }

    /// Add a document whose frontmatter block is malformed.
    pub fn insert_malformed(&self, id: impl Into<DocumentId>, raw: &str, body: &str) {
        self.put(id.into(), body, Err(raw.to_string()));
    }

    /// Replace a document's body, keeping its frontmatter.
    pub fn set_body(&self, id: impl Into<DocumentId>, body: &str) {
        let id = id.into();
        let mut state = self.lock();
        if let Some(doc) = state.documents.get_mut(&id) {
            doc.body = body.to_string();
        }
    }

    /// Make every read of `id` fail with an IO error, including the read
    /// half of a frontmatter update.
    pub fn fail_reads(&self, id: impl Into<DocumentId>) {
        self.lock().failing_reads.insert(id.into());
    }

    /// Make every frontmatter write to `id` fail with an IO error.
    pub fn fail_writes(&self, id: impl Into<DocumentId>) {
        self.lock().failing_writes.insert(id.into());
    }

    /// Make enumeration fail.
    pub fn fail_list(&self) {
        self.lock().failing_list = true;
    }

    /// Current frontmatter of a document, if present and well-formed.
    pub fn frontmatter(&self, id: impl Into<DocumentId>) -> Option<Frontmatter> {
        let id = id.into();
        self.lock()
            .documents
            .get(&id)
            .and_then(|doc| doc.frontmatter.as_ref().ok().cloned())
    }

    /// String entries of a list-valued property (empty if absent).
    pub fn property_list(&self, id: impl Into<DocumentId>, property: &str) -> Vec<String> {
        self.frontmatter(id)
            .and_then(|fm| fm.get(property).and_then(Value::as_sequence).cloned())
            .unwrap_or_default()
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    /// Full rendered text of a document.
    pub fn text(&self, id: impl Into<DocumentId>) -> Option<String> {
        let id = id.into();
        self.lock().documents.get(&id).map(MockDocument::render)
    }

    /// Snapshot of the operation counters.
    pub fn stats(&self) -> MockStoreStats {
        self.lock().stats.clone()
    }

    /// Reset the operation counters.
    pub fn reset_stats(&self) {
        self.lock().stats = MockStoreStats::default();
    }

    fn put(&self, id: DocumentId, body: &str, frontmatter: Result<Frontmatter, String>) {
        self.lock().documents.insert(
            id,
            MockDocument {
                body: body.to_string(),
                frontmatter,
            },
        );
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn io_error(id: &DocumentId) -> StoreError {
        StoreError::Io {
            id: id.clone(),
            source: std::io::Error::other("injected failure"),
        }
    }
}

#[async_trait]
impl DocumentStore for MockDocumentStore {
    async fn list_documents(&self) -> StoreResult<Vec<DocumentId>> {
        let mut state = self.lock();
        state.stats.list_count += 1;
        if state.failing_list {
            return Err(Self::io_error(&DocumentId::new("")));
        }
        Ok(state.documents.keys().cloned().collect())
    }

    async fn read_text(&self, id: &DocumentId) -> StoreResult<String> {
        let mut state = self.lock();
        state.stats.reads.push(id.clone());
        if state.failing_reads.contains(id) {
            return Err(Self::io_error(id));
        }
        state
            .documents
            .get(id)
            .map(MockDocument::render)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn process_frontmatter(
        &self,
        id: &DocumentId,
        mutate: FrontmatterMutation<'_>,
    ) -> StoreResult<bool> {
        let mut state = self.lock();
        if state.failing_reads.contains(id) {
            return Err(Self::io_error(id));
        }
        let failing = state.failing_writes.contains(id);
        let doc = state
            .documents
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let mut mapping = match &doc.frontmatter {
            Ok(mapping) => mapping.clone(),
            Err(raw) => {
                return Err(StoreError::Parse {
                    id: id.clone(),
                    message: format!("cannot parse '{}'", raw),
                })
            }
        };

        if !mutate(&mut mapping) {
            return Ok(false);
        }
        if failing {
            return Err(Self::io_error(id));
        }
        doc.frontmatter = Ok(mapping);
        state.stats.writes.push(id.clone());
        Ok(true)
    }
}

#[async_trait]
impl LinkResolver for MockDocumentStore {
    async fn resolve(&self, token: &str, _source: &DocumentId) -> Option<DocumentId> {
        let mut state = self.lock();
        state.stats.resolve_count += 1;
        let name = token.split('#').next().unwrap_or(token).to_lowercase();
        let mut matches = state
            .documents
            .keys()
            .filter(|id| id.short_name().to_lowercase() == name);
        match (matches.next(), matches.next()) {
            (Some(id), None) => Some(id.clone()),
            _ => None,
        }
    }
}

// ============================================================================
// Mock Notifier
// ============================================================================

/// Notifier that records every message.
#[derive(Debug, Default)]
pub struct MockNotifier {
    messages: Mutex<Vec<String>>,
}

impl MockNotifier {
    /// Create an empty notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages received so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl Notifier for MockNotifier {
    fn notify(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}

// ============================================================================
// Counting Scan Runner
// ============================================================================

/// Scan runner that records the scopes it was asked to scan.
#[derive(Debug, Default)]
pub struct CountingRunner {
    scopes: Mutex<Vec<ScanScope>>,
}

impl CountingRunner {
    /// Create a runner with no recorded calls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scopes scanned so far, in order.
    pub fn scopes(&self) -> Vec<ScanScope> {
        self.scopes.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Number of scans run.
    pub fn call_count(&self) -> usize {
        self.scopes().len()
    }
}

#[async_trait]
impl ScanRunner for CountingRunner {
    async fn run_scan(&self, scope: ScanScope) -> bool {
        if let Ok(mut scopes) = self.scopes.lock() {
            scopes.push(scope);
        }
        false
    }
}
