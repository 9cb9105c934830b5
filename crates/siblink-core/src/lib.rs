//! # siblink core
//!
//! Infers "sibling" relationships between notes that are referenced together
//! on the same line, and records them in each referenced note's frontmatter.
//!
//! Given a daily note containing
//!
//! ```text
//! Met with [[Alice]] and [[Bob]]
//! ```
//!
//! a scan appends `[[Bob]]` to `Alice`'s `mentions` property and `[[Alice]]`
//! to `Bob`'s. Merges are idempotent: scanning again writes nothing.
//!
//! ## Architecture
//!
//! ```text
//! change event ─▶ Scheduler ─▶ SiblingLinker ─▶ Scanner
//!   (debounce)                  (config, notify)   │ per line:
//!                                                  ├─ extract_references
//!                                                  ├─ LinkResolver::resolve
//!                                                  ├─ compute_sibling_sets
//!                                                  └─ merge_siblings ─▶ DocumentStore
//! ```
//!
//! The document store, link resolver and notifier are collaborator traits
//! (see [`traits`]); `siblink-vault` implements them over a directory of
//! Markdown files.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod extract;
pub mod frontmatter;
pub mod linker;
pub mod merge;
pub mod scan;
pub mod scheduler;
pub mod siblings;
pub mod traits;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use config::{ChangeScope, EligibilityFilter, ScanRules, SiblingConfig};
pub use error::{ConfigError, ScanError, ScanResult, StoreError, StoreResult};
pub use extract::{extract_references, reference_literal};
pub use linker::SiblingLinker;
pub use merge::{merge_into, merge_siblings};
pub use scan::{DocumentFailure, ScanReport, Scanner};
pub use scheduler::{DebounceState, Scheduler, SchedulerHandle, SchedulerSettings};
pub use siblings::{compute_sibling_sets, Sibling, SiblingSet};
pub use traits::{DocumentStore, LinkResolver, Notifier, ScanRunner, SilentNotifier};
pub use types::{ChangeEvent, ChangeKind, DocumentId, Frontmatter, ScanScope};
