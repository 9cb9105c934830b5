//! # siblink vault
//!
//! A directory of Markdown files as a `siblink-core` document store.
//!
//! - [`FsVault`] enumerates documents, reads them and rewrites their YAML
//!   frontmatter in place, and resolves `[[references]]` through a
//!   [`LinkIndex`].
//! - [`VaultWatcher`] turns file system notifications into
//!   [`ChangeEvent`](siblink_core::ChangeEvent)s for the scheduler.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod frontmatter;
pub mod index;
pub mod store;
pub mod watcher;

pub use error::{Result, VaultError};
pub use frontmatter::ParsedDocument;
pub use index::LinkIndex;
pub use store::FsVault;
pub use watcher::VaultWatcher;
