//! Link target index.
//!
//! Maps the names a `[[reference]]` can use onto vault documents. A Markdown
//! document is reachable by its file name with or without the extension; any
//! other file only by its full file name. Matching is case-insensitive.
//!
//! Resolution of a token:
//!
//! 1. Drop any `#heading` or `#^block` suffix.
//! 2. Collect documents whose name matches the final path segment. If the
//!    token contains `/`, keep only documents whose path ends with it.
//! 3. One candidate wins outright. With several, the single candidate in the
//!    referencing document's folder wins. Anything else is ambiguous and does
//!    not resolve.

use siblink_core::DocumentId;
use std::collections::HashMap;

/// Case-insensitive name index over the files of a vault.
#[derive(Debug, Clone, Default)]
pub struct LinkIndex {
    text_extension: String,
    by_name: HashMap<String, Vec<DocumentId>>,
    len: usize,
}

impl LinkIndex {
    /// Create an empty index. Files with `text_extension` are also reachable
    /// without it.
    pub fn new(text_extension: impl Into<String>) -> Self {
        Self {
            text_extension: text_extension.into(),
            ..Default::default()
        }
    }

    /// Build an index over `documents`.
    pub fn from_documents<I>(text_extension: impl Into<String>, documents: I) -> Self
    where
        I: IntoIterator<Item = DocumentId>,
    {
        let mut index = Self::new(text_extension);
        for id in documents {
            index.insert(id);
        }
        index
    }

    /// Number of indexed files.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Add a file. Returns `false` if it was already indexed.
    pub fn insert(&mut self, id: DocumentId) -> bool {
        let entries = self.by_name.entry(id.file_name().to_lowercase()).or_default();
        if entries.contains(&id) {
            return false;
        }
        entries.push(id.clone());

        if self.is_text(&id) {
            self.by_name
                .entry(id.short_name().to_lowercase())
                .or_default()
                .push(id);
        }
        self.len += 1;
        true
    }

    /// Remove a file. Returns `false` if it was not indexed.
    pub fn remove(&mut self, id: &DocumentId) -> bool {
        let mut removed = false;
        let mut keys = vec![id.file_name().to_lowercase()];
        if self.is_text(id) {
            keys.push(id.short_name().to_lowercase());
        }
        for key in keys {
            if let Some(entries) = self.by_name.get_mut(&key) {
                let before = entries.len();
                entries.retain(|entry| entry != id);
                removed |= entries.len() != before;
                if entries.is_empty() {
                    self.by_name.remove(&key);
                }
            }
        }
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// Resolve a reference token written in `source`.
    pub fn resolve(&self, token: &str, source: &DocumentId) -> Option<DocumentId> {
        let target = token.split('#').next().unwrap_or(token).trim();
        let needle = target.trim_start_matches('/').to_lowercase();
        if needle.is_empty() {
            return None;
        }
        let name = needle.rsplit('/').next().unwrap_or(&needle);

        let candidates: Vec<&DocumentId> = self
            .by_name
            .get(name)?
            .iter()
            .filter(|id| !needle.contains('/') || self.path_matches(id, &needle))
            .collect();

        match candidates.as_slice() {
            [] => None,
            [only] => Some((*only).clone()),
            several => {
                let mut local = several.iter().filter(|id| id.folder() == source.folder());
                match (local.next(), local.next()) {
                    (Some(id), None) => Some((*id).clone()),
                    _ => None,
                }
            }
        }
    }

    fn is_text(&self, id: &DocumentId) -> bool {
        id.extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.text_extension))
    }

    fn path_matches(&self, id: &DocumentId, needle: &str) -> bool {
        let full = id.as_str().to_lowercase();
        let mut forms = vec![full.as_str()];
        let suffix = format!(".{}", self.text_extension.to_lowercase());
        if self.is_text(id) {
            if let Some(stem) = full.strip_suffix(&suffix) {
                forms.push(stem);
            }
        }
        forms.iter().any(|form| {
            *form == needle
                || form
                    .strip_suffix(needle)
                    .is_some_and(|prefix| prefix.ends_with('/'))
        })
    }
}
