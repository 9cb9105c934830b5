//! Document scan orchestration.
//!
//! A scan walks its working set, extracts same-line reference groups, resolves
//! each token and merges the sibling literals into every resolved target.
//! Failures stay local. A failing target loses only that merge, and a source
//! document that cannot be read is skipped while the scan carries on.

use crate::config::{ScanRules, SiblingConfig};
use crate::error::{ScanError, ScanResult, StoreError, StoreResult};
use crate::extract::extract_references;
use crate::frontmatter::split_frontmatter;
use crate::merge::merge_siblings;
use crate::siblings::compute_sibling_sets;
use crate::traits::{DocumentStore, LinkResolver};
use crate::types::{DocumentId, ScanScope};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A document whose processing failed during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentFailure {
    /// Document that was being processed.
    pub document: DocumentId,
    /// Rendered error.
    pub error: String,
}

impl DocumentFailure {
    fn new(document: DocumentId, error: &StoreError) -> Self {
        Self {
            document,
            error: error.to_string(),
        }
    }
}

/// Outcome of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Whether any merge wrote to a document.
    pub changed: bool,
    /// Eligible documents that were read.
    pub documents_scanned: usize,
    /// Lines holding two or more references.
    pub groups_found: usize,
    /// Mentions appended across all targets.
    pub mentions_added: usize,
    /// Tokens that did not resolve to a document.
    pub unresolved: usize,
    /// Documents whose metadata was written.
    pub updated: BTreeSet<DocumentId>,
    /// Per-document failures.
    pub failures: Vec<DocumentFailure>,
}

/// Runs scans against injected store and resolver collaborators.
#[derive(Clone)]
pub struct Scanner {
    store: Arc<dyn DocumentStore>,
    resolver: Arc<dyn LinkResolver>,
}

impl Scanner {
    /// Create a scanner.
    pub fn new(store: Arc<dyn DocumentStore>, resolver: Arc<dyn LinkResolver>) -> Self {
        Self { store, resolver }
    }

    /// Scan `scope` with the given configuration snapshot.
    ///
    /// Fails only when the configuration does not compile or the vault cannot
    /// be enumerated; in both cases nothing has been read or written.
    pub async fn scan(&self, scope: &ScanScope, config: &SiblingConfig) -> ScanResult<ScanReport> {
        let rules = config.compile()?;

        let working_set = match scope {
            ScanScope::Document(id) => vec![id.clone()],
            ScanScope::Vault => self
                .store
                .list_documents()
                .await
                .map_err(ScanError::Enumerate)?,
        };

        let mut report = ScanReport::default();
        for source in working_set
            .iter()
            .filter(|id| rules.filter.is_eligible(id))
        {
            report.documents_scanned += 1;
            if let Err(err) = self.scan_document(source, &rules, &mut report).await {
                warn!(document = %source, error = %err, "Skipping document");
                report.failures.push(DocumentFailure::new(source.clone(), &err));
            }
        }

        info!(
            scope = %scope,
            scanned = report.documents_scanned,
            groups = report.groups_found,
            added = report.mentions_added,
            failures = report.failures.len(),
            changed = report.changed,
            "Scan complete"
        );
        Ok(report)
    }

    async fn scan_document(
        &self,
        source: &DocumentId,
        rules: &ScanRules,
        report: &mut ScanReport,
    ) -> StoreResult<()> {
        debug!(document = %source, "Scanning document");
        let text = self.store.read_text(source).await?;
        let body = if rules.include_frontmatter {
            text.as_str()
        } else {
            split_frontmatter(&text).1
        };

        for line in body.lines() {
            let tokens: Vec<&str> = extract_references(line).collect();
            if tokens.len() < 2 {
                continue;
            }
            report.groups_found += 1;
            debug!(document = %source, tokens = ?tokens, "Found reference group");

            let mut targets = Vec::with_capacity(tokens.len());
            for token in &tokens {
                targets.push(self.resolver.resolve(token, source).await);
            }

            for set in compute_sibling_sets(&tokens) {
                let Some(target) = targets[set.index].as_ref() else {
                    debug!(document = %source, token = tokens[set.index], "Unresolved reference");
                    report.unresolved += 1;
                    continue;
                };

                // Tokens resolving to the target itself are not its siblings.
                let literals: Vec<&str> = set
                    .siblings
                    .iter()
                    .filter(|sibling| targets[sibling.index].as_ref() != Some(target))
                    .map(|sibling| sibling.literal.as_str())
                    .collect();
                if literals.is_empty() {
                    continue;
                }

                match merge_siblings(self.store.as_ref(), target, &literals, &rules.property).await
                {
                    Ok(added) if added.is_empty() => {}
                    Ok(added) => {
                        report.changed = true;
                        report.mentions_added += added.len();
                        report.updated.insert(target.clone());
                    }
                    Err(err) => {
                        if err.is_parse() {
                            warn!(document = %target, error = %err, "Skipping merge into malformed frontmatter");
                        } else {
                            warn!(document = %target, error = %err, "Failed to merge mentions");
                        }
                        report.failures.push(DocumentFailure::new(target.clone(), &err));
                    }
                }
            }
        }

        Ok(())
    }
}
