//! Host-facing entry points.

use crate::config::SiblingConfig;
use crate::error::ScanError;
use crate::scan::{ScanReport, Scanner};
use crate::traits::{DocumentStore, LinkResolver, Notifier, ScanRunner};
use crate::types::{DocumentId, ScanScope};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::warn;

/// The sibling linker as seen by a host.
///
/// Holds the current configuration snapshot. [`update_config`] swaps it
/// atomically; scans already running keep the snapshot they started with.
///
/// [`update_config`]: SiblingLinker::update_config
pub struct SiblingLinker {
    scanner: Scanner,
    notifier: Arc<dyn Notifier>,
    config: RwLock<Arc<SiblingConfig>>,
}

impl SiblingLinker {
    /// Create a linker over the given collaborators.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        resolver: Arc<dyn LinkResolver>,
        notifier: Arc<dyn Notifier>,
        config: SiblingConfig,
    ) -> Self {
        Self {
            scanner: Scanner::new(store, resolver),
            notifier,
            config: RwLock::new(Arc::new(config)),
        }
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<SiblingConfig> {
        self.config.read().clone()
    }

    /// Replace the configuration used by subsequent scans.
    pub fn update_config(&self, config: SiblingConfig) {
        *self.config.write() = Arc::new(config);
    }

    /// Scan with the current snapshot, returning the full report.
    pub async fn scan(&self, scope: ScanScope) -> Result<ScanReport, ScanError> {
        let config = self.config();
        self.scanner.scan(&scope, &config).await
    }

    /// Scan one document. Returns whether anything changed.
    pub async fn trigger_scoped_scan(&self, id: DocumentId) -> bool {
        self.run(ScanScope::Document(id)).await
    }

    /// Scan the whole vault. Returns whether anything changed.
    pub async fn trigger_full_scan(&self) -> bool {
        self.run(ScanScope::Vault).await
    }

    async fn run(&self, scope: ScanScope) -> bool {
        let config = self.config();
        match self.scanner.scan(&scope, &config).await {
            Ok(report) => {
                if report.changed && config.notify_on_change {
                    self.notifier.notify(&format!(
                        "Sibling links updated: {} mention(s) added to {} note(s)",
                        report.mentions_added,
                        report.updated.len()
                    ));
                }
                report.changed
            }
            Err(err) => {
                warn!(scope = %scope, error = %err, "Scan aborted");
                self.notifier.notify(&format!("Sibling linker: {}", err));
                false
            }
        }
    }
}

#[async_trait]
impl ScanRunner for SiblingLinker {
    async fn run_scan(&self, scope: ScanScope) -> bool {
        self.run(scope).await
    }
}
