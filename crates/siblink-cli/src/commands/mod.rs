pub mod init;
pub mod scan;
pub mod watch;

use crate::config::CliConfig;
use crate::notifier::ConsoleNotifier;
use anyhow::{Context, Result};
use siblink_core::SiblingLinker;
use siblink_vault::FsVault;
use std::sync::Arc;

/// Open the configured vault and wire a linker over it.
pub(crate) async fn open_linker(config: &CliConfig) -> Result<(Arc<FsVault>, Arc<SiblingLinker>)> {
    let vault = FsVault::open(&config.vault.path, config.linker.text_extension.clone())
        .await
        .with_context(|| format!("Failed to open vault at {}", config.vault.path.display()))?;
    let vault = Arc::new(vault);

    let linker = SiblingLinker::new(
        vault.clone(),
        vault.clone(),
        Arc::new(ConsoleNotifier),
        config.linker.clone(),
    );
    Ok((vault, Arc::new(linker)))
}
