use anyhow::{Context, Result};
use colored::Colorize;
use siblink_core::{Scheduler, SchedulerSettings};
use siblink_vault::VaultWatcher;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::CliConfig;

pub async fn execute(config: CliConfig, initial_scan: bool) -> Result<()> {
    let (vault, linker) = super::open_linker(&config).await?;

    if initial_scan {
        info!("Running initial scan");
        linker.trigger_full_scan().await;
    }

    let settings = SchedulerSettings::from_config(&config.linker);
    let scheduler = Scheduler::spawn(linker.clone(), settings);
    let handle = scheduler.handle();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let watcher = VaultWatcher::start(vault.root(), tx).context("Failed to start watching")?;

    println!(
        "{} {} (Ctrl-C to stop)",
        "Watching".green().bold(),
        vault.root().display()
    );

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                vault.apply_change(&event);
                if !handle.notify_changed(event) {
                    break;
                }
            }
            signal = &mut ctrl_c => {
                signal.context("Failed to listen for Ctrl-C")?;
                debug!("Interrupted");
                break;
            }
        }
    }

    watcher.stop();
    scheduler.shutdown().await;
    println!("{}", "Stopped".yellow().bold());
    Ok(())
}
