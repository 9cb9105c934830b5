use anyhow::{Context, Result};
use colored::Colorize;
use siblink_core::{DocumentId, ScanReport, ScanScope};
use siblink_vault::FsVault;
use std::path::Path;
use std::path::PathBuf;

use crate::cli::OutputFormat;
use crate::config::CliConfig;

pub async fn execute(
    config: CliConfig,
    document: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let (vault, linker) = super::open_linker(&config).await?;

    let scope = match document {
        Some(path) => ScanScope::Document(document_id(&vault, &path)?),
        None => ScanScope::Vault,
    };

    let report = linker.scan(scope).await?;

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialize report")?
            );
        }
        OutputFormat::Text => print!("{}", render_text(&report)),
    }
    Ok(())
}

/// Identity of a note given on the command line.
///
/// Relative paths are taken from the vault root; absolute paths must lie
/// inside it.
fn document_id(vault: &FsVault, path: &Path) -> Result<DocumentId> {
    let absolute = if path.is_absolute() {
        std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    } else {
        vault.root().join(path)
    };
    vault.document_id(&absolute).with_context(|| {
        format!(
            "{} is not a note inside {}",
            path.display(),
            vault.root().display()
        )
    })
}

fn render_text(report: &ScanReport) -> String {
    let mut out = format!(
        "Scanned {} note(s): {} reference group(s), {} mention(s) added\n",
        report.documents_scanned, report.groups_found, report.mentions_added
    );

    if report.changed {
        out.push_str(&format!("{}\n", "Updated:".green().bold()));
        for id in &report.updated {
            out.push_str(&format!("  {}\n", id));
        }
    } else {
        out.push_str("No changes\n");
    }

    if report.unresolved > 0 {
        out.push_str(&format!(
            "{} {} reference(s) did not resolve to a note\n",
            "Note:".blue().bold(),
            report.unresolved
        ));
    }

    if !report.failures.is_empty() {
        out.push_str(&format!("{}\n", "Failures:".red().bold()));
        for failure in &report.failures {
            out.push_str(&format!("  {}: {}\n", failure.document, failure.error));
        }
    }
    out
}
