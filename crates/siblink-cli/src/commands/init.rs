use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::config::CliConfig;

pub fn execute(config_path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match config_path {
        Some(path) => path,
        None => CliConfig::default_config_path()?,
    };

    if path.exists() && !force {
        println!(
            "{} Config already exists at {}. No changes made (use --force to overwrite).",
            "Info:".cyan().bold(),
            path.display()
        );
        return Ok(());
    }

    CliConfig::create_example(&path)?;
    println!(
        "{} Wrote example config to {}",
        "Success:".green().bold(),
        path.display()
    );
    Ok(())
}
