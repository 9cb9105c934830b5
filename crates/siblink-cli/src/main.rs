use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use siblink_cli::{
    cli::{Cli, Commands},
    commands,
    config::CliConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG, when set, refines the level chosen on the command line
    let env_filter = EnvFilter::builder()
        .with_default_directive(cli.level_filter().into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Scan {
            vault,
            document,
            format,
        } => {
            let config = CliConfig::load(cli.config, vault)?;
            commands::scan::execute(config, document, format).await?
        }

        Commands::Watch {
            vault,
            no_initial_scan,
        } => {
            let config = CliConfig::load(cli.config, vault)?;
            commands::watch::execute(config, !no_initial_scan).await?
        }

        Commands::Init { force } => commands::init::execute(cli.config, force)?,
    }

    Ok(())
}
