use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use repricer::application::commands::{Cli, CommandExecutor};
use repricer::config::RepricerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --log-level when set
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&cli.log_level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Priority: CLI args > Config file > Defaults
    let config = match &cli.config {
        Some(path) => RepricerConfig::from_file(path)?,
        None => RepricerConfig::default(),
    };

    CommandExecutor::execute(cli.command, config).await?;
    Ok(())
}
