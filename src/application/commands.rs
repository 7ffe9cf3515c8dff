//! CLI commands and handlers
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::application::{RepricingScheduler, RunStats};
use crate::config::RepricerConfig;
use crate::infrastructure::{CatalogSnapshot, LogNotifier, MemoryCatalogStore};
use crate::shared::errors::AppError;

#[derive(Parser)]
#[command(name = "repricer")]
#[command(version, about = "Automatic repricing control loop for catalog items")]
pub struct Cli {
    /// Path to config file (optional, defaults apply otherwise)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. "info" or "repricer=debug"
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the repricing loop until Ctrl-C
    Run {
        /// JSON catalog snapshot to load
        #[arg(long)]
        catalog: PathBuf,

        /// Seconds between passes (overrides config)
        #[arg(short, long)]
        interval_secs: Option<u64>,

        /// Items fetched per owner per pass (overrides config)
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Run a single pass and print the result
    Once {
        /// JSON catalog snapshot to load
        #[arg(long)]
        catalog: PathBuf,

        /// Only reprice this owner's items
        #[arg(short, long)]
        owner: Option<String>,

        /// Items fetched per owner per pass (overrides config)
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Load and validate a config file
    CheckConfig,
}

pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute the selected command
    pub async fn execute(command: Commands, config: RepricerConfig) -> Result<(), AppError> {
        match command {
            Commands::Run { catalog, interval_secs, page_size } => {
                let config = Self::with_overrides(config, interval_secs, page_size)?;
                Self::execute_run_command(catalog, config).await
            }
            Commands::Once { catalog, owner, page_size } => {
                let config = Self::with_overrides(config, None, page_size)?;
                Self::execute_once_command(catalog, owner, config).await
            }
            Commands::CheckConfig => Self::execute_check_config_command(config),
        }
    }

    /// CLI flags win over the config file
    fn with_overrides(
        mut config: RepricerConfig,
        interval_secs: Option<u64>,
        page_size: Option<usize>,
    ) -> Result<RepricerConfig, AppError> {
        if let Some(interval_secs) = interval_secs {
            config.scheduler.interval_secs = interval_secs;
        }
        if let Some(page_size) = page_size {
            config.scheduler.page_size = page_size;
        }
        config.validate()?;
        Ok(config)
    }

    fn build_scheduler(catalog: PathBuf, config: &RepricerConfig) -> Result<RepricingScheduler, AppError> {
        info!("📦 Loading catalog from {}", catalog.display());
        let store: MemoryCatalogStore = CatalogSnapshot::from_file(&catalog)?.into_store()?;
        RepricingScheduler::new(Arc::new(store), Arc::new(LogNotifier), config)
    }

    async fn execute_run_command(catalog: PathBuf, config: RepricerConfig) -> Result<(), AppError> {
        let scheduler = Self::build_scheduler(catalog, &config)?;
        scheduler.start(config.scheduler.interval()).await?;

        let mut report = tokio::time::interval(config.scheduler.interval().max(Duration::from_secs(1)));
        // Skip the immediate tick, the first pass is still running
        report.tick().await;
        loop {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    if let Err(e) = signal {
                        warn!("⚠️ Failed to listen for Ctrl-C: {}", e);
                    }
                    break;
                }
                _ = report.tick() => {
                    let stats = scheduler.stats().await;
                    info!(
                        passes = stats.total_updates_ever,
                        succeeded = stats.succeeded,
                        failed = stats.failed,
                        "📊 Repricing stats"
                    );
                }
            }
        }

        scheduler.stop().await;
        Self::print_stats(&scheduler.stats().await)
    }

    async fn execute_once_command(
        catalog: PathBuf,
        owner: Option<String>,
        config: RepricerConfig,
    ) -> Result<(), AppError> {
        let scheduler = Self::build_scheduler(catalog, &config)?;
        let result = scheduler.run_once(owner.as_deref()).await;

        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| AppError::Unknown(format!("Failed to encode result: {}", e)))?;
        println!("{}", json);
        Self::print_stats(&scheduler.stats().await)
    }

    fn execute_check_config_command(config: RepricerConfig) -> Result<(), AppError> {
        config.validate()?;
        let rendered = toml::to_string_pretty(&config)
            .map_err(|e| AppError::ConfigError(format!("Failed to render config: {}", e)))?;
        println!("{}", rendered);
        info!("✅ Configuration is valid");
        Ok(())
    }

    fn print_stats(stats: &RunStats) -> Result<(), AppError> {
        let json = stats
            .to_json()
            .map_err(|e| AppError::Unknown(format!("Failed to encode stats: {}", e)))?;
        println!("{}", json);
        Ok(())
    }
}
