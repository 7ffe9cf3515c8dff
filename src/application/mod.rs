//! Application layer - the repricing scheduler and CLI commands

pub mod commands;
pub mod run_stats;
pub mod scheduler;

pub use run_stats::{RunResult, RunStats};
pub use scheduler::RepricingScheduler;
