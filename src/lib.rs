//! Repricer - automatic repricing control loop
//! Built with Domain-Driven Design principles

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod shared;

// Re-export main types for convenience
pub use application::{RepricingScheduler, RunResult, RunStats};
pub use config::RepricerConfig;
pub use domain::catalog::CatalogStore;
pub use domain::notification::PriceChangeNotifier;
pub use domain::pricing::{PriceRecommender, SafetyGate};
