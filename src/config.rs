use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

use crate::domain::pricing::{PricingThresholds, StrategyFactors};
use crate::shared::errors::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerCfg {
    pub interval_secs: u64,
    /// Items fetched per owner per pass
    pub page_size: usize,
    pub owner_concurrency: usize,
    pub item_concurrency: usize,
    /// Concurrent catalog store calls across the whole pass
    pub store_concurrency: usize,
    pub notify_timeout_ms: u64,
    /// Recorded as `changed_by` on ledger entries
    pub changed_by: String,
}

impl Default for SchedulerCfg {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            page_size: 1000,
            owner_concurrency: 4,
            item_concurrency: 8,
            store_concurrency: 16,
            notify_timeout_ms: 5000,
            changed_by: "auto-pricing".to_string(),
        }
    }
}

impl SchedulerCfg {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_millis(self.notify_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepricerConfig {
    pub scheduler: SchedulerCfg,
    pub safety: PricingThresholds,
    pub strategy: StrategyFactors,
}

impl RepricerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path.as_ref())
            .with_context(|| format!("read {}", path.as_ref().display()))?;
        Self::from_toml_str(&s)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(s).context("parse repricer config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let s = &self.scheduler;
        if s.interval_secs == 0 {
            return Err(AppError::ConfigError("scheduler.interval_secs must be positive".into()));
        }
        for (name, value) in [
            ("page_size", s.page_size),
            ("owner_concurrency", s.owner_concurrency),
            ("item_concurrency", s.item_concurrency),
            ("store_concurrency", s.store_concurrency),
        ] {
            if value == 0 {
                return Err(AppError::ConfigError(format!("scheduler.{} must be positive", name)));
            }
        }
        if s.notify_timeout_ms == 0 {
            return Err(AppError::ConfigError("scheduler.notify_timeout_ms must be positive".into()));
        }

        let max_change = self.safety.max_change_ratio;
        if max_change <= Decimal::ZERO || max_change > Decimal::ONE {
            return Err(AppError::ConfigError(format!(
                "safety.max_change_ratio must be in (0, 1], got {}",
                max_change
            )));
        }
        // Zero is allowed: no margin floor, or update on any difference
        for (name, ratio) in [
            ("min_margin_ratio", self.safety.min_margin_ratio),
            ("update_threshold_ratio", self.safety.update_threshold_ratio),
        ] {
            if ratio < Decimal::ZERO || ratio > Decimal::ONE {
                return Err(AppError::ConfigError(format!(
                    "safety.{} must be in [0, 1], got {}",
                    name, ratio
                )));
            }
        }

        for (name, factor) in [
            ("aggressive_factor", self.strategy.aggressive_factor),
            ("premium_factor", self.strategy.premium_factor),
        ] {
            if factor <= Decimal::ZERO {
                return Err(AppError::ConfigError(format!(
                    "strategy.{} must be positive, got {}",
                    name, factor
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = RepricerConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, RepricerConfig::default());
        assert_eq!(cfg.scheduler.interval(), Duration::from_secs(300));
        assert_eq!(cfg.scheduler.page_size, 1000);
        assert_eq!(cfg.safety.max_change_ratio, dec!(0.30));
        assert_eq!(cfg.safety.min_margin_ratio, dec!(0.05));
        assert_eq!(cfg.safety.update_threshold_ratio, dec!(0.05));
    }

    #[test]
    fn test_partial_config_overrides() {
        let cfg = RepricerConfig::from_toml_str(
            r#"
            [scheduler]
            interval_secs = 60
            page_size = 250

            [safety]
            max_change_ratio = 0.25

            [strategy]
            premium_factor = 1.5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.scheduler.interval_secs, 60);
        assert_eq!(cfg.scheduler.page_size, 250);
        assert_eq!(cfg.scheduler.owner_concurrency, 4);
        assert_eq!(cfg.safety.max_change_ratio, dec!(0.25));
        assert_eq!(cfg.safety.min_margin_ratio, dec!(0.05));
        assert_eq!(cfg.strategy.premium_factor, dec!(1.5));
        assert_eq!(cfg.strategy.aggressive_factor, dec!(0.95));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(RepricerConfig::from_toml_str("[scheduler]\ninterval_secs = 0").is_err());
        assert!(RepricerConfig::from_toml_str("[scheduler]\nstore_concurrency = 0").is_err());
        assert!(RepricerConfig::from_toml_str("[safety]\nmax_change_ratio = 1.5").is_err());
        assert!(RepricerConfig::from_toml_str("[safety]\nmax_change_ratio = 0").is_err());
        assert!(RepricerConfig::from_toml_str("[safety]\nmin_margin_ratio = -0.1").is_err());

        let mut cfg = RepricerConfig::default();
        cfg.strategy.aggressive_factor = dec!(0);
        assert!(matches!(cfg.validate(), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_zero_margin_and_threshold_are_allowed() {
        let cfg = RepricerConfig::from_toml_str(
            r#"
            [safety]
            min_margin_ratio = 0
            update_threshold_ratio = 0
            "#,
        )
        .unwrap();
        assert_eq!(cfg.safety.min_margin_ratio, dec!(0));
        assert_eq!(cfg.safety.update_threshold_ratio, dec!(0));
        assert!(cfg.safety.needs_update(dec!(100), dec!(100.01)));
        assert!(!cfg.safety.needs_update(dec!(100), dec!(100)));
    }
}
