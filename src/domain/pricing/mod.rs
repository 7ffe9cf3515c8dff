//! Pricing domain - candidate price recommendation and safety checks

mod price_recommender;
mod safety_gate;

pub use price_recommender::{PriceRecommender, Recommendation};
pub use safety_gate::{SafetyGate, SafetyRejection};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::shared::types::{Money, Ratio};
use crate::shared::utils;

/// Thresholds shared by the update predicate and the safety gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingThresholds {
    /// Largest relative move allowed in one step
    pub max_change_ratio: Ratio,
    /// Smallest margin over cost allowed, relative to the new price
    pub min_margin_ratio: Ratio,
    /// Relative difference below which the item is left alone
    pub update_threshold_ratio: Ratio,
}

impl Default for PricingThresholds {
    fn default() -> Self {
        Self {
            max_change_ratio: dec!(0.30),
            min_margin_ratio: dec!(0.05),
            update_threshold_ratio: dec!(0.05),
        }
    }
}

impl PricingThresholds {
    /// Strictly above the update threshold counts as "needs update".
    ///
    /// A non-positive current price always needs an update when the
    /// candidate is positive; the safety gate decides whether it lands.
    pub fn needs_update(&self, current_price: Money, candidate_price: Money) -> bool {
        match utils::relative_change(current_price, candidate_price) {
            Some(change) => change > self.update_threshold_ratio,
            None => candidate_price > Decimal::ZERO,
        }
    }
}

/// Multipliers applied by the strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyFactors {
    /// Applied to the cheapest competitor price
    pub aggressive_factor: Decimal,
    /// Applied to the average competitor price
    pub premium_factor: Decimal,
}

impl Default for StrategyFactors {
    fn default() -> Self {
        Self {
            aggressive_factor: dec!(0.95),
            premium_factor: dec!(1.10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_update_threshold_is_strict() {
        let thresholds = PricingThresholds::default();
        assert!(!thresholds.needs_update(dec!(100), dec!(100)));
        assert!(!thresholds.needs_update(dec!(100), dec!(105)));
        assert!(thresholds.needs_update(dec!(100), dec!(105.01)));
        assert!(thresholds.needs_update(dec!(100), dec!(90)));
    }

    #[test]
    fn test_needs_update_with_zero_current_price() {
        let thresholds = PricingThresholds::default();
        assert!(thresholds.needs_update(dec!(0), dec!(10)));
        assert!(!thresholds.needs_update(dec!(0), dec!(0)));
    }
}
