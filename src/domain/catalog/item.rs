//! Catalog item and its pricing strategy

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shared::types::{ItemId, Money, OwnerId};

/// How the recommender positions an item against its competitors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum PricingStrategy {
    /// Undercut the cheapest competitor
    Aggressive,
    /// Sit above the market average
    Premium,
    /// Track the market average
    #[default]
    Balanced,
}

impl PricingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingStrategy::Aggressive => "aggressive",
            PricingStrategy::Premium => "premium",
            PricingStrategy::Balanced => "balanced",
        }
    }
}

impl fmt::Display for PricingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PricingStrategy {
    type Err = std::convert::Infallible;

    /// Unknown values fall back to `Balanced`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "aggressive" => PricingStrategy::Aggressive,
            "premium" => PricingStrategy::Premium,
            _ => PricingStrategy::Balanced,
        })
    }
}

impl From<String> for PricingStrategy {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(strategy) => strategy,
            Err(never) => match never {},
        }
    }
}

/// Owned catalog product.
///
/// Bounds and cost are optional in practice: a value of zero means "not set".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub owner_id: OwnerId,
    #[serde(default)]
    pub name: String,
    pub current_price: Money,
    #[serde(default)]
    pub cost_price: Money,
    #[serde(default)]
    pub min_price: Money,
    #[serde(default)]
    pub max_price: Money,
    /// Last computed recommendation, may be stale
    #[serde(default)]
    pub recommended_price: Option<Money>,
    #[serde(default)]
    pub auto_pricing_enabled: bool,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub strategy: PricingStrategy,
}

fn default_active() -> bool {
    true
}

impl Item {
    pub fn new(id: impl Into<ItemId>, owner_id: impl Into<OwnerId>, current_price: Money) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            name: String::new(),
            current_price,
            cost_price: Decimal::ZERO,
            min_price: Decimal::ZERO,
            max_price: Decimal::ZERO,
            recommended_price: None,
            auto_pricing_enabled: true,
            active: true,
            strategy: PricingStrategy::Balanced,
        }
    }

    pub fn with_cost(mut self, cost_price: Money) -> Self {
        self.cost_price = cost_price;
        self
    }

    pub fn with_bounds(mut self, min_price: Money, max_price: Money) -> Self {
        self.min_price = min_price;
        self.max_price = max_price;
        self
    }

    pub fn with_strategy(mut self, strategy: PricingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Lower bound, if one is set
    pub fn min_bound(&self) -> Option<Money> {
        (self.min_price > Decimal::ZERO).then_some(self.min_price)
    }

    /// Upper bound, if one is set
    pub fn max_bound(&self) -> Option<Money> {
        (self.max_price > Decimal::ZERO).then_some(self.max_price)
    }

    /// Cost basis, if one is set
    pub fn cost_basis(&self) -> Option<Money> {
        (self.cost_price > Decimal::ZERO).then_some(self.cost_price)
    }

    /// Active and opted into automatic pricing
    pub fn is_eligible(&self) -> bool {
        self.active && self.auto_pricing_enabled
    }

    /// Checks the `min <= max` invariant when both bounds are set
    pub fn validate_bounds(&self) -> Result<(), String> {
        if let (Some(min), Some(max)) = (self.min_bound(), self.max_bound()) {
            if min > max {
                return Err(format!(
                    "item {}: min price {} exceeds max price {}",
                    self.id, min, max
                ));
            }
        }
        Ok(())
    }

    /// Whether `price` respects every bound that is set
    pub fn within_bounds(&self, price: Money) -> bool {
        self.min_bound().map_or(true, |min| price >= min)
            && self.max_bound().map_or(true, |max| price <= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_strategy_parsing_falls_back_to_balanced() {
        assert_eq!("aggressive".parse::<PricingStrategy>().unwrap(), PricingStrategy::Aggressive);
        assert_eq!(" Premium ".parse::<PricingStrategy>().unwrap(), PricingStrategy::Premium);
        assert_eq!("loss-leader".parse::<PricingStrategy>().unwrap(), PricingStrategy::Balanced);
    }

    #[test]
    fn test_item_deserializes_unknown_strategy() {
        let json = r#"{
            "id": "sku-1",
            "ownerId": "owner-1",
            "currentPrice": "100",
            "strategy": "mystery"
        }"#;
        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.strategy, PricingStrategy::Balanced);
        assert!(item.active);
        assert!(!item.auto_pricing_enabled);
        assert_eq!(item.min_bound(), None);
    }

    #[test]
    fn test_bounds_validation() {
        let item = Item::new("sku-1", "owner-1", dec!(100)).with_bounds(dec!(150), dec!(90));
        assert!(item.validate_bounds().is_err());

        let item = Item::new("sku-1", "owner-1", dec!(100)).with_bounds(dec!(90), dec!(0));
        assert!(item.validate_bounds().is_ok());
        assert!(item.within_bounds(dec!(1000)));
        assert!(!item.within_bounds(dec!(89.99)));
    }
}
