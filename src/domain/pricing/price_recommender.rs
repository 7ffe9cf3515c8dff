//! Candidate price computation from strategy and competitor data

use rust_decimal::Decimal;

use crate::domain::catalog::{CompetitorObservation, Item, PricingStrategy};
use crate::shared::types::Money;
use super::StrategyFactors;

/// Result of a recommendation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Recommendation {
    /// Derived from competitor data and clamped to the item's bounds
    Market(Money),
    /// No competitor data; the item's current price, unmodified
    Fallback(Money),
}

impl Recommendation {
    pub fn price(&self) -> Money {
        match self {
            Recommendation::Market(price) | Recommendation::Fallback(price) => *price,
        }
    }

    /// A market-derived, positive price the caller may act on
    pub fn actionable_price(&self) -> Option<Money> {
        match self {
            Recommendation::Market(price) if *price > Decimal::ZERO => Some(*price),
            _ => None,
        }
    }
}

/// Computes candidate prices. Pure: no I/O, no side effects.
#[derive(Debug, Clone, Default)]
pub struct PriceRecommender {
    factors: StrategyFactors,
}

impl PriceRecommender {
    pub fn new(factors: StrategyFactors) -> Self {
        Self { factors }
    }

    /// Falls back to the current price when there is no competitor data or
    /// when the market figures overflow the decimal range.
    pub fn recommend(&self, item: &Item, observations: &[CompetitorObservation]) -> Recommendation {
        match self.market_price(item, observations) {
            Some(raw) => Recommendation::Market(clamp_to_bounds(item, raw)),
            None => Recommendation::Fallback(item.current_price),
        }
    }

    fn market_price(&self, item: &Item, observations: &[CompetitorObservation]) -> Option<Money> {
        let min = observations.iter().map(|o| o.price).min()?;
        let total = observations
            .iter()
            .try_fold(Decimal::ZERO, |acc, o| acc.checked_add(o.price))?;
        let avg = total.checked_div(Decimal::from(observations.len()))?;

        match item.strategy {
            PricingStrategy::Aggressive => min.checked_mul(self.factors.aggressive_factor),
            PricingStrategy::Premium => avg.checked_mul(self.factors.premium_factor),
            PricingStrategy::Balanced => Some(avg),
        }
    }
}

/// Min is applied first, then max, so an inverted pair resolves to max
fn clamp_to_bounds(item: &Item, price: Money) -> Money {
    let mut price = price;
    if let Some(min) = item.min_bound() {
        if price < min {
            price = min;
        }
    }
    if let Some(max) = item.max_bound() {
        if price > max {
            price = max;
        }
    }
    price
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn observations(prices: &[Decimal]) -> Vec<CompetitorObservation> {
        prices
            .iter()
            .map(|p| CompetitorObservation::new("sku-1", *p))
            .collect()
    }

    fn item(strategy: PricingStrategy) -> Item {
        Item::new("sku-1", "owner-1", dec!(100))
            .with_cost(dec!(60))
            .with_strategy(strategy)
    }

    #[test]
    fn test_no_observations_falls_back_to_current_price() {
        let recommender = PriceRecommender::default();
        let rec = recommender.recommend(&item(PricingStrategy::Premium), &[]);
        assert_eq!(rec, Recommendation::Fallback(dec!(100)));
        assert_eq!(rec.actionable_price(), None);
    }

    #[test]
    fn test_strategies() {
        let recommender = PriceRecommender::default();
        let obs = observations(&[dec!(80), dec!(100), dec!(120)]);

        let aggressive = recommender.recommend(&item(PricingStrategy::Aggressive), &obs);
        assert_eq!(aggressive.price(), dec!(76.00));

        let premium = recommender.recommend(&item(PricingStrategy::Premium), &obs);
        assert_eq!(premium.price(), dec!(110.0));

        let balanced = recommender.recommend(&item(PricingStrategy::Balanced), &obs);
        assert_eq!(balanced.price(), dec!(100));
    }

    #[test]
    fn test_clamps_to_bounds() {
        let recommender = PriceRecommender::default();
        let bounded = item(PricingStrategy::Balanced).with_bounds(dec!(90), dec!(150));

        let low = recommender.recommend(&bounded, &observations(&[dec!(70), dec!(75)]));
        assert_eq!(low, Recommendation::Market(dec!(90)));

        let high = recommender.recommend(&bounded, &observations(&[dec!(300)]));
        assert_eq!(high, Recommendation::Market(dec!(150)));
    }

    #[test]
    fn test_unset_bounds_do_not_clamp() {
        let recommender = PriceRecommender::default();
        let unbounded = item(PricingStrategy::Balanced).with_bounds(dec!(0), dec!(0));
        let rec = recommender.recommend(&unbounded, &observations(&[dec!(3)]));
        assert_eq!(rec.price(), dec!(3));
    }

    #[test]
    fn test_non_positive_market_price_is_not_actionable() {
        let recommender = PriceRecommender::default();
        let rec = recommender.recommend(&item(PricingStrategy::Balanced), &observations(&[dec!(0)]));
        assert_eq!(rec, Recommendation::Market(dec!(0)));
        assert_eq!(rec.actionable_price(), None);
    }

    #[test]
    fn test_overflowing_market_falls_back() {
        let recommender = PriceRecommender::default();
        let huge = observations(&[Decimal::MAX, Decimal::MAX]);
        let rec = recommender.recommend(&item(PricingStrategy::Balanced), &huge);
        assert_eq!(rec, Recommendation::Fallback(dec!(100)));
        assert_eq!(rec.actionable_price(), None);

        let premium = recommender.recommend(&item(PricingStrategy::Premium), &observations(&[Decimal::MAX]));
        assert_eq!(premium, Recommendation::Fallback(dec!(100)));
    }

    #[test]
    fn test_custom_factors() {
        let recommender = PriceRecommender::new(StrategyFactors {
            aggressive_factor: dec!(0.90),
            premium_factor: dec!(1.25),
        });
        let obs = observations(&[dec!(100)]);
        assert_eq!(recommender.recommend(&item(PricingStrategy::Aggressive), &obs).price(), dec!(90));
        assert_eq!(recommender.recommend(&item(PricingStrategy::Premium), &obs).price(), dec!(125));
    }
}
