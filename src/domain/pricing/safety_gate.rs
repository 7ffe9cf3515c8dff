//! Last-resort guard a candidate price must pass before it is applied

use std::fmt;

use rust_decimal::Decimal;

use crate::domain::catalog::Item;
use crate::shared::types::{Money, Ratio};
use crate::shared::utils;
use super::PricingThresholds;

/// Why a candidate was refused. Rejections are expected, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum SafetyRejection {
    NonPositiveCandidate { candidate: Money },
    NonPositiveCurrentPrice { current: Money },
    BelowMinPrice { candidate: Money, min_price: Money },
    AboveMaxPrice { candidate: Money, max_price: Money },
    ExcessiveChange { change: Ratio, limit: Ratio },
    InsufficientMargin { margin: Ratio, floor: Ratio },
}

impl fmt::Display for SafetyRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafetyRejection::NonPositiveCandidate { candidate } => {
                write!(f, "candidate price {} is not positive", candidate)
            }
            SafetyRejection::NonPositiveCurrentPrice { current } => {
                write!(f, "current price {} is not positive", current)
            }
            SafetyRejection::BelowMinPrice { candidate, min_price } => {
                write!(f, "candidate {} below min price {}", candidate, min_price)
            }
            SafetyRejection::AboveMaxPrice { candidate, max_price } => {
                write!(f, "candidate {} above max price {}", candidate, max_price)
            }
            SafetyRejection::ExcessiveChange { change, limit } => write!(
                f,
                "change {} exceeds limit {}",
                utils::format_ratio(*change),
                utils::format_ratio(*limit)
            ),
            SafetyRejection::InsufficientMargin { margin, floor } => write!(
                f,
                "margin {} below floor {}",
                utils::format_ratio(*margin),
                utils::format_ratio(*floor)
            ),
        }
    }
}

/// Strict predicate over (item, candidate). No clamping happens here.
#[derive(Debug, Clone, Default)]
pub struct SafetyGate {
    thresholds: PricingThresholds,
}

impl SafetyGate {
    pub fn new(thresholds: PricingThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &PricingThresholds {
        &self.thresholds
    }

    pub fn is_safe(&self, item: &Item, candidate: Money) -> bool {
        self.evaluate(item, candidate).is_ok()
    }

    /// Runs every check; the first failing one is reported
    pub fn evaluate(&self, item: &Item, candidate: Money) -> Result<(), SafetyRejection> {
        if candidate <= Decimal::ZERO {
            return Err(SafetyRejection::NonPositiveCandidate { candidate });
        }

        if let Some(min_price) = item.min_bound() {
            if candidate < min_price {
                return Err(SafetyRejection::BelowMinPrice { candidate, min_price });
            }
        }

        if let Some(max_price) = item.max_bound() {
            if candidate > max_price {
                return Err(SafetyRejection::AboveMaxPrice { candidate, max_price });
            }
        }

        if item.current_price <= Decimal::ZERO {
            return Err(SafetyRejection::NonPositiveCurrentPrice {
                current: item.current_price,
            });
        }
        // A ratio too large for a Decimal is an excessive change by definition
        let change = utils::relative_change(item.current_price, candidate).unwrap_or(Decimal::MAX);
        if change > self.thresholds.max_change_ratio {
            return Err(SafetyRejection::ExcessiveChange {
                change,
                limit: self.thresholds.max_change_ratio,
            });
        }

        if let Some(cost) = item.cost_basis() {
            let margin = candidate
                .checked_sub(cost)
                .and_then(|profit| profit.checked_div(candidate))
                .unwrap_or(Decimal::MIN);
            if margin < self.thresholds.min_margin_ratio {
                return Err(SafetyRejection::InsufficientMargin {
                    margin,
                    floor: self.thresholds.min_margin_ratio,
                });
            }
        }

        Ok(())
    }
}
