//! Append-only price history ledger

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::types::{ItemId, Money};

/// Why a price changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceChangeReason {
    Manual,
    AutomaticOptimization,
}

/// A price change requested against the store.
///
/// `old_price` is the price the decision was based on; stores reject the
/// change if the item no longer carries it.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceChange {
    pub item_id: ItemId,
    pub old_price: Money,
    pub new_price: Money,
    pub reason: PriceChangeReason,
    pub changed_by: String,
}

/// Immutable ledger record, written in the same unit of work as the price update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryEntry {
    pub id: String,
    pub item_id: ItemId,
    pub old_price: Money,
    pub new_price: Money,
    pub reason: PriceChangeReason,
    pub changed_by: String,
    pub timestamp: DateTime<Utc>,
}

impl PriceHistoryEntry {
    pub fn from_change(id: String, change: &PriceChange, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            item_id: change.item_id.clone(),
            old_price: change.old_price,
            new_price: change.new_price,
            reason: change.reason,
            changed_by: change.changed_by.clone(),
            timestamp,
        }
    }
}
