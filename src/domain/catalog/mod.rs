//! Catalog domain - items, owners, competitor observations and the price ledger

mod item;
mod ledger;
mod catalog_store;

pub use item::{Item, PricingStrategy};
pub use ledger::{PriceChange, PriceChangeReason, PriceHistoryEntry};
pub use catalog_store::CatalogStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::types::{Money, OwnerId, ItemId};

/// Account owning a set of catalog items. Read-only for the repricer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub id: OwnerId,
    #[serde(default)]
    pub name: String,
    pub active: bool,
    /// Whether the owner wants to hear about automatic price changes
    #[serde(default = "default_notify")]
    pub notify_on_price_change: bool,
}

fn default_notify() -> bool {
    true
}

impl Owner {
    pub fn new(id: impl Into<OwnerId>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            active: true,
            notify_on_price_change: true,
        }
    }
}

/// Competitor price sample supplied by the external feed. Never persisted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorObservation {
    pub item_id: ItemId,
    pub price: Money,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub competitor: Option<String>,
    #[serde(default = "Utc::now")]
    pub observed_at: DateTime<Utc>,
}

impl CompetitorObservation {
    pub fn new(item_id: impl Into<ItemId>, price: Money) -> Self {
        Self {
            item_id: item_id.into(),
            price,
            rating: None,
            competitor: None,
            observed_at: Utc::now(),
        }
    }
}
