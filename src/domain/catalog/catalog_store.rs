//! Catalog store interface

use async_trait::async_trait;

use crate::shared::errors::StoreError;
use crate::shared::types::Money;
use super::{CompetitorObservation, Item, Owner, PriceChange, PriceHistoryEntry};

/// Read-and-conditionally-write access to the catalog.
///
/// Implementations provide their own concurrency control for writers
/// across owners.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Active owners with at least one active, auto-priced item.
    /// Must be a single query, not a per-owner fetch.
    async fn find_eligible_owners(&self) -> Result<Vec<Owner>, StoreError>;

    /// Up to `page_size` active, auto-priced items of one owner
    async fn find_eligible_items(&self, owner_id: &str, page_size: usize) -> Result<Vec<Item>, StoreError>;

    /// Current competitor observations for an item (possibly stale)
    async fn fetch_observations(&self, item_id: &str) -> Result<Vec<CompetitorObservation>, StoreError>;

    /// Atomically updates the item's current price and appends exactly one
    /// ledger entry. Either both writes land or neither does.
    async fn apply_price_change(&self, change: &PriceChange) -> Result<PriceHistoryEntry, StoreError>;

    /// Stores the latest recommendation into `item.recommended_price`
    async fn record_recommendation(&self, item_id: &str, price: Money) -> Result<(), StoreError>;

    /// Ledger entries of one item in insertion order
    async fn price_history(&self, item_id: &str) -> Result<Vec<PriceHistoryEntry>, StoreError>;
}
