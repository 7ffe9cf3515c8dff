//! In-memory catalog store.
//!
//! Backs the CLI demo and the test suite. All state lives behind one lock,
//! so a price change and its ledger entry are committed together.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::catalog::{
    CatalogStore, CompetitorObservation, Item, Owner, PriceChange, PriceHistoryEntry,
};
use crate::shared::errors::StoreError;
use crate::shared::types::{ItemId, Money, OwnerId};
use crate::shared::utils;

/// Failure that can be injected into a store call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fault {
    /// `find_eligible_owners` fails
    Owners,
    /// `find_eligible_items` fails for this owner
    Items(OwnerId),
    /// `fetch_observations` fails for this item
    Observations(ItemId),
    /// The ledger append of `apply_price_change` fails for this item
    HistoryAppend(ItemId),
    /// `record_recommendation` fails for this item
    Recommendation(ItemId),
}

#[derive(Debug, Default)]
struct CatalogState {
    owners: BTreeMap<OwnerId, Owner>,
    items: BTreeMap<ItemId, Item>,
    observations: HashMap<ItemId, Vec<CompetitorObservation>>,
    history: Vec<PriceHistoryEntry>,
}

#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    state: RwLock<CatalogState>,
    faults: RwLock<HashSet<Fault>>,
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_owner(&self, owner: Owner) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        state.owners.insert(owner.id.clone(), owner);
        Ok(())
    }

    /// Rejects items whose bounds are inverted or whose owner is unknown
    pub fn insert_item(&self, item: Item) -> Result<(), StoreError> {
        item.validate_bounds().map_err(StoreError::WriteFailed)?;
        let mut state = self.state.write().map_err(|_| poisoned())?;
        if !state.owners.contains_key(&item.owner_id) {
            return Err(StoreError::NotFound(format!("owner {}", item.owner_id)));
        }
        state.items.insert(item.id.clone(), item);
        Ok(())
    }

    /// Replaces the observations of one item
    pub fn set_observations(
        &self,
        item_id: &str,
        observations: Vec<CompetitorObservation>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        state.observations.insert(item_id.to_string(), observations);
        Ok(())
    }

    pub fn inject_fault(&self, fault: Fault) -> Result<(), StoreError> {
        self.faults.write().map_err(|_| poisoned())?.insert(fault);
        Ok(())
    }

    pub fn clear_faults(&self) -> Result<(), StoreError> {
        self.faults.write().map_err(|_| poisoned())?.clear();
        Ok(())
    }

    pub fn item(&self, item_id: &str) -> Result<Option<Item>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.items.get(item_id).cloned())
    }

    pub fn items(&self) -> Result<Vec<Item>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.items.values().cloned().collect())
    }

    /// Every ledger entry across all items, in insertion order
    pub fn ledger(&self) -> Result<Vec<PriceHistoryEntry>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.history.clone())
    }

    fn check_fault(&self, fault: &Fault) -> Result<(), StoreError> {
        let faults = self.faults.read().map_err(|_| poisoned())?;
        if faults.contains(fault) {
            return Err(StoreError::Unavailable(format!("injected fault: {:?}", fault)));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn find_eligible_owners(&self) -> Result<Vec<Owner>, StoreError> {
        self.check_fault(&Fault::Owners)?;
        let state = self.state.read().map_err(|_| poisoned())?;

        let with_eligible_items: HashSet<&str> = state
            .items
            .values()
            .filter(|item| item.is_eligible())
            .map(|item| item.owner_id.as_str())
            .collect();

        Ok(state
            .owners
            .values()
            .filter(|owner| owner.active && with_eligible_items.contains(owner.id.as_str()))
            .cloned()
            .collect())
    }

    async fn find_eligible_items(&self, owner_id: &str, page_size: usize) -> Result<Vec<Item>, StoreError> {
        self.check_fault(&Fault::Items(owner_id.to_string()))?;
        let state = self.state.read().map_err(|_| poisoned())?;

        Ok(state
            .items
            .values()
            .filter(|item| item.owner_id == owner_id && item.is_eligible())
            .take(page_size)
            .cloned()
            .collect())
    }

    async fn fetch_observations(&self, item_id: &str) -> Result<Vec<CompetitorObservation>, StoreError> {
        self.check_fault(&Fault::Observations(item_id.to_string()))?;
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.observations.get(item_id).cloned().unwrap_or_default())
    }

    async fn apply_price_change(&self, change: &PriceChange) -> Result<PriceHistoryEntry, StoreError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;

        let item = state
            .items
            .get(&change.item_id)
            .ok_or_else(|| StoreError::NotFound(format!("item {}", change.item_id)))?;

        if item.current_price != change.old_price {
            return Err(StoreError::Conflict(format!(
                "item {} price is {}, expected {}",
                item.id, item.current_price, change.old_price
            )));
        }
        if !item.within_bounds(change.new_price) {
            return Err(StoreError::WriteFailed(format!(
                "item {} price {} outside bounds",
                item.id, change.new_price
            )));
        }

        // Stage the item write, then the ledger write; commit only if both succeed
        let mut updated = item.clone();
        updated.current_price = change.new_price;

        let entry = PriceHistoryEntry::from_change(utils::generate_id(), change, Utc::now());
        self.check_fault(&Fault::HistoryAppend(change.item_id.clone()))?;

        state.items.insert(updated.id.clone(), updated);
        state.history.push(entry.clone());
        Ok(entry)
    }

    async fn record_recommendation(&self, item_id: &str, price: Money) -> Result<(), StoreError> {
        self.check_fault(&Fault::Recommendation(item_id.to_string()))?;
        let mut state = self.state.write().map_err(|_| poisoned())?;
        let item = state
            .items
            .get_mut(item_id)
            .ok_or_else(|| StoreError::NotFound(format!("item {}", item_id)))?;
        item.recommended_price = Some(price);
        Ok(())
    }

    async fn price_history(&self, item_id: &str) -> Result<Vec<PriceHistoryEntry>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state
            .history
            .iter()
            .filter(|entry| entry.item_id == item_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::PriceChangeReason;
    use rust_decimal_macros::dec;

    fn seeded_store() -> MemoryCatalogStore {
        let store = MemoryCatalogStore::new();
        store.insert_owner(Owner::new("owner-a")).unwrap();
        store.insert_owner(Owner::new("owner-b")).unwrap();
        let mut inactive = Owner::new("owner-c");
        inactive.active = false;
        store.insert_owner(inactive).unwrap();

        store
            .insert_item(Item::new("a-1", "owner-a", dec!(100)).with_bounds(dec!(90), dec!(150)))
            .unwrap();
        let mut manual = Item::new("b-1", "owner-b", dec!(100));
        manual.auto_pricing_enabled = false;
        store.insert_item(manual).unwrap();
        store.insert_item(Item::new("c-1", "owner-c", dec!(100))).unwrap();
        store
    }

    fn change(new_price: Money) -> PriceChange {
        PriceChange {
            item_id: "a-1".to_string(),
            old_price: dec!(100),
            new_price,
            reason: PriceChangeReason::AutomaticOptimization,
            changed_by: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_eligible_owners_need_active_auto_priced_items() {
        let store = seeded_store();
        let owners = store.find_eligible_owners().await.unwrap();
        let ids: Vec<_> = owners.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["owner-a"]);
    }

    #[tokio::test]
    async fn test_eligible_items_respect_page_size() {
        let store = seeded_store();
        for i in 2..=5 {
            store
                .insert_item(Item::new(format!("a-{}", i), "owner-a", dec!(10)))
                .unwrap();
        }
        let items = store.find_eligible_items("owner-a", 3).await.unwrap();
        assert_eq!(items.len(), 3);
        assert!(store.find_eligible_items("owner-b", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_apply_price_change_writes_item_and_ledger() {
        let store = seeded_store();
        let entry = store.apply_price_change(&change(dec!(95))).await.unwrap();
        assert_eq!(entry.old_price, dec!(100));
        assert_eq!(entry.new_price, dec!(95));

        assert_eq!(store.item("a-1").unwrap().unwrap().current_price, dec!(95));
        let history = store.price_history("a-1").await.unwrap();
        assert_eq!(history, vec![entry]);
    }

    #[tokio::test]
    async fn test_failed_ledger_append_leaves_no_partial_state() {
        let store = seeded_store();
        store.inject_fault(Fault::HistoryAppend("a-1".to_string())).unwrap();

        assert!(store.apply_price_change(&change(dec!(95))).await.is_err());
        assert_eq!(store.item("a-1").unwrap().unwrap().current_price, dec!(100));
        assert!(store.price_history("a-1").await.unwrap().is_empty());
        assert!(store.ledger().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stale_old_price_is_a_conflict() {
        let store = seeded_store();
        let mut stale = change(dec!(95));
        stale.old_price = dec!(99);
        assert!(matches!(
            store.apply_price_change(&stale).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_out_of_bounds_price_is_refused() {
        let store = seeded_store();
        assert!(matches!(
            store.apply_price_change(&change(dec!(80))).await,
            Err(StoreError::WriteFailed(_))
        ));
        assert!(store.ledger().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_recommendation() {
        let store = seeded_store();
        store.record_recommendation("a-1", dec!(97)).await.unwrap();
        assert_eq!(store.item("a-1").unwrap().unwrap().recommended_price, Some(dec!(97)));
        assert!(store.record_recommendation("missing", dec!(1)).await.is_err());
    }

    #[test]
    fn test_insert_item_rejects_inverted_bounds() {
        let store = seeded_store();
        let item = Item::new("a-9", "owner-a", dec!(100)).with_bounds(dec!(200), dec!(100));
        assert!(store.insert_item(item).is_err());
    }
}
