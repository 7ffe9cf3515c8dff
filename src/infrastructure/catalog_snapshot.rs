//! JSON catalog snapshot used to seed the in-memory store

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::domain::catalog::{CompetitorObservation, Item, Owner};
use crate::shared::errors::AppError;
use super::MemoryCatalogStore;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub owners: Vec<Owner>,
    pub items: Vec<Item>,
    #[serde(default)]
    pub observations: Vec<CompetitorObservation>,
}

impl CatalogSnapshot {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            AppError::CatalogError(format!(
                "Failed to read catalog {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, AppError> {
        serde_json::from_str(content)
            .map_err(|e| AppError::CatalogError(format!("Failed to parse catalog: {}", e)))
    }

    /// Owners first, then items, then observations grouped per item
    pub fn into_store(self) -> Result<MemoryCatalogStore, AppError> {
        let store = MemoryCatalogStore::new();
        for owner in self.owners {
            store.insert_owner(owner)?;
        }
        for item in self.items {
            store.insert_item(item)?;
        }

        let mut grouped: std::collections::BTreeMap<String, Vec<CompetitorObservation>> =
            std::collections::BTreeMap::new();
        for observation in self.observations {
            grouped
                .entry(observation.item_id.clone())
                .or_default()
                .push(observation);
        }
        for (item_id, observations) in grouped {
            store.set_observations(&item_id, observations)?;
        }

        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{CatalogStore, PricingStrategy};
    use rust_decimal_macros::dec;

    const CATALOG: &str = r#"{
        "owners": [
            { "id": "shop-1", "name": "Corner Shop", "active": true }
        ],
        "items": [
            {
                "id": "sku-1",
                "ownerId": "shop-1",
                "currentPrice": "100",
                "costPrice": "60",
                "minPrice": "90",
                "maxPrice": "150",
                "autoPricingEnabled": true,
                "strategy": "premium"
            }
        ],
        "observations": [
            { "itemId": "sku-1", "price": "95", "rating": 4.5 },
            { "itemId": "sku-1", "price": 105 }
        ]
    }"#;

    #[tokio::test]
    async fn test_snapshot_seeds_store() {
        let store = CatalogSnapshot::from_json(CATALOG).unwrap().into_store().unwrap();

        let owners = store.find_eligible_owners().await.unwrap();
        assert_eq!(owners.len(), 1);
        assert!(owners[0].notify_on_price_change);

        let item = store.item("sku-1").unwrap().unwrap();
        assert_eq!(item.strategy, PricingStrategy::Premium);
        assert_eq!(item.cost_price, dec!(60));

        let observations = store.fetch_observations("sku-1").await.unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[1].price, dec!(105));
    }

    #[test]
    fn test_item_for_unknown_owner_is_rejected() {
        let json = r#"{ "owners": [], "items": [
            { "id": "sku-1", "ownerId": "ghost", "currentPrice": "1" }
        ] }"#;
        let snapshot = CatalogSnapshot::from_json(json).unwrap();
        assert!(matches!(snapshot.into_store(), Err(AppError::CatalogError(_))));
    }

    #[test]
    fn test_malformed_json_is_reported() {
        assert!(CatalogSnapshot::from_json("{ not json").is_err());
    }
}
