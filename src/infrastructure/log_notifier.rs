//! Notifier that writes price changes to the log

use async_trait::async_trait;
use tracing::info;

use crate::domain::catalog::Item;
use crate::domain::notification::PriceChangeNotifier;
use crate::shared::errors::NotificationError;
use crate::shared::types::Money;

#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl PriceChangeNotifier for LogNotifier {
    async fn notify_price_change(
        &self,
        owner_id: &str,
        item: &Item,
        old_price: Money,
        new_price: Money,
    ) -> Result<(), NotificationError> {
        info!(
            owner_id,
            item_id = %item.id,
            item_name = %item.name,
            %old_price,
            %new_price,
            "💸 Price changed automatically"
        );
        Ok(())
    }
}
