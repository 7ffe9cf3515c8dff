//! Notification domain - owner-facing price change notices

use async_trait::async_trait;

use crate::domain::catalog::Item;
use crate::shared::errors::NotificationError;
use crate::shared::types::Money;

/// Best-effort sink for applied price changes.
///
/// Callers log and discard errors; a failed notification never undoes or
/// fails a price change.
#[async_trait]
pub trait PriceChangeNotifier: Send + Sync {
    async fn notify_price_change(
        &self,
        owner_id: &str,
        item: &Item,
        old_price: Money,
        new_price: Money,
    ) -> Result<(), NotificationError>;
}
