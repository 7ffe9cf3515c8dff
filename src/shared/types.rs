//! Common types used across the application

use rust_decimal::Decimal;

/// Monetary amount in the catalog currency
pub type Money = Decimal;

/// Fractional ratio, e.g. `0.05` for 5%
pub type Ratio = Decimal;

/// Catalog item identity
pub type ItemId = String;

/// Owner (account) identity
pub type OwnerId = String;
