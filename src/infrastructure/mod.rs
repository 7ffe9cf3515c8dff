//! Infrastructure - concrete catalog store and notification sink

pub mod memory_store;
pub mod catalog_snapshot;
pub mod log_notifier;

pub use memory_store::{Fault, MemoryCatalogStore};
pub use catalog_snapshot::CatalogSnapshot;
pub use log_notifier::LogNotifier;
