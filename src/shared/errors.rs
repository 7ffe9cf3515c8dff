//! Error handling for the application

use thiserror::Error;

/// Catalog store errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Catalog store unavailable: {0}")]
    Unavailable(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Write conflict: {0}")]
    Conflict(String),
}

/// Notification delivery errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NotificationError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    #[error("Notification timed out after {0}ms")]
    Timeout(u64),
}

/// Errors raised while repricing a single unit of work (item or owner)
#[derive(Error, Debug)]
pub enum RepricingError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Concurrency error: {0}")]
    Concurrency(String),

    #[error("Repricing panicked: {0}")]
    Panicked(String),
}

impl From<tokio::sync::AcquireError> for RepricingError {
    fn from(err: tokio::sync::AcquireError) -> Self {
        RepricingError::Concurrency(err.to_string())
    }
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Catalog error: {0}")]
    CatalogError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::CatalogError(err.to_string())
    }
}
