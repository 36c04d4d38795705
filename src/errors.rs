use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// Error type that captures billing-core failures across all layers.
#[derive(Debug, Error)]
pub enum BillingError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(Uuid),
    #[error("No charge recorded for subscription {subscription_id} on {billing_date}")]
    ChargeNotFound {
        subscription_id: Uuid,
        billing_date: NaiveDate,
    },
    #[error("Ledger store error: {0}")]
    LedgerStore(String),
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BillingError>;

impl From<std::io::Error> for BillingError {
    fn from(err: std::io::Error) -> Self {
        BillingError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for BillingError {
    fn from(err: serde_json::Error) -> Self {
        BillingError::Storage(err.to_string())
    }
}
