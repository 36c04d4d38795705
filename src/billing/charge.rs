//! Realized billing periods and their link to ledger transactions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One realized billing period for a subscription. Immutable once recorded,
/// except for attaching the ledger transaction id that completes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Charge {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub billing_date: NaiveDate,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Charge {
    pub fn new(
        subscription_id: Uuid,
        billing_date: NaiveDate,
        amount: f64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            subscription_id,
            billing_date,
            amount,
            transaction_id: None,
            created_at,
        }
    }

    /// A charge row without a transaction id is a realization that was
    /// interrupted before the ledger entry was written.
    pub fn is_completed(&self) -> bool {
        self.transaction_id.is_some()
    }
}

/// Aggregated realized charges for one calendar month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChargeTotals {
    pub actual_amount: f64,
    pub charge_count: usize,
}
