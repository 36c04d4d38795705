//! Write-once snapshots of deleted subscriptions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cycle::BillingCycle;
use super::subscription::Subscription;

/// Snapshot of a subscription's fields at the moment it was deleted.
/// Created exactly once per delete and never mutated afterwards; the
/// subscription's charges stay attached to the retired id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationRecord {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub name: String,
    pub amount: f64,
    pub cycle: BillingCycle,
    pub next_billing_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub cancelled_at: DateTime<Utc>,
}

impl CancellationRecord {
    pub fn snapshot(subscription: &Subscription, cancelled_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            subscription_id: subscription.id,
            name: subscription.name.clone(),
            amount: subscription.amount,
            cycle: subscription.cycle,
            next_billing_date: subscription.next_billing_date,
            category: subscription.category.clone(),
            payment_method: subscription.payment_method.clone(),
            note: subscription.note.clone(),
            cancelled_at,
        }
    }
}
