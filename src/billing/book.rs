//! The billing book: catalog, charge ledger, and cancellation archive.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cancellation::CancellationRecord;
use super::charge::{Charge, ChargeTotals};
use super::cycle::round_cents;
use super::month::Month;
use super::subscription::Subscription;
use crate::errors::{BillingError, Result};

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

/// Aggregate state persisted as one snapshot: the subscription catalog, the
/// uniquely-keyed charge ledger, and the cancellation archive.
///
/// Charges are stored per subscription keyed by billing date, so the
/// (subscription, billing date) pair is unique by construction and
/// [`BillingBook::record_charge_if_absent`] is an atomic conditional insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingBook {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
    #[serde(default)]
    charges: BTreeMap<Uuid, BTreeMap<NaiveDate, Charge>>,
    #[serde(default)]
    pub cancellations: Vec<CancellationRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "BillingBook::schema_version_default")]
    pub schema_version: u8,
}

/// Outcome of a conditional charge insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    pub created: bool,
    pub charge_id: Uuid,
}

impl BillingBook {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            subscriptions: Vec::new(),
            charges: BTreeMap::new(),
            cancellations: Vec::new(),
            created_at: now,
            updated_at: now,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    pub fn subscription(&self, id: Uuid) -> Option<&Subscription> {
        self.subscriptions.iter().find(|sub| sub.id == id)
    }

    pub fn subscription_mut(&mut self, id: Uuid) -> Option<&mut Subscription> {
        self.subscriptions.iter_mut().find(|sub| sub.id == id)
    }

    /// Ids in ascending order; the deterministic pass order for processing.
    pub fn subscription_ids_sorted(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.subscriptions.iter().map(|sub| sub.id).collect();
        ids.sort();
        ids
    }

    pub fn add_subscription(&mut self, subscription: Subscription) -> Uuid {
        let id = subscription.id;
        self.subscriptions.push(subscription);
        self.touch();
        id
    }

    /// Records the period if it has not been realized yet. When a charge for
    /// this (subscription, billing date) already exists the call is a no-op
    /// that reports the existing row, which is what makes repeated
    /// processing runs safe.
    pub fn record_charge_if_absent(
        &mut self,
        subscription_id: Uuid,
        billing_date: NaiveDate,
        amount: f64,
        recorded_at: DateTime<Utc>,
    ) -> RecordOutcome {
        let per_subscription = self.charges.entry(subscription_id).or_default();
        match per_subscription.get(&billing_date) {
            Some(existing) => RecordOutcome {
                created: false,
                charge_id: existing.id,
            },
            None => {
                let charge = Charge::new(
                    subscription_id,
                    billing_date,
                    round_cents(amount),
                    recorded_at,
                );
                let charge_id = charge.id;
                per_subscription.insert(billing_date, charge);
                self.touch();
                RecordOutcome {
                    created: true,
                    charge_id,
                }
            }
        }
    }

    pub fn charge(&self, subscription_id: Uuid, billing_date: NaiveDate) -> Option<&Charge> {
        self.charges
            .get(&subscription_id)
            .and_then(|per_subscription| per_subscription.get(&billing_date))
    }

    /// Links the ledger transaction that completed the charge. A charge
    /// carries at most one transaction for its lifetime.
    pub fn attach_transaction(
        &mut self,
        subscription_id: Uuid,
        billing_date: NaiveDate,
        transaction_id: Uuid,
    ) -> Result<()> {
        let charge = self
            .charges
            .get_mut(&subscription_id)
            .and_then(|per_subscription| per_subscription.get_mut(&billing_date))
            .ok_or(BillingError::ChargeNotFound {
                subscription_id,
                billing_date,
            })?;
        if charge.transaction_id.is_some() {
            return Err(BillingError::Validation(format!(
                "charge {} already has a transaction attached",
                charge.id
            )));
        }
        charge.transaction_id = Some(transaction_id);
        self.touch();
        Ok(())
    }

    pub fn charges_for_subscription(&self, subscription_id: Uuid) -> Vec<&Charge> {
        self.charges
            .get(&subscription_id)
            .map(|per_subscription| per_subscription.values().collect())
            .unwrap_or_default()
    }

    pub fn charges_for_month(&self, month: Month) -> Vec<&Charge> {
        self.charges
            .values()
            .flat_map(|per_subscription| per_subscription.values())
            .filter(|charge| month.contains(charge.billing_date))
            .collect()
    }

    pub fn month_charge_totals(&self, month: Month) -> ChargeTotals {
        let charges = self.charges_for_month(month);
        ChargeTotals {
            actual_amount: round_cents(charges.iter().map(|charge| charge.amount).sum()),
            charge_count: charges.len(),
        }
    }

    pub fn charge_count(&self) -> usize {
        self.charges
            .values()
            .map(|per_subscription| per_subscription.len())
            .sum()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}
