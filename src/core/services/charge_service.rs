//! The charge processor: realizes every due billing period exactly once.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::billing::{BillingBook, Subscription};
use crate::errors::BillingError;
use crate::ledger_store::{EntryKind, LedgerEntryDraft, LedgerStore};
use crate::time::Clock;

/// Category bucket used when a subscription carries none.
pub const DEFAULT_FALLBACK_CATEGORY: &str = "Other";

pub const SUBSCRIPTION_TAG: &str = "subscription";
pub const AUTO_CHARGE_TAG: &str = "auto-charge";

/// One subscription whose catch-up stopped on a ledger-store failure. The
/// charge row for `due_date` exists without a transaction, so the next run
/// resumes exactly there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatchupFailure {
    pub subscription_id: Uuid,
    pub due_date: NaiveDate,
    pub message: String,
}

/// Outcome of one processing pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatchupReport {
    pub processed_date: NaiveDate,
    pub created_charges: usize,
    pub updated_subscriptions: usize,
    #[serde(default)]
    pub failures: Vec<CatchupFailure>,
}

/// Drives catch-up across the catalog: one charge and one ledger entry per
/// missed period, at most once each, safe to run arbitrarily often.
pub struct ChargeService;

impl ChargeService {
    /// Processes every subscription whose next billing date is on or before
    /// `as_of`. Each subscription's catch-up is an independent unit of
    /// work; a ledger-store failure stops only that subscription and is
    /// reported in the returned failures.
    pub fn process(
        book: &mut BillingBook,
        store: &dyn LedgerStore,
        clock: &dyn Clock,
        as_of: NaiveDate,
        fallback_category: &str,
    ) -> CatchupReport {
        let mut report = CatchupReport {
            processed_date: as_of,
            created_charges: 0,
            updated_subscriptions: 0,
            failures: Vec::new(),
        };

        for id in book.subscription_ids_sorted() {
            let snapshot = match book.subscription(id) {
                Some(subscription) => subscription.clone(),
                None => continue,
            };
            let mut due = snapshot.next_billing_date;
            let mut failure: Option<(NaiveDate, BillingError)> = None;

            while due <= as_of {
                let outcome = book.record_charge_if_absent(id, due, snapshot.amount, clock.now());
                if outcome.created {
                    tracing::debug!(subscription = %id, %due, "charge recorded");
                }

                let needs_transaction = book
                    .charge(id, due)
                    .map(|charge| !charge.is_completed())
                    .unwrap_or(false);
                if needs_transaction {
                    let draft = Self::charge_entry_draft(&snapshot, due, fallback_category);
                    match store
                        .create_entry(draft)
                        .and_then(|transaction_id| book.attach_transaction(id, due, transaction_id))
                    {
                        Ok(()) => report.created_charges += 1,
                        Err(err) => {
                            failure = Some((due, err));
                            break;
                        }
                    }
                }

                due = snapshot.cycle.advance(due);
            }

            // On failure the loop stops at the period that did not complete,
            // which is exactly where the next run must resume.
            let stop = failure.as_ref().map(|(date, _)| *date).unwrap_or(due);
            if stop != snapshot.next_billing_date {
                if let Some(subscription) = book.subscription_mut(id) {
                    subscription.next_billing_date = stop;
                }
                book.touch();
                report.updated_subscriptions += 1;
            }

            if let Some((due_date, err)) = failure {
                tracing::warn!(subscription = %id, %due_date, error = %err, "catch-up interrupted");
                report.failures.push(CatchupFailure {
                    subscription_id: id,
                    due_date,
                    message: err.to_string(),
                });
            }
        }

        tracing::info!(
            processed_date = %report.processed_date,
            created = report.created_charges,
            updated = report.updated_subscriptions,
            failed = report.failures.len(),
            "subscription charges processed"
        );
        report
    }

    fn charge_entry_draft(
        subscription: &Subscription,
        due: NaiveDate,
        fallback_category: &str,
    ) -> LedgerEntryDraft {
        LedgerEntryDraft {
            amount: subscription.amount,
            kind: EntryKind::Expense,
            date: due,
            category: subscription
                .category
                .clone()
                .unwrap_or_else(|| fallback_category.to_string()),
            tags: vec![SUBSCRIPTION_TAG.to_string(), AUTO_CHARGE_TAG.to_string()],
            payment_method: subscription.payment_method.clone(),
            note: Some(format!("[subscription auto-charge] {}", subscription.name)),
        }
    }
}
