//! Read-only aggregation over the catalog, charge ledger, and archive.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::charge_service::AUTO_CHARGE_TAG;
use super::subscription_service::{SubscriptionOverview, SubscriptionService};
use crate::billing::{round_cents, BillingBook, BillingCycle, Month};
use crate::errors::Result;
use crate::ledger_store::LedgerStore;

const TOP_COST_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopSubscriptionCost {
    pub id: Uuid,
    pub name: String,
    pub monthly_cost: f64,
}

/// Point-in-time structural view of the catalog: the estimated monthly
/// run-rate, never mixed with realized charge figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostSummary {
    pub total_count: usize,
    pub total_monthly_cost: f64,
    pub upcoming_count: usize,
    pub expired_count: usize,
    pub cycle_distribution: BTreeMap<BillingCycle, usize>,
    pub top_monthly_cost: Vec<TopSubscriptionCost>,
}

/// Month-scoped recap combining catalog movement, realized charges, and the
/// following month's outlook. Estimated and actual figures stay distinct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyRecap {
    pub month: Month,
    pub estimated_monthly_cost: f64,
    pub actual_charged_amount: f64,
    pub actual_charge_count: usize,
    pub new_subscriptions: usize,
    pub cancelled_subscriptions: usize,
    pub next_month_upcoming: Vec<SubscriptionOverview>,
}

/// Comparison of the charge ledger's month total against the auto-charge
/// entries the external ledger store reports for the same month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthCrossCheck {
    pub month: Month,
    pub charged_amount: f64,
    pub ledger_amount: f64,
    pub consistent: bool,
}

/// Aggregates billing data for summaries and monthly recaps.
pub struct SummaryService;

impl SummaryService {
    pub fn monthly_cost_summary(book: &BillingBook, today: NaiveDate) -> CostSummary {
        let mut cycle_distribution: BTreeMap<BillingCycle, usize> = BillingCycle::ALL
            .iter()
            .map(|cycle| (*cycle, 0))
            .collect();
        let mut total_monthly_cost = 0.0;
        let mut upcoming_count = 0;
        let mut expired_count = 0;

        for subscription in &book.subscriptions {
            total_monthly_cost += subscription.monthly_cost();
            if subscription.is_upcoming(today) {
                upcoming_count += 1;
            }
            if subscription.is_expired(today) {
                expired_count += 1;
            }
            *cycle_distribution.entry(subscription.cycle).or_insert(0) += 1;
        }

        let mut ranked: Vec<TopSubscriptionCost> = book
            .subscriptions
            .iter()
            .map(|subscription| TopSubscriptionCost {
                id: subscription.id,
                name: subscription.name.clone(),
                monthly_cost: subscription.monthly_cost(),
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.monthly_cost
                .partial_cmp(&a.monthly_cost)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(TOP_COST_LIMIT);

        CostSummary {
            total_count: book.subscriptions.len(),
            total_monthly_cost: round_cents(total_monthly_cost),
            upcoming_count,
            expired_count,
            cycle_distribution,
            top_monthly_cost: ranked,
        }
    }

    pub fn monthly_recap(book: &BillingBook, today: NaiveDate, month: Month) -> MonthlyRecap {
        let totals = book.month_charge_totals(month);
        let new_subscriptions = book
            .subscriptions
            .iter()
            .filter(|subscription| month.contains_timestamp(subscription.created_at))
            .count();
        let cancelled_subscriptions = book
            .cancellations
            .iter()
            .filter(|record| month.contains_timestamp(record.cancelled_at))
            .count();
        let next_month = month.next();
        let next_month_upcoming: Vec<SubscriptionOverview> = SubscriptionService::list(book, today)
            .into_iter()
            .filter(|overview| next_month.contains(overview.subscription.next_billing_date))
            .collect();

        MonthlyRecap {
            month,
            estimated_monthly_cost: Self::monthly_cost_summary(book, today).total_monthly_cost,
            actual_charged_amount: totals.actual_amount,
            actual_charge_count: totals.charge_count,
            new_subscriptions,
            cancelled_subscriptions,
            next_month_upcoming,
        }
    }

    /// Cross-checks realized charges against the external store's view of
    /// the month. Only auto-charge entries participate.
    pub fn month_crosscheck(
        book: &BillingBook,
        store: &dyn LedgerStore,
        month: Month,
    ) -> Result<MonthCrossCheck> {
        let totals = book.month_charge_totals(month);
        let ledger_amount = round_cents(
            store
                .entries_for_month(month)?
                .iter()
                .filter(|entry| entry.tags.iter().any(|tag| tag == AUTO_CHARGE_TAG))
                .map(|entry| entry.amount)
                .sum(),
        );
        Ok(MonthCrossCheck {
            month,
            charged_amount: totals.actual_amount,
            ledger_amount,
            consistent: (totals.actual_amount - ledger_amount).abs() < 0.005,
        })
    }
}
