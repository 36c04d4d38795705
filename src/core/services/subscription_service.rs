//! Validated CRUD over the subscription catalog.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::billing::{BillingBook, CancellationRecord, Subscription, SubscriptionDraft};
use crate::errors::{BillingError, Result};
use crate::time::Clock;

/// A subscription decorated with billing-status fields relative to a
/// reference date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionOverview {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub monthly_cost: f64,
    pub is_expired: bool,
    pub is_upcoming: bool,
    pub days_until_billing: i64,
}

impl SubscriptionOverview {
    fn of(subscription: &Subscription, today: NaiveDate) -> Self {
        Self {
            monthly_cost: subscription.monthly_cost(),
            is_expired: subscription.is_expired(today),
            is_upcoming: subscription.is_upcoming(today),
            days_until_billing: subscription.days_until_billing(today),
            subscription: subscription.clone(),
        }
    }
}

/// Provides validated mutations and views for the subscription catalog.
pub struct SubscriptionService;

impl SubscriptionService {
    /// Adds a new subscription after validating the draft. Nothing is
    /// persisted when validation fails.
    pub fn add(
        book: &mut BillingBook,
        clock: &dyn Clock,
        draft: SubscriptionDraft,
    ) -> Result<Subscription> {
        draft.validate()?;
        let subscription = Subscription::from_draft(draft, clock.now());
        tracing::debug!(id = %subscription.id, name = %subscription.name, "subscription created");
        book.add_subscription(subscription.clone());
        Ok(subscription)
    }

    /// Replaces every mutable field of an existing subscription as a whole.
    /// The next billing date is stored as given; a past date is caught up
    /// by the next processing run rather than reinterpreted here.
    pub fn edit(book: &mut BillingBook, id: Uuid, draft: SubscriptionDraft) -> Result<Subscription> {
        draft.validate()?;
        let subscription = book
            .subscription_mut(id)
            .ok_or(BillingError::SubscriptionNotFound(id))?;
        subscription.apply_draft(draft);
        let updated = subscription.clone();
        book.touch();
        Ok(updated)
    }

    /// Deletes a subscription, snapshotting it into the cancellation
    /// archive in the same step. Historical charges stay in the book under
    /// the retired id.
    pub fn remove(book: &mut BillingBook, clock: &dyn Clock, id: Uuid) -> Result<CancellationRecord> {
        let position = book
            .subscriptions
            .iter()
            .position(|sub| sub.id == id)
            .ok_or(BillingError::SubscriptionNotFound(id))?;
        let subscription = book.subscriptions.remove(position);
        let record = CancellationRecord::snapshot(&subscription, clock.now());
        book.cancellations.push(record.clone());
        book.touch();
        tracing::debug!(id = %id, name = %record.name, "subscription cancelled");
        Ok(record)
    }

    pub fn get(book: &BillingBook, today: NaiveDate, id: Uuid) -> Result<SubscriptionOverview> {
        let subscription = book
            .subscription(id)
            .ok_or(BillingError::SubscriptionNotFound(id))?;
        Ok(SubscriptionOverview::of(subscription, today))
    }

    /// All subscriptions ordered by next billing date, newest id first
    /// within a date.
    pub fn list(book: &BillingBook, today: NaiveDate) -> Vec<SubscriptionOverview> {
        let mut overviews: Vec<SubscriptionOverview> = book
            .subscriptions
            .iter()
            .map(|sub| SubscriptionOverview::of(sub, today))
            .collect();
        overviews.sort_by(|a, b| {
            a.subscription
                .next_billing_date
                .cmp(&b.subscription.next_billing_date)
                .then(b.subscription.id.cmp(&a.subscription.id))
        });
        overviews
    }

    /// Subscriptions due within `within_days` of `today`, inclusive.
    pub fn upcoming(
        book: &BillingBook,
        today: NaiveDate,
        within_days: i64,
    ) -> Vec<SubscriptionOverview> {
        let deadline = today + chrono::Duration::days(within_days);
        Self::list(book, today)
            .into_iter()
            .filter(|overview| {
                let due = overview.subscription.next_billing_date;
                due >= today && due <= deadline
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::BillingCycle;
    use crate::time::FixedClock;
    use chrono::Utc;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn draft(name: &str, amount: f64, due: NaiveDate) -> SubscriptionDraft {
        SubscriptionDraft::new(name, amount, BillingCycle::Monthly, due)
    }

    #[test]
    fn add_rejects_invalid_drafts_without_mutating() {
        let mut book = BillingBook::new("Test");
        let clock = FixedClock(date(2024, 3, 1));

        let err = SubscriptionService::add(&mut book, &clock, draft("", 9.99, date(2024, 3, 5)))
            .expect_err("blank name must fail");
        assert!(matches!(err, BillingError::Validation(_)));

        let err = SubscriptionService::add(&mut book, &clock, draft("Music", -1.0, date(2024, 3, 5)))
            .expect_err("negative amount must fail");
        assert!(matches!(err, BillingError::Validation(_)));
        assert!(book.subscriptions.is_empty());
    }

    #[test]
    fn edit_replaces_whole_record_and_keeps_past_dates() {
        let mut book = BillingBook::new("Test");
        let clock = FixedClock(date(2024, 3, 1));
        let created = SubscriptionService::add(
            &mut book,
            &clock,
            draft("Cloud", 10.0, date(2024, 3, 5)).with_category("Work"),
        )
        .unwrap();

        let past_due = date(2024, 1, 1);
        let updated =
            SubscriptionService::edit(&mut book, created.id, draft("Cloud", 12.0, past_due))
                .unwrap();
        assert_eq!(updated.amount, 12.0);
        assert_eq!(updated.next_billing_date, past_due);
        assert!(updated.category.is_none(), "edit is a whole-record replace");

        let err = SubscriptionService::edit(
            &mut book,
            Uuid::new_v4(),
            draft("Ghost", 1.0, date(2024, 3, 5)),
        )
        .expect_err("unknown id must fail");
        assert!(matches!(err, BillingError::SubscriptionNotFound(_)));
    }

    #[test]
    fn remove_archives_once_and_preserves_charges() {
        let mut book = BillingBook::new("Test");
        let clock = FixedClock(date(2024, 3, 1));
        let created =
            SubscriptionService::add(&mut book, &clock, draft("News", 6.0, date(2024, 2, 1)))
                .unwrap();
        book.record_charge_if_absent(created.id, date(2024, 2, 1), 6.0, Utc::now());

        let record = SubscriptionService::remove(&mut book, &clock, created.id).unwrap();
        assert_eq!(record.subscription_id, created.id);
        assert_eq!(record.name, "News");
        assert_eq!(book.cancellations.len(), 1);
        assert!(book.subscription(created.id).is_none());
        assert_eq!(book.charges_for_subscription(created.id).len(), 1);

        let err = SubscriptionService::remove(&mut book, &clock, created.id)
            .expect_err("second delete must fail");
        assert!(matches!(err, BillingError::SubscriptionNotFound(_)));
        assert_eq!(book.cancellations.len(), 1, "exactly one record per delete");
    }

    #[test]
    fn list_orders_by_due_date_and_decorates() {
        let mut book = BillingBook::new("Test");
        let today = date(2024, 3, 10);
        let clock = FixedClock(today);
        SubscriptionService::add(&mut book, &clock, draft("Later", 5.0, date(2024, 4, 1))).unwrap();
        SubscriptionService::add(&mut book, &clock, draft("Overdue", 5.0, date(2024, 3, 1)))
            .unwrap();
        SubscriptionService::add(&mut book, &clock, draft("Soon", 5.0, date(2024, 3, 12))).unwrap();

        let listed = SubscriptionService::list(&book, today);
        let names: Vec<&str> = listed
            .iter()
            .map(|o| o.subscription.name.as_str())
            .collect();
        assert_eq!(names, vec!["Overdue", "Soon", "Later"]);
        assert!(listed[0].is_expired);
        assert_eq!(listed[0].days_until_billing, -9);
        assert!(listed[1].is_upcoming);
    }

    #[test]
    fn upcoming_window_is_inclusive() {
        let mut book = BillingBook::new("Test");
        let today = date(2024, 3, 10);
        let clock = FixedClock(today);
        SubscriptionService::add(&mut book, &clock, draft("Edge", 5.0, date(2024, 3, 17))).unwrap();
        SubscriptionService::add(&mut book, &clock, draft("Past", 5.0, date(2024, 3, 9))).unwrap();
        SubscriptionService::add(&mut book, &clock, draft("Beyond", 5.0, date(2024, 3, 18)))
            .unwrap();

        let upcoming = SubscriptionService::upcoming(&book, today, 7);
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].subscription.name, "Edge");
    }
}
