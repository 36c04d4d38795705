//! Subscription definitions and the validated draft used for create/update.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cycle::BillingCycle;
use crate::errors::BillingError;

/// Days ahead of today that count a subscription as "upcoming".
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
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
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    pub fn from_draft(draft: SubscriptionDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: draft.name.trim().to_string(),
            amount: draft.amount,
            cycle: draft.cycle,
            next_billing_date: draft.next_billing_date,
            category: draft.category,
            payment_method: draft.payment_method,
            note: draft.note,
            created_at,
        }
    }

    /// Replaces every mutable field from the draft in one step. The id and
    /// creation timestamp are immutable.
    pub fn apply_draft(&mut self, draft: SubscriptionDraft) {
        self.name = draft.name.trim().to_string();
        self.amount = draft.amount;
        self.cycle = draft.cycle;
        self.next_billing_date = draft.next_billing_date;
        self.category = draft.category;
        self.payment_method = draft.payment_method;
        self.note = draft.note;
    }

    pub fn monthly_cost(&self) -> f64 {
        self.cycle.monthly_equivalent(self.amount)
    }

    pub fn days_until_billing(&self, today: NaiveDate) -> i64 {
        (self.next_billing_date - today).num_days()
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.next_billing_date < today
    }

    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.next_billing_date >= today
            && self.next_billing_date <= today + Duration::days(UPCOMING_WINDOW_DAYS)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Caller-supplied subscription fields, validated before any mutation.
pub struct SubscriptionDraft {
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
}

impl SubscriptionDraft {
    pub fn new(
        name: impl Into<String>,
        amount: f64,
        cycle: BillingCycle,
        next_billing_date: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            amount,
            cycle,
            next_billing_date,
            category: None,
            payment_method: None,
            note: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_payment_method(mut self, payment_method: impl Into<String>) -> Self {
        self.payment_method = Some(payment_method.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn validate(&self) -> Result<(), BillingError> {
        if self.name.trim().is_empty() {
            return Err(BillingError::Validation(
                "subscription name must not be empty".into(),
            ));
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(BillingError::Validation(format!(
                "subscription amount must be positive, got {}",
                self.amount
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn validate_rejects_blank_name_and_bad_amounts() {
        let draft = SubscriptionDraft::new("  ", 9.99, BillingCycle::Monthly, date(2024, 3, 1));
        assert!(draft.validate().is_err());

        let draft = SubscriptionDraft::new("Music", 0.0, BillingCycle::Monthly, date(2024, 3, 1));
        assert!(draft.validate().is_err());

        let draft =
            SubscriptionDraft::new("Music", f64::NAN, BillingCycle::Monthly, date(2024, 3, 1));
        assert!(draft.validate().is_err());

        let draft = SubscriptionDraft::new("Music", -5.0, BillingCycle::Monthly, date(2024, 3, 1));
        assert!(draft.validate().is_err());
    }

    #[test]
    fn upcoming_window_is_inclusive_on_both_ends() {
        let today = date(2024, 3, 1);
        let draft = SubscriptionDraft::new("News", 12.0, BillingCycle::Monthly, today);
        let mut sub = Subscription::from_draft(draft, Utc::now());

        assert!(sub.is_upcoming(today));
        sub.next_billing_date = date(2024, 3, 8);
        assert!(sub.is_upcoming(today));
        sub.next_billing_date = date(2024, 3, 9);
        assert!(!sub.is_upcoming(today));
        sub.next_billing_date = date(2024, 2, 29);
        assert!(sub.is_expired(today));
        assert!(!sub.is_upcoming(today));
    }

    #[test]
    fn apply_draft_replaces_all_mutable_fields() {
        let created = Subscription::from_draft(
            SubscriptionDraft::new("Cloud", 60.0, BillingCycle::Yearly, date(2024, 5, 1))
                .with_category("Work")
                .with_note("annual plan"),
            Utc::now(),
        );
        let id = created.id;
        let mut sub = created;
        sub.apply_draft(SubscriptionDraft::new(
            " Cloud Pro ",
            120.0,
            BillingCycle::Monthly,
            date(2024, 6, 1),
        ));

        assert_eq!(sub.id, id);
        assert_eq!(sub.name, "Cloud Pro");
        assert_eq!(sub.amount, 120.0);
        assert_eq!(sub.cycle, BillingCycle::Monthly);
        assert!(sub.category.is_none());
        assert!(sub.note.is_none());
    }
}
