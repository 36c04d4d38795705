//! Billing cadence arithmetic: due-date advancement and cost normalization.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::BillingError;

/// Weeks in an average month, used to normalize weekly amounts.
const WEEKS_PER_MONTH: f64 = 52.0 / 12.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
/// Enumerates the billing intervals a subscription can renew on.
pub enum BillingCycle {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl BillingCycle {
    pub const ALL: [BillingCycle; 4] = [
        BillingCycle::Weekly,
        BillingCycle::Monthly,
        BillingCycle::Quarterly,
        BillingCycle::Yearly,
    ];

    /// Returns the due date one cycle after `from`.
    ///
    /// Month-based cycles preserve the day-of-month, clamped to the last
    /// valid day of the target month (Jan 31 + 1 month lands on Feb 28/29).
    pub fn advance(self, from: NaiveDate) -> NaiveDate {
        match self {
            BillingCycle::Weekly => from + Duration::days(7),
            BillingCycle::Monthly => shift_month(from, 1),
            BillingCycle::Quarterly => shift_month(from, 3),
            BillingCycle::Yearly => shift_month(from, 12),
        }
    }

    /// Converts a per-cycle amount to its monthly-equivalent cost,
    /// rounded to cents.
    pub fn monthly_equivalent(self, amount: f64) -> f64 {
        let normalized = match self {
            BillingCycle::Weekly => amount * WEEKS_PER_MONTH,
            BillingCycle::Monthly => amount,
            BillingCycle::Quarterly => amount / 3.0,
            BillingCycle::Yearly => amount / 12.0,
        };
        round_cents(normalized)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BillingCycle::Weekly => "weekly",
            BillingCycle::Monthly => "monthly",
            BillingCycle::Quarterly => "quarterly",
            BillingCycle::Yearly => "yearly",
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingCycle {
    type Err = BillingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(BillingCycle::Weekly),
            "monthly" => Ok(BillingCycle::Monthly),
            "quarterly" => Ok(BillingCycle::Quarterly),
            "yearly" => Ok(BillingCycle::Yearly),
            other => Err(BillingError::Validation(format!(
                "unknown billing cycle `{}`",
                other
            ))),
        }
    }
}

/// Rounds a monetary amount to two decimal places.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

fn shift_month(date: NaiveDate, months: i32) -> NaiveDate {
    use chrono::Datelike;

    let mut year = date.year();
    let mut month = date.month() as i32 + months;
    while month > 12 {
        month -= 12;
        year += 1;
    }
    while month < 1 {
        month += 12;
        year -= 1;
    }
    let day = date.day().min(days_in_month(year, month as u32));
    NaiveDate::from_ymd_opt(year, month as u32, day).unwrap()
}

fn days_in_month(year: i32, month: u32) -> u32 {
    use chrono::Datelike;

    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let first_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, month, 28).unwrap());
    (first_next - Duration::days(1)).day()
}
