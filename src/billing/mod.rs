//! Billing domain models: cycles, subscriptions, charges, and the book.

pub mod book;
pub mod cancellation;
pub mod charge;
pub mod cycle;
pub mod month;
pub mod subscription;

pub use book::{BillingBook, RecordOutcome, CURRENT_SCHEMA_VERSION};
pub use cancellation::CancellationRecord;
pub use charge::{Charge, ChargeTotals};
pub use cycle::{round_cents, BillingCycle};
pub use month::{parse_date, Month};
pub use subscription::{Subscription, SubscriptionDraft, UPCOMING_WINDOW_DAYS};
