#![doc(test(attr(deny(warnings))))]

//! Billing Core turns declarative subscription definitions into realized,
//! idempotent charge records over time, normalizes heterogeneous billing
//! cycles onto a monthly cost basis, and produces point-in-time metrics.

pub mod billing;
pub mod config;
pub mod core;
pub mod engine;
pub mod errors;
pub mod ledger_store;
pub mod storage;
pub mod time;
pub mod utils;

pub use billing::{
    BillingBook, BillingCycle, CancellationRecord, Charge, ChargeTotals, Month, Subscription,
    SubscriptionDraft,
};
pub use config::{Config, ConfigManager};
pub use crate::core::services::{
    CatchupFailure, CatchupReport, ChargeService, CostSummary, MonthCrossCheck, MonthlyRecap,
    SubscriptionOverview, SubscriptionService, SummaryService,
};
pub use engine::BillingEngine;
pub use errors::{BillingError, Result};
pub use ledger_store::{EntryKind, LedgerEntry, LedgerEntryDraft, LedgerStore, MemoryLedgerStore};
pub use storage::{JsonStorage, StorageBackend};
pub use time::{Clock, FixedClock, SystemClock};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Billing Core tracing initialized.");
    });
}
