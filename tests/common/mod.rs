use std::sync::Arc;

use billing_core::{
    BillingCycle, BillingEngine, Config, FixedClock, JsonStorage, MemoryLedgerStore,
    SubscriptionDraft,
};
use chrono::NaiveDate;
use tempfile::TempDir;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn draft(name: &str, amount: f64, cycle: BillingCycle, due: NaiveDate) -> SubscriptionDraft {
    SubscriptionDraft::new(name, amount, cycle, due)
}

pub fn engine_with_store(
    temp: &TempDir,
    today: NaiveDate,
) -> (BillingEngine, Arc<MemoryLedgerStore>) {
    let storage = JsonStorage::new(Some(temp.path().to_path_buf()), Some(3)).expect("storage");
    let store = Arc::new(MemoryLedgerStore::new());
    let engine = BillingEngine::open(
        Box::new(storage),
        store.clone(),
        Config::default(),
        "household",
    )
    .expect("engine opens")
    .with_clock(Arc::new(FixedClock(today)));
    (engine, store)
}
