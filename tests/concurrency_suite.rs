mod common;

use std::sync::Arc;
use std::thread;

use billing_core::BillingCycle;
use common::{date, draft, engine_with_store};
use tempfile::TempDir;

#[test]
fn concurrent_processing_never_duplicates_charges() {
    let temp = TempDir::new().unwrap();
    let as_of = date(2024, 4, 10);
    let (engine, store) = engine_with_store(&temp, as_of);
    engine
        .create_subscription(draft("Gym", 30.0, BillingCycle::Monthly, date(2024, 1, 31)))
        .unwrap();
    engine
        .create_subscription(draft("Coffee", 5.0, BillingCycle::Weekly, date(2024, 3, 20)))
        .unwrap();

    let engine = Arc::new(engine);
    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = engine.clone();
        handles.push(thread::spawn(move || {
            engine.process(Some(as_of)).expect("process succeeds")
        }));
    }
    let reports: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread joins"))
        .collect();

    // Gym: Jan 31, Feb 29, Mar 29. Coffee: Mar 20, 27, Apr 3, 10.
    let expected_periods = 3 + 4;
    let total_created: usize = reports.iter().map(|report| report.created_charges).sum();
    assert_eq!(total_created, expected_periods, "each period realized once");
    assert_eq!(store.entry_count(), expected_periods);
    assert!(reports.iter().all(|report| report.failures.is_empty()));

    // A final pass confirms there is nothing left to do.
    let quiet = engine.process(Some(as_of)).unwrap();
    assert_eq!(quiet.created_charges, 0);
    assert_eq!(quiet.updated_subscriptions, 0);
}

#[test]
fn concurrent_reads_and_processing_stay_consistent() {
    let temp = TempDir::new().unwrap();
    let as_of = date(2024, 3, 15);
    let (engine, _store) = engine_with_store(&temp, as_of);
    engine
        .create_subscription(draft("Paper", 5.0, BillingCycle::Weekly, date(2024, 3, 1)))
        .unwrap();

    let engine = Arc::new(engine);
    let processor = {
        let engine = engine.clone();
        thread::spawn(move || engine.process(Some(as_of)).expect("process succeeds"))
    };
    let reader = {
        let engine = engine.clone();
        thread::spawn(move || {
            for _ in 0..20 {
                let summary = engine.monthly_cost_summary();
                assert_eq!(summary.total_count, 1);
            }
        })
    };
    processor.join().expect("processor joins");
    reader.join().expect("reader joins");

    let recap = engine.monthly_recap("2024-03".parse().unwrap());
    assert_eq!(recap.actual_charge_count, 3, "Mar 1, 8, 15");
}
