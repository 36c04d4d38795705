//! Facade that couples the billing book, the ledger store, the clock, and
//! persistence under one lock.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::billing::{BillingBook, CancellationRecord, Month, Subscription, SubscriptionDraft};
use crate::config::{Config, ConfigManager};
use crate::core::services::{
    CatchupReport, ChargeService, CostSummary, MonthCrossCheck, MonthlyRecap,
    SubscriptionOverview, SubscriptionService, SummaryService,
};
use crate::errors::Result;
use crate::ledger_store::LedgerStore;
use crate::storage::{JsonStorage, StorageBackend};
use crate::time::{Clock, SystemClock};

/// Single entry point for embedders. Every operation takes the book lock,
/// so concurrent `process` calls serialize and the catalog, charge ledger,
/// and archive stay one consistency domain. Mutations persist a snapshot
/// before the lock is released.
pub struct BillingEngine {
    book: Mutex<BillingBook>,
    book_name: String,
    storage: Box<dyn StorageBackend>,
    ledger_store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    config: Config,
}

impl BillingEngine {
    /// Loads the named book from storage, creating and persisting a fresh
    /// one when none exists yet.
    pub fn open(
        storage: Box<dyn StorageBackend>,
        ledger_store: Arc<dyn LedgerStore>,
        config: Config,
        book_name: &str,
    ) -> Result<Self> {
        let book = if storage.exists(book_name) {
            storage.load(book_name)?
        } else {
            let book = BillingBook::new(book_name);
            storage.save(&book, book_name)?;
            tracing::info!(book = book_name, "created new billing book");
            book
        };
        Ok(Self {
            book: Mutex::new(book),
            book_name: book_name.to_string(),
            storage,
            ledger_store,
            clock: Arc::new(SystemClock),
            config,
        })
    }

    /// Opens a book in the default data directory, with the persisted
    /// configuration and JSON storage wired together.
    pub fn open_with_defaults(ledger_store: Arc<dyn LedgerStore>, book_name: &str) -> Result<Self> {
        let config = ConfigManager::new()?.load()?;
        let storage = JsonStorage::new(None, Some(config.backup_retention))?;
        Self::open(Box::new(storage), ledger_store, config, book_name)
    }

    /// Replaces the system clock, mainly for deterministic tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn book_name(&self) -> &str {
        &self.book_name
    }

    pub fn create_subscription(&self, draft: SubscriptionDraft) -> Result<Subscription> {
        let mut book = self.lock_book();
        let created = SubscriptionService::add(&mut book, self.clock.as_ref(), draft)?;
        self.persist(&book)?;
        Ok(created)
    }

    pub fn update_subscription(&self, id: Uuid, draft: SubscriptionDraft) -> Result<Subscription> {
        let mut book = self.lock_book();
        let updated = SubscriptionService::edit(&mut book, id, draft)?;
        self.persist(&book)?;
        Ok(updated)
    }

    pub fn delete_subscription(&self, id: Uuid) -> Result<CancellationRecord> {
        let mut book = self.lock_book();
        let record = SubscriptionService::remove(&mut book, self.clock.as_ref(), id)?;
        self.persist(&book)?;
        Ok(record)
    }

    pub fn subscription(&self, id: Uuid) -> Result<SubscriptionOverview> {
        let book = self.lock_book();
        SubscriptionService::get(&book, self.clock.today(), id)
    }

    pub fn subscriptions(&self) -> Vec<SubscriptionOverview> {
        let book = self.lock_book();
        SubscriptionService::list(&book, self.clock.today())
    }

    pub fn upcoming(&self, within_days: i64) -> Vec<SubscriptionOverview> {
        let book = self.lock_book();
        SubscriptionService::upcoming(&book, self.clock.today(), within_days)
    }

    /// Realizes every due billing period up to `as_of` (today when `None`).
    /// Safe to invoke arbitrarily often; the lock is held for the whole
    /// pass including the snapshot save.
    pub fn process(&self, as_of: Option<NaiveDate>) -> Result<CatchupReport> {
        let as_of = as_of.unwrap_or_else(|| self.clock.today());
        let mut book = self.lock_book();
        let report = ChargeService::process(
            &mut book,
            self.ledger_store.as_ref(),
            self.clock.as_ref(),
            as_of,
            &self.config.fallback_category,
        );
        self.persist(&book)?;
        Ok(report)
    }

    pub fn monthly_cost_summary(&self) -> CostSummary {
        let book = self.lock_book();
        SummaryService::monthly_cost_summary(&book, self.clock.today())
    }

    pub fn monthly_recap(&self, month: Month) -> MonthlyRecap {
        let book = self.lock_book();
        SummaryService::monthly_recap(&book, self.clock.today(), month)
    }

    pub fn month_crosscheck(&self, month: Month) -> Result<MonthCrossCheck> {
        let book = self.lock_book();
        SummaryService::month_crosscheck(&book, self.ledger_store.as_ref(), month)
    }

    pub fn backup(&self, note: Option<&str>) -> Result<()> {
        let book = self.lock_book();
        self.storage.backup(&book, &self.book_name, note)
    }

    fn persist(&self, book: &BillingBook) -> Result<()> {
        self.storage.save(book, &self.book_name)
    }

    fn lock_book(&self) -> MutexGuard<'_, BillingBook> {
        self.book
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
