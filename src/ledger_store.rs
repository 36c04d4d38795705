//! Boundary to the external ledger store that keeps the actual
//! expense/income records. The billing core writes one entry per realized
//! charge and reads back a month of entries only for cross-checks.

use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::billing::Month;
use crate::errors::{BillingError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Income,
    Expense,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Income => f.write_str("income"),
            EntryKind::Expense => f.write_str("expense"),
        }
    }
}

/// Fields for a new ledger entry, shaped after the store's write API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntryDraft {
    pub amount: f64,
    pub kind: EntryKind,
    pub date: NaiveDate,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub amount: f64,
    pub kind: EntryKind,
    pub date: NaiveDate,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// External transaction keeper consumed, but not owned, by this crate.
pub trait LedgerStore: Send + Sync {
    /// Creates one entry and returns its id.
    fn create_entry(&self, draft: LedgerEntryDraft) -> Result<Uuid>;

    /// Entries whose date falls in the given month. Used only by the
    /// metrics cross-check.
    fn entries_for_month(&self, month: Month) -> Result<Vec<LedgerEntry>>;
}

/// In-memory ledger store for embedding, demos, and tests.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    entries: Mutex<Vec<LedgerEntry>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.lock().clone()
    }

    pub fn entry_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LedgerEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn create_entry(&self, draft: LedgerEntryDraft) -> Result<Uuid> {
        if !draft.amount.is_finite() || draft.amount <= 0.0 {
            return Err(BillingError::LedgerStore(format!(
                "entry amount must be positive, got {}",
                draft.amount
            )));
        }
        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            amount: draft.amount,
            kind: draft.kind,
            date: draft.date,
            category: draft.category,
            tags: draft.tags,
            payment_method: draft.payment_method,
            note: draft.note,
            created_at: Utc::now(),
        };
        let id = entry.id;
        self.lock().push(entry);
        Ok(id)
    }

    fn entries_for_month(&self, month: Month) -> Result<Vec<LedgerEntry>> {
        Ok(self
            .lock()
            .iter()
            .filter(|entry| month.contains(entry.date))
            .cloned()
            .collect())
    }
}
