pub mod json_backend;

use std::path::Path;

use crate::billing::BillingBook;
use crate::errors::Result;

/// Abstraction over persistence backends capable of storing billing books
/// and snapshots.
pub trait StorageBackend: Send + Sync {
    fn save(&self, book: &BillingBook, name: &str) -> Result<()>;
    fn load(&self, name: &str) -> Result<BillingBook>;
    fn exists(&self, name: &str) -> bool;
    fn list_backups(&self, name: &str) -> Result<Vec<String>>;
    fn backup(&self, book: &BillingBook, name: &str, note: Option<&str>) -> Result<()>;
    fn restore(&self, name: &str, backup_name: &str) -> Result<BillingBook>;

    /// Optional helpers for ad-hoc file operations. Default implementations
    /// forward to the JSON format when not overridden.
    fn save_to_path(&self, book: &BillingBook, path: &Path) -> Result<()> {
        json_backend::save_book_to_path(book, path)
    }

    fn load_from_path(&self, path: &Path) -> Result<BillingBook> {
        json_backend::load_book_from_path(path)
    }
}

pub use json_backend::JsonStorage;
