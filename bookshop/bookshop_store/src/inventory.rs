//! Book inventory.
//!
//! Titles map to the number of copies on the shelf and their price. Every
//! read-check-write sequence runs under the inventory lock, so two sellers
//! can never both take the last copy.

use crate::snapshot::Snapshot;
use bookshop_concurrency::{LockStats, TrackedMutex};
use bookshop_core::error::{Result, StoreError};
use bookshop_core::utils::BookConfig;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Stock information for one title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookInventoryInfo {
    /// Title of the book
    pub title: String,

    /// Copies on the shelf
    pub amount: u32,

    /// Price per copy
    pub price: u32,
}

impl BookInventoryInfo {
    /// Create stock information
    pub fn new(title: impl Into<String>, amount: u32, price: u32) -> Self {
        Self {
            title: title.into(),
            amount,
            price,
        }
    }
}

impl From<&BookConfig> for BookInventoryInfo {
    fn from(config: &BookConfig) -> Self {
        Self::new(config.title.clone(), config.amount, config.price)
    }
}

/// Outcome of taking a copy off the shelf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderResult {
    /// One copy was removed
    SuccessfullyTaken,

    /// The title is unknown or sold out; nothing changed
    NotInStock,
}

/// The store's shelves
pub struct Inventory {
    books: TrackedMutex<HashMap<String, BookInventoryInfo>>,
}

impl Inventory {
    /// Create an empty inventory
    pub fn new() -> Self {
        Self {
            books: TrackedMutex::with_name(HashMap::new(), "inventory"),
        }
    }

    /// Stock the shelves. A title that is already present is replaced.
    pub fn load(&self, books: impl IntoIterator<Item = BookInventoryInfo>) {
        let mut shelves = self.books.lock();
        for book in books {
            shelves.insert(book.title.clone(), book);
        }
        debug!("Inventory loaded with {} titles", shelves.len());
    }

    /// Take one copy of `title` off the shelf
    pub fn take(&self, title: &str) -> OrderResult {
        let mut shelves = self.books.lock();
        match shelves.get_mut(title) {
            Some(book) if book.amount > 0 => {
                book.amount -= 1;
                trace!("Took '{}', {} left", title, book.amount);
                OrderResult::SuccessfullyTaken
            }
            _ => OrderResult::NotInStock,
        }
    }

    /// Price of `title` if at least one copy is on the shelf
    pub fn check_availability_and_get_price(&self, title: &str) -> Option<u32> {
        self.books
            .lock()
            .get(title)
            .filter(|book| book.amount > 0)
            .map(|book| book.price)
    }

    /// Take one copy and return its price, or fail with `StoreError::NotAvailable`
    pub fn reserve(&self, title: &str) -> Result<u32> {
        let mut shelves = self.books.lock();
        match shelves.get_mut(title) {
            Some(book) if book.amount > 0 => {
                book.amount -= 1;
                trace!("Reserved '{}', {} left", title, book.amount);
                Ok(book.price)
            }
            _ => Err(StoreError::NotAvailable(title.to_string()).into()),
        }
    }

    /// Put one copy of a known title back on the shelf.
    ///
    /// Returns false if the title was never stocked.
    pub fn restock(&self, title: &str) -> bool {
        match self.books.lock().get_mut(title) {
            Some(book) => {
                book.amount += 1;
                true
            }
            None => false,
        }
    }

    /// Copies of `title` on the shelf, or `None` for an unknown title
    pub fn amount_of(&self, title: &str) -> Option<u32> {
        self.books.lock().get(title).map(|book| book.amount)
    }

    /// Number of distinct titles
    pub fn title_count(&self) -> usize {
        self.books.lock().len()
    }

    /// Contention on the inventory lock
    pub fn lock_stats(&self) -> LockStats {
        self.books.stats()
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

impl Snapshot for Inventory {
    type Output = BTreeMap<String, u32>;

    fn snapshot(&self) -> Self::Output {
        self.books
            .lock()
            .iter()
            .map(|(title, book)| (title.clone(), book.amount))
            .collect()
    }
}
