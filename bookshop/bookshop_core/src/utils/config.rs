//! Configuration utilities.
//!
//! A store is described by a single file listing the books on the shelves,
//! the delivery fleet, the customers and their orders, and how many worker
//! threads serve them. JSON files are recognised by extension; anything else
//! is read as TOML.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A book stocked at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookConfig {
    /// Title, used as the inventory key
    pub title: String,

    /// Copies on the shelf
    pub amount: u32,

    /// Price per copy
    pub price: u32,
}

/// A delivery vehicle in the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleConfig {
    /// License number
    pub license: u32,

    /// Distance units covered per tick
    pub speed: u32,
}

/// A single order placed by a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfig {
    /// Title of the requested book
    pub title: String,

    /// Tick at which the order is placed
    pub tick: u64,
}

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerConfig {
    /// Customer id
    pub id: u32,

    /// Display name
    pub name: String,

    /// Delivery address
    pub address: String,

    /// Distance from the store to the address
    pub distance: u32,

    /// Credit available on the customer's card
    pub credit: u32,

    /// Orders in the customer's schedule
    #[serde(default)]
    pub orders: Vec<OrderConfig>,
}

/// Worker and timing parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Number of worker threads processing orders
    pub workers: usize,

    /// Length of one simulated tick in milliseconds
    pub tick_ms: u64,

    /// How long an order waits for a free vehicle before giving up
    pub acquire_timeout_ms: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            tick_ms: 1,
            acquire_timeout_ms: 5_000,
        }
    }
}

impl ServicesConfig {
    /// Length of one tick.
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Vehicle acquisition deadline.
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

/// Where shutdown snapshots are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Inventory snapshot (title to remaining amount)
    pub inventory: Option<PathBuf>,

    /// Receipt list snapshot
    pub receipts: Option<PathBuf>,
}

/// Complete description of a simulated store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Initial inventory
    #[serde(default)]
    pub books: Vec<BookConfig>,

    /// Delivery fleet
    #[serde(default)]
    pub vehicles: Vec<VehicleConfig>,

    /// Customers and their orders
    #[serde(default)]
    pub customers: Vec<CustomerConfig>,

    /// Worker parameters
    #[serde(default)]
    pub services: ServicesConfig,

    /// Snapshot destinations
    #[serde(default)]
    pub output: OutputConfig,
}

impl StoreConfig {
    /// Load a configuration file, choosing the format by extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_toml_str(&contents)
        }
    }

    /// Parse a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Parse a JSON document.
    pub fn from_json_str(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Check the configuration for contradictions.
    ///
    /// Orders for titles that are not stocked are allowed; they are declined
    /// when processed.
    pub fn validate(&self) -> Result<()> {
        let mut titles = HashSet::new();
        for book in &self.books {
            if !titles.insert(book.title.as_str()) {
                return Err(invalid(format!("duplicate book title: {}", book.title)));
            }
        }

        let mut licenses = HashSet::new();
        for vehicle in &self.vehicles {
            if vehicle.speed == 0 {
                return Err(invalid(format!(
                    "vehicle {} has zero speed",
                    vehicle.license
                )));
            }
            if !licenses.insert(vehicle.license) {
                return Err(invalid(format!(
                    "duplicate vehicle license: {}",
                    vehicle.license
                )));
            }
        }

        let mut ids = HashSet::new();
        for customer in &self.customers {
            if !ids.insert(customer.id) {
                return Err(invalid(format!("duplicate customer id: {}", customer.id)));
            }
        }

        if self.services.workers == 0 {
            return Err(invalid("services.workers must be at least 1"));
        }

        Ok(())
    }

    /// Total number of orders across all customers.
    pub fn order_count(&self) -> usize {
        self.customers.iter().map(|c| c.orders.len()).sum()
    }
}

fn invalid(message: impl Into<String>) -> crate::Error {
    ConfigError::Invalid(message.into()).into()
}
