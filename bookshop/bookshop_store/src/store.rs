//! The store: every piece of shared state, built once from configuration.
//!
//! Workers hold the store behind an `Arc`; there are no process-wide
//! singletons.

use crate::customer::Customer;
use crate::inventory::{BookInventoryInfo, Inventory};
use crate::register::MoneyRegister;
use crate::vehicle::DeliveryVehicle;
use bookshop_concurrency::{ResourcePool, ResourcePoolConfig};
use bookshop_core::error::{Result, StoreError};
use bookshop_core::StoreConfig;
use log::info;
use std::collections::BTreeMap;

/// Shared store state
pub struct Store {
    inventory: Inventory,
    register: MoneyRegister,
    customers: BTreeMap<u32, Customer>,
    vehicles: ResourcePool<DeliveryVehicle>,
    config: StoreConfig,
}

impl Store {
    /// Validate `config` and build the store it describes
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        config.validate()?;

        let inventory = Inventory::new();
        inventory.load(config.books.iter().map(BookInventoryInfo::from));

        let customers = config
            .customers
            .iter()
            .map(|c| (c.id, Customer::from(c)))
            .collect();

        let vehicles = ResourcePool::new(ResourcePoolConfig {
            name: "vehicles".to_string(),
            acquire_timeout: config.services.acquire_timeout(),
        });
        vehicles.load(config.vehicles.iter().map(DeliveryVehicle::from));

        info!(
            "Store opened with {} titles, {} vehicles, {} customers",
            config.books.len(),
            config.vehicles.len(),
            config.customers.len()
        );

        Ok(Self {
            inventory,
            register: MoneyRegister::new(),
            customers,
            vehicles,
            config: config.clone(),
        })
    }

    /// The shelves
    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// The money register
    pub fn register(&self) -> &MoneyRegister {
        &self.register
    }

    /// The delivery fleet
    pub fn vehicles(&self) -> &ResourcePool<DeliveryVehicle> {
        &self.vehicles
    }

    /// Look up a customer by id
    pub fn customer(&self, id: u32) -> Result<&Customer> {
        self.customers
            .get(&id)
            .ok_or_else(|| StoreError::UnknownCustomer(id).into())
    }

    /// All customers, ordered by id
    pub fn customers(&self) -> impl Iterator<Item = &Customer> {
        self.customers.values()
    }

    /// Configuration the store was built from
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}
