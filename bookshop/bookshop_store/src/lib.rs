#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

//! # Bookshop Store
//!
//! Shared state of the bookshop: the inventory, the money register, the
//! customers and the delivery fleet. All of it is safe to use from many
//! worker threads at once.

pub mod customer;
pub mod inventory;
pub mod receipt;
pub mod register;
pub mod snapshot;
pub mod store;
pub mod vehicle;

pub use customer::Customer;
pub use inventory::{BookInventoryInfo, Inventory, OrderResult};
pub use receipt::OrderReceipt;
pub use register::MoneyRegister;
pub use snapshot::Snapshot;
pub use store::Store;
pub use vehicle::DeliveryVehicle;
