//! Utility functions and types.
//!
//! Logging and configuration helpers shared by every bookshop crate.

pub mod config;
pub mod logging;

pub use config::{
    BookConfig, CustomerConfig, OrderConfig, OutputConfig, ServicesConfig, StoreConfig,
    VehicleConfig,
};
pub use logging::{init_logger, LogLevel};
