//! # Bookshop Core
//!
//! `bookshop_core` provides the building blocks shared by every crate in the
//! bookshop simulation: the error hierarchy, typed identifiers, logging
//! helpers and the store configuration model.
//!
//! ## Crate Structure
//!
//! - **error**: Error types for all bookshop components
//! - **id**: Strongly-typed identifier types
//! - **utils**: Logging and configuration
//! - **macros**: Convenience macros for structured logging

pub mod error;
pub mod id;
pub mod macros;
pub mod utils;

pub use error::{ConcurrencyError, ConfigError, Error, ObservabilityError, Result, StoreError};
pub use id::{OrderId, ReceiptId};
pub use utils::{LogLevel, StoreConfig};
