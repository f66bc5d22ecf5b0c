//! Error types for the bookshop system.
//!
//! Each subsystem has its own error enum. The root `Error` wraps all of them
//! so that callers at the top level can handle failures uniformly.
//!
//! Note that the resource pool never rejects a request: exhaustion is absorbed
//! as waiting. The only pool-related failures are timeouts, cancellations and
//! contract violations.

use thiserror::Error;

/// Root error type for the bookshop system.
#[derive(Debug, Error)]
pub enum Error {
    /// Concurrency and coordination errors
    #[error("Concurrency error: {0}")]
    Concurrency(#[from] ConcurrencyError),

    /// Store state errors (inventory, customers, register)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging errors
    #[error("Observability error: {0}")]
    Observability(#[from] ObservabilityError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors related to coordination between worker threads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConcurrencyError {
    /// A blocking read exceeded its deadline
    #[error("Timed out after {0}ms")]
    Timeout(u64),

    /// A placeholder was resolved twice, or the pool was otherwise misused
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    /// The placeholder was withdrawn before it was resolved
    #[error("Request was cancelled")]
    Cancelled,

    /// The worker pool no longer accepts tasks
    #[error("Worker pool is shutting down")]
    WorkerPoolShutdown,

    /// The worker pool queue is at capacity
    #[error("Worker pool queue is full")]
    WorkerQueueFull,
}

/// Domain errors raised by the store state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The book is unknown or has no copies left
    #[error("Book not available: {0}")]
    NotAvailable(String),

    /// The customer cannot pay for the order
    #[error("Customer {customer} has insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Customer identifier
        customer: u32,
        /// Amount that was requested
        required: u32,
        /// Credit left on the card
        available: u32,
    },

    /// No customer with the given id is registered
    #[error("Unknown customer: {0}")]
    UnknownCustomer(u32),
}

/// Errors related to the configuration file.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// The file parsed but describes an impossible store
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors related to logging setup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObservabilityError {
    /// A global logger was already installed for this process
    #[error("A logger is already installed")]
    LoggerAlreadyInstalled,
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type used throughout the bookshop system.
pub type Result<T> = std::result::Result<T, Error>;
