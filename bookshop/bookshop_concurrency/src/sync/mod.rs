//! Synchronization primitives.

pub mod lock;

pub use lock::{LockError, LockStats, TrackedMutex, TrackedMutexGuard};
