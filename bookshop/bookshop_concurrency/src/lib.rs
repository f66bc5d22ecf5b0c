#![deny(warnings)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

//! # Bookshop Concurrency
//!
//! Coordination primitives shared by the store's worker threads:
//!
//! - [`Future`]: a single-assignment placeholder readers can block on
//! - [`ResourcePool`]: hands out interchangeable resources, deferring the
//!   request with a [`Future`] when none is idle
//! - [`WorkerPool`]: fixed worker threads fed through a channel
//! - [`TrackedMutex`]: a named mutex that records contention

/// Single-assignment placeholders
pub mod future;

/// Resource and worker pools
pub mod pool;

/// Locks with statistics
pub mod sync;

pub use future::{Future, FutureError};
pub use pool::resource::{PoolStats, ResourcePool, ResourcePoolConfig, ResourcePoolError};
pub use pool::worker::{WorkerPool, WorkerPoolConfig, WorkerPoolError, WorkerPoolStats};
pub use sync::lock::{LockError, LockStats, TrackedMutex, TrackedMutexGuard};
