//! Pools of reusable things.
//!
//! - Resource pools that hand out interchangeable resources now or later
//! - Worker pools that run store services on a fixed set of threads

pub mod resource;
pub mod worker;

pub use resource::{PoolStats, ResourcePool, ResourcePoolConfig, ResourcePoolError};
pub use worker::{WorkerPool, WorkerPoolConfig, WorkerPoolError, WorkerPoolStats};
