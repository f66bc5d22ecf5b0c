//! Deferred pool of interchangeable resources.
//!
//! [`ResourcePool::acquire`] never blocks and never fails. If a resource is
//! idle the caller gets an already-resolved [`Future`]; otherwise the caller
//! gets a pending one that the next [`ResourcePool::release`] resolves.
//! Waiters are served in the order they arrived.
//!
//! The idle queue and the waiter queue live under one lock, and at most one
//! of them is non-empty whenever that lock is free: a released resource goes
//! straight to the oldest live waiter and is only shelved when nobody waits.
//!
//! The waiter queue holds weak references. A placeholder whose handles have
//! all been dropped is skipped by `release`, so an abandoned request does not
//! swallow a resource. That includes a waiter dropped while `release` is
//! resolving it: the resource is taken back and offered to the next waiter. Callers that keep their handle but stop waiting should
//! withdraw it with [`ResourcePool::cancel`].

use crate::future::{Future, FutureError, Slot};
use crate::sync::lock::{LockStats, TrackedMutex};
use bookshop_core::error::ConcurrencyError;
use log::{debug, error, trace};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Error returned by [`ResourcePool::acquire_timeout`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourcePoolError {
    /// No resource was released before the deadline
    #[error("timeout after {0:?} waiting for a resource")]
    Timeout(Duration),
}

impl From<ResourcePoolError> for ConcurrencyError {
    fn from(err: ResourcePoolError) -> Self {
        match err {
            ResourcePoolError::Timeout(d) => ConcurrencyError::Timeout(d.as_millis() as u64),
        }
    }
}

impl From<ResourcePoolError> for bookshop_core::Error {
    fn from(err: ResourcePoolError) -> Self {
        ConcurrencyError::from(err).into()
    }
}

/// Configuration for a resource pool
#[derive(Debug, Clone)]
pub struct ResourcePoolConfig {
    /// Name used in log lines and lock statistics
    pub name: String,

    /// Deadline used by [`ResourcePool::acquire_default`]
    pub acquire_timeout: Duration,
}

impl Default for ResourcePoolConfig {
    fn default() -> Self {
        Self {
            name: "resource-pool".to_string(),
            acquire_timeout: Duration::from_secs(3),
        }
    }
}

/// Counters describing how requests were served
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PoolStats {
    /// Acquisitions satisfied from the idle queue
    pub immediate_acquisitions: usize,

    /// Acquisitions that had to wait
    pub deferred_acquisitions: usize,

    /// Releases handed directly to a waiter
    pub handoffs: usize,

    /// Releases shelved in the idle queue
    pub returns_to_idle: usize,

    /// Waiters withdrawn through `cancel`
    pub cancellations: usize,

    /// Dropped waiters skipped by `release`
    pub abandoned_waiters: usize,
}

#[derive(Debug, Default)]
struct Counters {
    immediate: AtomicUsize,
    deferred: AtomicUsize,
    handoffs: AtomicUsize,
    returns: AtomicUsize,
    cancellations: AtomicUsize,
    abandoned: AtomicUsize,
}

struct Waiter<R> {
    slot: Weak<Slot<R>>,
    enqueued_at: Instant,
}

enum Handoff<R> {
    Delivered,
    Abandoned(R),
    AlreadyCompleted(R),
}

/// Resolve an upgraded waiter slot with `resource`.
///
/// If the pool's handle turns out to be the last strong one, the waiter was
/// dropped after the upgrade and the resource is taken back out.
fn hand_off<R>(slot: &Arc<Slot<R>>, resource: R) -> Handoff<R> {
    if let Err(returned) = slot.try_resolve(resource) {
        return Handoff::AlreadyCompleted(returned);
    }
    if Arc::strong_count(slot) == 1 {
        if let Some(reclaimed) = slot.take_resolved() {
            return Handoff::Abandoned(reclaimed);
        }
    }
    Handoff::Delivered
}

struct PoolState<R> {
    idle: VecDeque<R>,
    waiters: VecDeque<Waiter<R>>,
    loaded: usize,
}

/// A pool that hands out resources now or promises them for later
pub struct ResourcePool<R> {
    state: TrackedMutex<PoolState<R>>,
    config: ResourcePoolConfig,
    counters: Counters,
}

impl<R> ResourcePool<R> {
    /// Create an empty pool
    pub fn new(config: ResourcePoolConfig) -> Self {
        let state = PoolState {
            idle: VecDeque::new(),
            waiters: VecDeque::new(),
            loaded: 0,
        };
        Self {
            state: TrackedMutex::with_name(state, config.name.clone()),
            config,
            counters: Counters::default(),
        }
    }

    /// Create an empty pool with the default configuration and the given name
    pub fn with_name(name: impl Into<String>) -> Self {
        Self::new(ResourcePoolConfig {
            name: name.into(),
            ..Default::default()
        })
    }

    /// Add resources to the pool.
    ///
    /// Meant for startup, but safe at any time: each resource goes through the
    /// same path as a release, so waiting callers are served first.
    pub fn load(&self, resources: impl IntoIterator<Item = R>) {
        let mut count = 0;
        for resource in resources {
            self.state.lock().loaded += 1;
            self.release(resource);
            count += 1;
        }
        debug!("{}: loaded {} resources", self.config.name, count);
    }

    /// Request a resource.
    ///
    /// The returned placeholder is already resolved when a resource was idle.
    /// Otherwise it resolves when some other thread calls [`release`](Self::release).
    pub fn acquire(&self) -> Future<R> {
        let mut state = self.state.lock();

        if let Some(resource) = state.idle.pop_front() {
            self.counters.immediate.fetch_add(1, Ordering::Relaxed);
            trace!("{}: acquired idle resource", self.config.name);
            return Future::resolved(resource);
        }

        let future = Future::new();
        state.waiters.push_back(Waiter {
            slot: future.downgrade(),
            enqueued_at: Instant::now(),
        });
        self.counters.deferred.fetch_add(1, Ordering::Relaxed);
        trace!(
            "{}: no idle resource, {} waiting",
            self.config.name,
            state.waiters.len()
        );
        future
    }

    /// Return a resource.
    ///
    /// The oldest live waiter receives it directly. With nobody waiting it is
    /// shelved for the next [`acquire`](Self::acquire).
    pub fn release(&self, resource: R) {
        let mut state = self.state.lock();
        let mut resource = resource;

        while let Some(waiter) = state.waiters.pop_front() {
            let Some(slot) = waiter.slot.upgrade() else {
                self.counters.abandoned.fetch_add(1, Ordering::Relaxed);
                debug!("{}: skipping abandoned waiter", self.config.name);
                continue;
            };

            match hand_off(&slot, resource) {
                Handoff::Delivered => {
                    self.counters.handoffs.fetch_add(1, Ordering::Relaxed);
                    trace!(
                        "{}: handed resource to waiter after {:?}",
                        self.config.name,
                        waiter.enqueued_at.elapsed()
                    );
                    return;
                }
                Handoff::Abandoned(reclaimed) => {
                    self.counters.abandoned.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        "{}: waiter dropped during hand-off, resource reclaimed",
                        self.config.name
                    );
                    resource = reclaimed;
                }
                Handoff::AlreadyCompleted(returned) => {
                    // Only this pool resolves or cancels queued slots, and both
                    // happen under the state lock.
                    error!(
                        "{}: {}",
                        self.config.name,
                        ConcurrencyError::ContractViolation(
                            "queued placeholder was already completed".to_string()
                        )
                    );
                    resource = returned;
                }
            }
        }

        state.idle.push_back(resource);
        self.counters.returns.fetch_add(1, Ordering::Relaxed);
        trace!(
            "{}: resource returned, {} idle",
            self.config.name,
            state.idle.len()
        );
    }

    /// Withdraw a pending request.
    ///
    /// Returns `true` if the placeholder was still waiting; it is then marked
    /// cancelled and readers get [`FutureError::Cancelled`]. Returns `false` if
    /// it had already been resolved, in which case the caller owns the
    /// resource and must release it.
    pub fn cancel(&self, future: &Future<R>) -> bool {
        let mut state = self.state.lock();

        let Some(index) = state.waiters.iter().position(|w| future.is_slot(&w.slot)) else {
            return false;
        };

        state.waiters.remove(index);
        let cancelled = future.cancel();

        if cancelled {
            self.counters.cancellations.fetch_add(1, Ordering::Relaxed);
            debug!("{}: waiter cancelled", self.config.name);
        }
        cancelled
    }

    /// Number of resources ready for immediate acquisition
    pub fn idle_count(&self) -> usize {
        self.state.lock().idle.len()
    }

    /// Number of callers still waiting for a resource
    pub fn pending_count(&self) -> usize {
        self.counts().1
    }

    /// Idle and pending counts read in one critical section
    pub fn counts(&self) -> (usize, usize) {
        let state = self.state.lock();
        let pending = state
            .waiters
            .iter()
            .filter(|w| w.slot.strong_count() > 0)
            .count();
        (state.idle.len(), pending)
    }

    /// Total number of resources ever loaded
    pub fn loaded_count(&self) -> usize {
        self.state.lock().loaded
    }

    /// Request counters
    pub fn stats(&self) -> PoolStats {
        let c = &self.counters;
        PoolStats {
            immediate_acquisitions: c.immediate.load(Ordering::Relaxed),
            deferred_acquisitions: c.deferred.load(Ordering::Relaxed),
            handoffs: c.handoffs.load(Ordering::Relaxed),
            returns_to_idle: c.returns.load(Ordering::Relaxed),
            cancellations: c.cancellations.load(Ordering::Relaxed),
            abandoned_waiters: c.abandoned.load(Ordering::Relaxed),
        }
    }

    /// Contention on the pool's internal lock
    pub fn lock_stats(&self) -> LockStats {
        self.state.stats()
    }

    /// Pool configuration
    pub fn config(&self) -> &ResourcePoolConfig {
        &self.config
    }
}

impl<R: Clone> ResourcePool<R> {
    /// Acquire and wait up to `timeout` for the resource.
    ///
    /// On timeout the request is withdrawn. If a release wins the race with
    /// the withdrawal, the resource it delivered is returned instead of an
    /// error, so no resource is ever lost.
    pub fn acquire_timeout(&self, timeout: Duration) -> Result<R, ResourcePoolError> {
        let future = self.acquire();
        match future.get_timeout(timeout) {
            Ok(resource) => Ok(resource),
            Err(FutureError::Timeout(_)) | Err(FutureError::Cancelled) => {
                if self.cancel(&future) {
                    debug!(
                        "{}: gave up waiting after {:?}",
                        self.config.name, timeout
                    );
                    Err(ResourcePoolError::Timeout(timeout))
                } else {
                    future.try_get().ok_or(ResourcePoolError::Timeout(timeout))
                }
            }
        }
    }

    /// Acquire with the configured default deadline
    pub fn acquire_default(&self) -> Result<R, ResourcePoolError> {
        self.acquire_timeout(self.config.acquire_timeout)
    }
}

impl<R> Default for ResourcePool<R> {
    fn default() -> Self {
        Self::new(ResourcePoolConfig::default())
    }
}
