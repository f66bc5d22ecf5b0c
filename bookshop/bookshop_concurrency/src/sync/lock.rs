//! Named mutex with contention statistics.
//!
//! Every piece of shared store state sits behind one of these, so the amount
//! of time workers spend queueing on the pool, the inventory or the register
//! can be read back after a run.

use log::{trace, warn};
use parking_lot::{Mutex, MutexGuard};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Error when acquiring a lock
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// The lock could not be acquired within the specified timeout
    #[error("lock acquisition timed out after {0:?}")]
    Timeout(Duration),
}

/// Snapshot of lock usage
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LockStats {
    /// Number of successful lock acquisitions
    pub acquisition_count: usize,

    /// Number of timed-out acquisition attempts
    pub failed_count: usize,

    /// Total time spent waiting for the lock (microseconds)
    pub total_wait_time_us: u64,

    /// Total time the lock was held (microseconds)
    pub total_hold_time_us: u64,

    /// Maximum time spent waiting for the lock (microseconds)
    pub max_wait_time_us: u64,

    /// Maximum time the lock was held (microseconds)
    pub max_hold_time_us: u64,
}

impl LockStats {
    /// Ratio of average wait time to average hold time. Higher means more contention.
    pub fn contention_factor(&self) -> f64 {
        if self.acquisition_count == 0 || self.total_hold_time_us == 0 {
            return 0.0;
        }
        self.total_wait_time_us as f64 / self.total_hold_time_us as f64
    }
}

#[derive(Debug, Default)]
struct Counters {
    acquisitions: AtomicUsize,
    failures: AtomicUsize,
    total_wait_us: AtomicU64,
    total_hold_us: AtomicU64,
    max_wait_us: AtomicU64,
    max_hold_us: AtomicU64,
}

impl Counters {
    fn record_wait(&self, waited: Duration) {
        let us = waited.as_micros() as u64;
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        self.total_wait_us.fetch_add(us, Ordering::Relaxed);
        self.max_wait_us.fetch_max(us, Ordering::Relaxed);
    }

    fn record_hold(&self, held: Duration) {
        let us = held.as_micros() as u64;
        self.total_hold_us.fetch_add(us, Ordering::Relaxed);
        self.max_hold_us.fetch_max(us, Ordering::Relaxed);
    }
}

/// A mutex that records how long callers wait for it and hold it
pub struct TrackedMutex<T> {
    mutex: Mutex<T>,
    counters: Counters,
    name: String,
}

/// Guard returned by [`TrackedMutex`]; records the hold time when dropped
pub struct TrackedMutexGuard<'a, T> {
    guard: MutexGuard<'a, T>,
    acquired_at: Instant,
    counters: &'a Counters,
    name: &'a str,
}

impl<T> TrackedMutex<T> {
    /// Create an unnamed tracked mutex
    pub fn new(value: T) -> Self {
        Self::with_name(value, "unnamed")
    }

    /// Create a tracked mutex whose name appears in trace output
    pub fn with_name(value: T, name: impl Into<String>) -> Self {
        Self {
            mutex: Mutex::new(value),
            counters: Counters::default(),
            name: name.into(),
        }
    }

    /// Lock the mutex, blocking until it is available
    pub fn lock(&self) -> TrackedMutexGuard<'_, T> {
        let start = Instant::now();
        let guard = self.mutex.lock();
        self.guard(guard, start.elapsed())
    }

    /// Lock the mutex if it is free right now
    pub fn try_lock(&self) -> Option<TrackedMutexGuard<'_, T>> {
        let guard = self.mutex.try_lock()?;
        Some(self.guard(guard, Duration::ZERO))
    }

    /// Lock the mutex, giving up after `timeout`
    pub fn try_lock_for(&self, timeout: Duration) -> Result<TrackedMutexGuard<'_, T>, LockError> {
        let start = Instant::now();
        match self.mutex.try_lock_for(timeout) {
            Some(guard) => Ok(self.guard(guard, start.elapsed())),
            None => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                warn!("Lock timeout: {} (timeout: {:?})", self.name, timeout);
                Err(LockError::Timeout(timeout))
            }
        }
    }

    /// Current usage statistics
    pub fn stats(&self) -> LockStats {
        let c = &self.counters;
        LockStats {
            acquisition_count: c.acquisitions.load(Ordering::Relaxed),
            failed_count: c.failures.load(Ordering::Relaxed),
            total_wait_time_us: c.total_wait_us.load(Ordering::Relaxed),
            total_hold_time_us: c.total_hold_us.load(Ordering::Relaxed),
            max_wait_time_us: c.max_wait_us.load(Ordering::Relaxed),
            max_hold_time_us: c.max_hold_us.load(Ordering::Relaxed),
        }
    }

    /// Name given at construction
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Consume the mutex and return the protected value
    pub fn into_inner(self) -> T {
        self.mutex.into_inner()
    }

    fn guard<'a>(&'a self, guard: MutexGuard<'a, T>, waited: Duration) -> TrackedMutexGuard<'a, T> {
        self.counters.record_wait(waited);
        trace!("Lock acquired: {} (waited {:?})", self.name, waited);
        TrackedMutexGuard {
            guard,
            acquired_at: Instant::now(),
            counters: &self.counters,
            name: &self.name,
        }
    }
}

impl<T: Default> Default for TrackedMutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Drop for TrackedMutexGuard<'_, T> {
    fn drop(&mut self) {
        let held = self.acquired_at.elapsed();
        self.counters.record_hold(held);
        trace!("Lock released: {} (held {:?})", self.name, held);
    }
}

impl<T> Deref for TrackedMutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl<T> DerefMut for TrackedMutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_tracked_mutex_basic() {
        let mutex = TrackedMutex::with_name(0, "counter");
        *mutex.lock() += 5;
        assert_eq!(*mutex.lock(), 5);
        assert_eq!(mutex.name(), "counter");
        assert_eq!(mutex.stats().acquisition_count, 2);
    }

    #[test]
    fn test_tracked_mutex_try_lock() {
        let mutex = TrackedMutex::new(());
        let first = mutex.try_lock();
        assert!(first.is_some());
        assert!(mutex.try_lock().is_none());
        drop(first);
        assert!(mutex.try_lock().is_some());

        let stats = mutex.stats();
        assert_eq!(stats.acquisition_count, 2);
        assert_eq!(stats.failed_count, 0);
    }

    #[test]
    fn test_tracked_mutex_timeout() {
        let mutex = Arc::new(TrackedMutex::new(0));
        let guard = mutex.lock();

        let contender = Arc::clone(&mutex);
        let handle = thread::spawn(move || contender.try_lock_for(Duration::from_millis(10)).is_err());
        assert!(handle.join().unwrap());
        drop(guard);

        let stats = mutex.stats();
        assert_eq!(stats.acquisition_count, 1);
        assert_eq!(stats.failed_count, 1);
    }

    #[test]
    fn test_tracked_mutex_contention() {
        let mutex = Arc::new(TrackedMutex::with_name(0usize, "contended"));
        let threads = 8;
        let iterations = 100;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let mutex = Arc::clone(&mutex);
                thread::spawn(move || {
                    for _ in 0..iterations {
                        let mut guard = mutex.lock();
                        *guard += 1;
                        thread::sleep(Duration::from_micros(10));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*mutex.lock(), threads * iterations);
        let stats = mutex.stats();
        assert_eq!(stats.acquisition_count, threads * iterations + 1);
        assert!(stats.total_hold_time_us > 0);
        assert!(stats.max_hold_time_us >= 10);
    }

    #[test]
    fn test_contention_factor_empty() {
        assert_eq!(LockStats::default().contention_factor(), 0.0);
    }
}
