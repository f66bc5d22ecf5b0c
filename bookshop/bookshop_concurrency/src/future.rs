//! Single-assignment placeholder for a value produced by another thread.
//!
//! A [`Future`] starts pending, is resolved exactly once, and can be read by
//! any number of threads. Readers either block until the value arrives or
//! poll without blocking. Clones share the same slot.
//!
//! Resolving a placeholder twice is a bug in the caller. [`Future::resolve`]
//! panics when it happens; [`Future::try_resolve`] hands the value back
//! instead.

use bookshop_core::error::ConcurrencyError;
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Error returned when reading a placeholder
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FutureError {
    /// The value did not arrive before the deadline
    #[error("timed out after {0:?} waiting for a value")]
    Timeout(Duration),

    /// The placeholder was withdrawn and will never be resolved
    #[error("placeholder was cancelled")]
    Cancelled,
}

impl From<FutureError> for ConcurrencyError {
    fn from(err: FutureError) -> Self {
        match err {
            FutureError::Timeout(d) => ConcurrencyError::Timeout(d.as_millis() as u64),
            FutureError::Cancelled => ConcurrencyError::Cancelled,
        }
    }
}

impl From<FutureError> for bookshop_core::Error {
    fn from(err: FutureError) -> Self {
        ConcurrencyError::from(err).into()
    }
}

enum State<T> {
    Pending,
    Resolved(T),
    Cancelled,
}

pub(crate) struct Slot<T> {
    state: Mutex<State<T>>,
    changed: Condvar,
}

impl<T> Slot<T> {
    /// Move a pending slot to `Cancelled`. Returns false if it already left `Pending`.
    pub(crate) fn cancel(&self) -> bool {
        let mut state = self.state.lock();
        if !matches!(*state, State::Pending) {
            return false;
        }
        *state = State::Cancelled;
        self.changed.notify_all();
        true
    }

    /// Take the value back out of a resolved slot that nobody else can read.
    pub(crate) fn take_resolved(&self) -> Option<T> {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, State::Cancelled) {
            State::Resolved(value) => Some(value),
            other => {
                *state = other;
                None
            }
        }
    }

    pub(crate) fn try_resolve(&self, value: T) -> Result<(), T> {
        let mut state = self.state.lock();
        if !matches!(*state, State::Pending) {
            return Err(value);
        }
        *state = State::Resolved(value);
        self.changed.notify_all();
        Ok(())
    }
}

/// A placeholder for a value that may not exist yet
pub struct Future<T> {
    slot: Arc<Slot<T>>,
}

impl<T> Future<T> {
    /// Create an unresolved placeholder
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Slot {
                state: Mutex::new(State::Pending),
                changed: Condvar::new(),
            }),
        }
    }

    /// Create a placeholder that already holds `value`
    pub fn resolved(value: T) -> Self {
        let future = Self::new();
        future.resolve(value);
        future
    }

    /// Set the value and wake every blocked reader.
    ///
    /// # Panics
    ///
    /// Panics if the placeholder was already resolved or cancelled.
    pub fn resolve(&self, value: T) {
        if self.try_resolve(value).is_err() {
            let violation =
                ConcurrencyError::ContractViolation("placeholder resolved twice".to_string());
            log::error!("{}", violation);
            panic!("{}", violation);
        }
    }

    /// Set the value, or give it back if the placeholder is no longer pending
    pub fn try_resolve(&self, value: T) -> Result<(), T> {
        self.slot.try_resolve(value)
    }

    /// Check whether a value is present, without blocking
    pub fn is_resolved(&self) -> bool {
        matches!(*self.slot.state.lock(), State::Resolved(_))
    }

    /// Check whether the placeholder was withdrawn
    pub fn is_cancelled(&self) -> bool {
        matches!(*self.slot.state.lock(), State::Cancelled)
    }

    /// Block until the value is available and pass a reference to `f`.
    ///
    /// Unlike [`get`](Self::get) this needs no `Clone`; every reader sees the
    /// one stored instance.
    pub fn with<U>(&self, f: impl FnOnce(&T) -> U) -> Result<U, FutureError> {
        let mut state = self.slot.state.lock();
        loop {
            match &*state {
                State::Resolved(value) => return Ok(f(value)),
                State::Cancelled => return Err(FutureError::Cancelled),
                State::Pending => self.slot.changed.wait(&mut state),
            }
        }
    }

    pub(crate) fn cancel(&self) -> bool {
        self.slot.cancel()
    }

    pub(crate) fn downgrade(&self) -> Weak<Slot<T>> {
        Arc::downgrade(&self.slot)
    }

    pub(crate) fn is_slot(&self, other: &Weak<Slot<T>>) -> bool {
        std::ptr::eq(Arc::as_ptr(&self.slot), other.as_ptr())
    }
}

/// Reads hand out clones of the stored value. Use [`Future::with`] to borrow
/// it instead, or store an `Arc` when readers need to share one instance.
impl<T: Clone> Future<T> {
    /// Block until the value is available and return a clone of it
    pub fn get(&self) -> Result<T, FutureError> {
        let mut state = self.slot.state.lock();
        loop {
            match &*state {
                State::Resolved(value) => return Ok(value.clone()),
                State::Cancelled => return Err(FutureError::Cancelled),
                State::Pending => self.slot.changed.wait(&mut state),
            }
        }
    }

    /// Block until the value is available or `timeout` elapses
    pub fn get_timeout(&self, timeout: Duration) -> Result<T, FutureError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.slot.state.lock();
        loop {
            match &*state {
                State::Resolved(value) => return Ok(value.clone()),
                State::Cancelled => return Err(FutureError::Cancelled),
                State::Pending => {
                    if self
                        .slot
                        .changed
                        .wait_until(&mut state, deadline)
                        .timed_out()
                        && matches!(*state, State::Pending)
                    {
                        return Err(FutureError::Timeout(timeout));
                    }
                }
            }
        }
    }

    /// Return the value if it is already available
    pub fn try_get(&self) -> Option<T> {
        match &*self.slot.state.lock() {
            State::Resolved(value) => Some(value.clone()),
            _ => None,
        }
    }
}

impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Default for Future<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match *self.slot.state.lock() {
            State::Pending => "pending",
            State::Resolved(_) => "resolved",
            State::Cancelled => "cancelled",
        };
        f.debug_struct("Future").field("status", &status).finish()
    }
}
