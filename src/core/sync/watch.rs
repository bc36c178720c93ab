/*!
 * Watch Cell
 *
 * Shared state behind a parking_lot::Mutex whose every mutation wakes all
 * blocked waiters. Waiters re-evaluate their predicate under the lock after
 * each wake, so a mutation that happens before a waiter parks is never lost.
 *
 * Unlike `SyncChannel`, nothing is consumed: every waiter observes the same
 * state, which makes this the broadcast counterpart of the channel.
 */

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Result type for wait operations
pub type WaitResult<T> = Result<T, WaitError>;

/// Wait operation errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    #[error("Wait operation timed out")]
    Timeout,
}

/// Broadcast state cell
pub struct Watch<S> {
    state: Mutex<S>,
    changed: Condvar,
    waiters: AtomicUsize,
}

impl<S> Watch<S> {
    pub fn new(initial: S) -> Self {
        Self {
            state: Mutex::new(initial),
            changed: Condvar::new(),
            waiters: AtomicUsize::new(0),
        }
    }

    /// Run `f` against a consistent snapshot of the state
    #[inline]
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&*self.state.lock())
    }

    /// Mutate the state under the lock, then wake every waiter
    ///
    /// Everything `f` does happens in one critical section.
    pub fn modify<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let result = {
            let mut state = self.state.lock();
            f(&mut *state)
        };
        self.changed.notify_all();
        result
    }

    /// Block until `ready` yields a value, or until `timeout` elapses
    ///
    /// `ready` is checked before waiting and after each wake. A timeout too
    /// large to form a deadline waits without one.
    pub fn wait_until<R>(
        &self,
        timeout: Option<Duration>,
        mut ready: impl FnMut(&S) -> Option<R>,
    ) -> WaitResult<R> {
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut state = self.state.lock();

        loop {
            if let Some(result) = ready(&*state) {
                return Ok(result);
            }

            match deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return Err(WaitError::Timeout);
                    }
                    self.waiters.fetch_add(1, Ordering::Relaxed);
                    self.changed.wait_until(&mut state, deadline);
                    self.waiters.fetch_sub(1, Ordering::Relaxed);
                }
                None => {
                    self.waiters.fetch_add(1, Ordering::Relaxed);
                    self.changed.wait(&mut state);
                    self.waiters.fetch_sub(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Approximate count of parked waiters (for diagnostics)
    #[inline]
    pub fn waiter_count(&self) -> usize {
        self.waiters.load(Ordering::Relaxed)
    }
}

impl<S: Default> Default for Watch<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}
