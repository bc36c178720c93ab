/*!
 * Synchronized Channel
 *
 * Unbounded single-item handoff between threads using parking_lot::Mutex
 * and parking_lot::Condvar. Senders never block; receivers park on the
 * condvar until a value is available.
 *
 * # Retrieval Policy
 *
 * Values are removed either newest-first (`Lifo`, the default) or
 * oldest-first (`Fifo`). With a single producer alternating two values and a
 * single consumer the two are indistinguishable. Under bursts or several
 * consumers `Lifo` hands out the freshest value first, so older values may
 * be observed after newer ones.
 */

use super::config::RetrievalPolicy;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Channel receive errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Channel closed")]
    Closed,

    #[error("Receive timed out")]
    Timeout,

    #[error("Channel empty")]
    Empty,
}

struct Inner<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Blocking, unbounded channel shared by reference (wrap in `Arc` to share)
///
/// # Examples
///
/// ```
/// use phase_driver::core::sync::{RetrievalPolicy, SyncChannel};
///
/// let channel = SyncChannel::new(RetrievalPolicy::Fifo);
/// channel.send(1);
/// channel.send(2);
/// assert_eq!(channel.receive(), Ok(1));
/// ```
pub struct SyncChannel<T> {
    inner: Mutex<Inner<T>>,
    available: Condvar,
    policy: RetrievalPolicy,
    waiting: AtomicUsize,
}

impl<T> SyncChannel<T> {
    /// Create an empty channel with the given retrieval policy
    pub fn new(policy: RetrievalPolicy) -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
            policy,
            waiting: AtomicUsize::new(0),
        }
    }

    /// Append a value and wake one blocked receiver
    ///
    /// Never blocks on receivers. Values sent after `close()` are still
    /// queued and can be drained.
    pub fn send(&self, value: T) {
        {
            let mut inner = self.inner.lock();
            inner.items.push_back(value);
        }
        self.available.notify_one();
    }

    /// Block until a value is available and take it
    ///
    /// Returns `ChannelError::Closed` once the channel is closed and drained.
    pub fn receive(&self) -> ChannelResult<T> {
        self.receive_inner(None)
    }

    /// Like `receive`, giving up with `ChannelError::Timeout` after `timeout`
    ///
    /// A timeout too large to form a deadline behaves like `receive`.
    pub fn receive_timeout(&self, timeout: Duration) -> ChannelResult<T> {
        self.receive_inner(Instant::now().checked_add(timeout))
    }

    /// Take a value without blocking
    pub fn try_receive(&self) -> ChannelResult<T> {
        let mut inner = self.inner.lock();
        match self.take(&mut inner) {
            Some(value) => Ok(value),
            None if inner.closed => Err(ChannelError::Closed),
            None => Err(ChannelError::Empty),
        }
    }

    fn receive_inner(&self, deadline: Option<Instant>) -> ChannelResult<T> {
        let mut inner = self.inner.lock();

        loop {
            if let Some(value) = self.take(&mut inner) {
                return Ok(value);
            }
            if inner.closed {
                return Err(ChannelError::Closed);
            }

            self.waiting.fetch_add(1, Ordering::Relaxed);
            let timed_out = match deadline {
                Some(deadline) => self.available.wait_until(&mut inner, deadline).timed_out(),
                None => {
                    self.available.wait(&mut inner);
                    false
                }
            };
            self.waiting.fetch_sub(1, Ordering::Relaxed);

            // A value may have arrived together with the deadline
            if timed_out {
                return match self.take(&mut inner) {
                    Some(value) => Ok(value),
                    None if inner.closed => Err(ChannelError::Closed),
                    None => Err(ChannelError::Timeout),
                };
            }
        }
    }

    #[inline]
    fn take(&self, inner: &mut Inner<T>) -> Option<T> {
        match self.policy {
            RetrievalPolicy::Lifo => inner.items.pop_back(),
            RetrievalPolicy::Fifo => inner.items.pop_front(),
        }
    }

    /// Close the channel and release every blocked receiver
    pub fn close(&self) {
        self.inner.lock().closed = true;
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Number of pending values
    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().items.is_empty()
    }

    pub fn policy(&self) -> RetrievalPolicy {
        self.policy
    }

    /// Approximate count of receivers parked on the condvar (for diagnostics)
    pub fn waiting_receivers(&self) -> usize {
        self.waiting.load(Ordering::Relaxed)
    }
}

impl<T> Default for SyncChannel<T> {
    fn default() -> Self {
        Self::new(RetrievalPolicy::default())
    }
}

impl<T> std::fmt::Debug for SyncChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("SyncChannel")
            .field("policy", &self.policy)
            .field("pending", &inner.items.len())
            .field("closed", &inner.closed)
            .finish()
    }
}
