/*!
 * Phase Controller
 *
 * Owns the current phase, drives it from a background toggle task, and lets
 * any number of threads block until a given phase is published.
 *
 * # State
 *
 * The phase, the transition counters and the stopped flag live together in
 * one `Watch`. A toggle updates the phase, bumps the counters and (in queue
 * delivery) sends on the channel inside a single critical section, so
 * `current_phase()` and published transitions never disagree.
 *
 * # Delivery
 *
 * - `Delivery::Broadcast`: a waiter records how many times its target phase
 *   has been entered and returns once that count grows. Every waiter sees
 *   every transition, and transitions between two wakeups are not lost.
 * - `Delivery::Queue`: waiters drain a shared `SyncChannel<Phase>`, dropping
 *   non-matching values. With several waiters a transition is consumed by
 *   whichever thread receives it.
 *
 * Lock order is watch, then channel.
 */

use super::config::{ControllerConfig, Delivery};
use super::interval::{IntervalSource, UniformInterval};
use super::phase::Phase;
use super::task::ToggleTask;
use crate::core::errors::{PhaseError, PhaseResult};
use crate::core::sync::{SyncChannel, Watch};
use crate::monitoring::WaitSpan;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, trace, warn};

/// State guarded by the watch
#[derive(Debug, Default)]
struct PhaseState {
    phase: Phase,
    transitions: u64,
    /// Times each phase has been entered, indexed by `Phase::index`
    entered: [u64; 2],
    stopped: bool,
}

/// State shared between the controller and its toggle task
pub(crate) struct Shared {
    state: Watch<PhaseState>,
    queue: Option<Arc<SyncChannel<Phase>>>,
    waiters: AtomicUsize,
}

impl Shared {
    fn new(delivery: Delivery) -> Self {
        let queue = match delivery {
            Delivery::Broadcast => None,
            Delivery::Queue(policy) => Some(Arc::new(SyncChannel::new(policy))),
        };
        Self {
            state: Watch::new(PhaseState::default()),
            queue,
            waiters: AtomicUsize::new(0),
        }
    }

    pub(crate) fn current_phase(&self) -> Phase {
        self.state.read(|s| s.phase)
    }

    /// Sleep for `interval`, returning `true` early if stopped
    pub(crate) fn sleep_unless_stopped(&self, interval: Duration) -> bool {
        self.state
            .wait_until(Some(interval), |s| s.stopped.then_some(()))
            .is_ok()
    }

    /// Toggle and publish the phase; `None` once stopped
    pub(crate) fn advance(&self) -> Option<Phase> {
        self.state.modify(|s| {
            if s.stopped {
                return None;
            }
            s.phase = s.phase.toggle();
            s.transitions += 1;
            s.entered[s.phase.index()] += 1;
            if let Some(queue) = &self.queue {
                queue.send(s.phase);
            }
            Some(s.phase)
        })
    }

    /// Set the stopped flag and release every waiter; `true` on first call
    pub(crate) fn request_stop(&self) -> bool {
        let first = self.state.modify(|s| !std::mem::replace(&mut s.stopped, true));
        if let Some(queue) = &self.queue {
            queue.close();
        }
        first
    }

    fn is_stopped(&self) -> bool {
        self.state.read(|s| s.stopped)
    }
}

/// Registers a blocked waiter for the lifetime of the guard
struct WaiterGuard<'a>(&'a AtomicUsize);

impl<'a> WaiterGuard<'a> {
    fn new(count: &'a AtomicUsize) -> Self {
        count.fetch_add(1, Ordering::Relaxed);
        Self(count)
    }
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Snapshot of controller activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseStats {
    pub phase: Phase,
    /// Toggles since construction
    pub transitions: u64,
    /// Times the phase became GREEN
    pub green_entries: u64,
    /// Threads currently blocked in `wait_for_phase`
    pub waiters: usize,
    /// Undelivered transitions (queue delivery only)
    pub pending: usize,
    pub running: bool,
}

/// Two-phase controller with a background toggle task
///
/// Share across threads with `Arc<PhaseController>`.
///
/// # Examples
///
/// ```
/// use phase_driver::{FixedInterval, Phase, PhaseController, ControllerConfig};
/// use std::time::Duration;
///
/// let controller = PhaseController::with_interval_source(
///     ControllerConfig::default(),
///     FixedInterval::new(Duration::from_millis(5)),
/// )
/// .unwrap();
///
/// assert_eq!(controller.current_phase(), Phase::Red);
/// controller.start().unwrap();
/// controller
///     .wait_for_phase_timeout(Phase::Green, Duration::from_secs(2))
///     .unwrap();
/// controller.stop().unwrap();
/// ```
pub struct PhaseController {
    shared: Arc<Shared>,
    config: ControllerConfig,
    source: Mutex<Option<Box<dyn IntervalSource>>>,
    task: Mutex<Option<ToggleTask>>,
}

impl PhaseController {
    /// Controller with default configuration and random 4..=6s intervals
    pub fn new() -> Self {
        let config = ControllerConfig::default();
        let source = UniformInterval::new(config.min_interval, config.max_interval);
        Self::build(config, Box::new(source))
    }

    /// Controller with random intervals drawn from the configured bounds
    pub fn with_config(config: ControllerConfig) -> PhaseResult<Self> {
        config.validate()?;
        let source = UniformInterval::new(config.min_interval, config.max_interval);
        Ok(Self::build(config, Box::new(source)))
    }

    /// Controller with an injected interval source
    ///
    /// The configured interval bounds are ignored in favour of `source`.
    pub fn with_interval_source(
        config: ControllerConfig,
        source: impl IntervalSource,
    ) -> PhaseResult<Self> {
        config.validate()?;
        Ok(Self::build(config, Box::new(source)))
    }

    fn build(config: ControllerConfig, source: Box<dyn IntervalSource>) -> Self {
        Self {
            shared: Arc::new(Shared::new(config.delivery)),
            config,
            source: Mutex::new(Some(source)),
            task: Mutex::new(None),
        }
    }

    /// Spawn the toggle task
    ///
    /// May be called once. Thread creation failure is fatal for the
    /// controller and returned as `PhaseError::SpawnFailed`.
    pub fn start(&self) -> PhaseResult<()> {
        let mut task = self.task.lock();
        if self.shared.is_stopped() {
            return Err(PhaseError::Stopped);
        }
        let source = self.source.lock().take().ok_or(PhaseError::AlreadyStarted)?;

        *task = Some(ToggleTask::spawn(
            self.config.thread_name,
            self.shared.clone(),
            source,
        )?);
        Ok(())
    }

    /// Stop the toggle task, release all waiters and join the thread
    ///
    /// Idempotent. Blocked and future waiters get `PhaseError::Stopped`
    /// unless their phase was already published.
    pub fn stop(&self) -> PhaseResult<()> {
        if self.shared.request_stop() {
            info!(phase = %self.current_phase(), "Phase controller stopping");
        }

        let task = self.task.lock().take();
        match task {
            Some(task) => {
                task.join()?;
                info!("Toggle task shutdown complete");
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Block until `target` is published
    pub fn wait_for_phase(&self, target: Phase) -> PhaseResult<()> {
        self.wait_inner(target, None)
    }

    /// Block until `target` is published or `timeout` elapses
    pub fn wait_for_phase_timeout(&self, target: Phase, timeout: Duration) -> PhaseResult<()> {
        self.wait_inner(target, Some(timeout))
    }

    fn wait_inner(&self, target: Phase, timeout: Option<Duration>) -> PhaseResult<()> {
        let _waiter = WaiterGuard::new(&self.shared.waiters);
        let span = WaitSpan::new(target);

        let result = match &self.shared.queue {
            None => self.wait_broadcast(target, timeout),
            Some(queue) => Self::wait_queued(queue, target, timeout),
        };

        span.record_outcome(match &result {
            Ok(()) => "published",
            Err(PhaseError::Timeout) => "timeout",
            Err(_) => "stopped",
        });
        result
    }

    fn wait_broadcast(&self, target: Phase, timeout: Option<Duration>) -> PhaseResult<()> {
        let idx = target.index();
        let mut baseline = None;

        self.shared.state.wait_until(timeout, |s| {
            let since = *baseline.get_or_insert(s.entered[idx]);
            if s.entered[idx] > since {
                Some(Ok(()))
            } else if s.stopped {
                Some(Err(PhaseError::Stopped))
            } else {
                None
            }
        })?
    }

    fn wait_queued(
        queue: &SyncChannel<Phase>,
        target: Phase,
        timeout: Option<Duration>,
    ) -> PhaseResult<()> {
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));

        loop {
            let phase = match deadline {
                Some(deadline) => {
                    queue.receive_timeout(deadline.saturating_duration_since(Instant::now()))?
                }
                None => queue.receive()?,
            };
            if phase == target {
                return Ok(());
            }
            trace!(phase = %phase, wanted = %target, "Discarding non-matching phase");
        }
    }

    /// Synchronized snapshot of the current phase
    pub fn current_phase(&self) -> Phase {
        self.shared.current_phase()
    }

    /// Whether the toggle task is alive
    pub fn is_running(&self) -> bool {
        self.task.lock().as_ref().is_some_and(|t| !t.is_finished()) && !self.shared.is_stopped()
    }

    pub fn stats(&self) -> PhaseStats {
        let (phase, transitions, green_entries) = self
            .shared
            .state
            .read(|s| (s.phase, s.transitions, s.entered[Phase::Green.index()]));

        PhaseStats {
            phase,
            transitions,
            green_entries,
            waiters: self.shared.waiters.load(Ordering::Relaxed),
            pending: self.shared.queue.as_ref().map_or(0, |q| q.len()),
            running: self.is_running(),
        }
    }

    /// The transition channel, in queue delivery only
    pub fn transitions(&self) -> Option<Arc<SyncChannel<Phase>>> {
        self.shared.queue.clone()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }
}

impl Default for PhaseController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PhaseController {
    fn drop(&mut self) {
        if self.task.get_mut().is_none() {
            return;
        }

        warn!("PhaseController dropped while running - stopping toggle task. Call stop() for explicit shutdown.");
        if let Err(e) = self.stop() {
            warn!(error = %e, "Toggle task shutdown error");
        }
    }
}
