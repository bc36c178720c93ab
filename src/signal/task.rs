/*!
 * Toggle Task - Autonomous Phase Driver
 *
 * Background thread that sleeps for an interval from its `IntervalSource`,
 * then toggles and publishes the phase, until the controller is stopped.
 *
 * # Shutdown
 *
 * The interval sleep is a timed wait on the controller's watch cell, so
 * setting the stopped flag wakes the task immediately:
 *
 * 1. `PhaseController::stop()` sets the flag and calls `join()` here,
 *    blocking until the thread has exited.
 * 2. If the handle is dropped without `join()`, the thread is detached with
 *    a warning. It still exits at its next wake once the flag is set.
 *
 * However the loop ends, including a panic in the interval source, the
 * stopped flag is set on the way out so no waiter is left blocked.
 */

use super::controller::Shared;
use super::interval::IntervalSource;
use crate::core::errors::{PhaseError, PhaseResult};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Handle to the toggle thread
pub(crate) struct ToggleTask {
    handle: Option<JoinHandle<()>>,
}

impl ToggleTask {
    /// Spawn the toggle thread
    ///
    /// Thread creation failure is surfaced as `PhaseError::SpawnFailed`.
    pub(crate) fn spawn(
        name: &str,
        shared: Arc<Shared>,
        source: Box<dyn IntervalSource>,
    ) -> PhaseResult<Self> {
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run_toggle_loop(shared, source))
            .map_err(|e| PhaseError::SpawnFailed(e.to_string()))?;

        info!(thread = name, "Toggle task spawned");

        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Whether the thread has exited
    pub(crate) fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Block until the thread exits
    ///
    /// The caller must have requested a stop first, otherwise this blocks
    /// for the lifetime of the task.
    pub(crate) fn join(mut self) -> PhaseResult<()> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| {
                warn!("Toggle task panicked");
                PhaseError::TaskPanicked
            }),
            None => Ok(()),
        }
    }
}

impl Drop for ToggleTask {
    fn drop(&mut self) {
        if self.handle.take().is_some() {
            warn!("ToggleTask dropped without join() - detaching thread");
        }
    }
}

/// Marks the controller stopped when the toggle loop exits or unwinds
struct StopOnExit(Arc<Shared>);

impl Drop for StopOnExit {
    fn drop(&mut self) {
        if self.0.request_stop() {
            if thread::panicking() {
                warn!("Toggle task panicked - releasing waiters");
            } else {
                warn!("Toggle task exited without stop() - releasing waiters");
            }
        }
    }
}

fn run_toggle_loop(shared: Arc<Shared>, mut source: Box<dyn IntervalSource>) {
    let _exit = StopOnExit(shared.clone());
    info!(phase = %shared.current_phase(), "Toggle loop started");

    loop {
        let interval = source.next_interval();

        // Returns early only when stopped
        if shared.sleep_unless_stopped(interval) {
            break;
        }

        match shared.advance() {
            Some(phase) => debug!(phase = %phase, interval_ms = interval.as_millis() as u64, "Phase toggled"),
            None => break,
        }
    }

    info!("Toggle loop exiting");
}
