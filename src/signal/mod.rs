/*!
 * Phase Signal
 *
 * Two-phase state machine driven by a background toggle task:
 * - `Phase`: RED or GREEN
 * - `IntervalSource`: injectable dwell-time provider
 * - `PhaseController`: owns the phase, publishes transitions, blocks waiters
 */

mod config;
mod controller;
mod interval;
mod phase;
mod task;

pub use config::{ControllerConfig, Delivery};
pub use controller::{PhaseController, PhaseStats};
pub use interval::{FixedInterval, IntervalSource, UniformInterval};
pub use phase::Phase;
