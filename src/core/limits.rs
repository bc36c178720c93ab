/*!
 * Limits and Constants
 *
 * Centralized location for the timing defaults of the phase driver.
 */

use std::time::Duration;

// =============================================================================
// TOGGLE INTERVALS
// =============================================================================

/// Shortest default dwell time of a phase (4s)
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(4);

/// Longest default dwell time of a phase (6s)
/// Waiters started alongside the driver see GREEN within this bound
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(6);

/// Name given to the background toggle thread
pub const TOGGLE_THREAD_NAME: &str = "phase-toggle";

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Overrides the minimum interval, in whole seconds
pub const ENV_MIN_INTERVAL_SECS: &str = "PHASE_MIN_INTERVAL_SECS";

/// Overrides the maximum interval, in whole seconds
pub const ENV_MAX_INTERVAL_SECS: &str = "PHASE_MAX_INTERVAL_SECS";

/// Selects delivery mode: `broadcast`, `lifo` or `fifo`
pub const ENV_DELIVERY: &str = "PHASE_DELIVERY";

/// Enables JSON log output when set to `1` or `true`
pub const ENV_TRACE_JSON: &str = "PHASE_TRACE_JSON";

/// Number of GREEN phases the demo binary waits for
pub const ENV_CYCLES: &str = "PHASE_CYCLES";

/// Demo binary default cycle count
pub const DEFAULT_CYCLES: u32 = 3;
