/*!
 * Interval Sources
 *
 * Supplies the dwell time before each toggle. The toggle task owns its
 * source, so implementations only need to be `Send`.
 */

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Provider of toggle intervals
pub trait IntervalSource: Send + 'static {
    /// Duration to wait before the next toggle
    fn next_interval(&mut self) -> Duration;
}

impl<F> IntervalSource for F
where
    F: FnMut() -> Duration + Send + 'static,
{
    fn next_interval(&mut self) -> Duration {
        self()
    }
}

/// Uniformly random interval within `[min, max]`
///
/// Bounds that are both whole seconds are sampled in whole seconds (so the
/// default 4..=6s yields 4, 5 or 6 seconds); otherwise in nanoseconds.
#[derive(Debug)]
pub struct UniformInterval {
    rng: StdRng,
    min: Duration,
    max: Duration,
}

impl UniformInterval {
    /// Create a source seeded from OS entropy
    pub fn new(min: Duration, max: Duration) -> Self {
        Self::with_rng(StdRng::from_entropy(), min, max)
    }

    /// Create a reproducible source
    pub fn seeded(seed: u64, min: Duration, max: Duration) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), min, max)
    }

    fn with_rng(rng: StdRng, min: Duration, max: Duration) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self { rng, min, max }
    }
}

impl IntervalSource for UniformInterval {
    fn next_interval(&mut self) -> Duration {
        let whole_seconds = self.min.subsec_nanos() == 0 && self.max.subsec_nanos() == 0;
        if whole_seconds {
            Duration::from_secs(self.rng.gen_range(self.min.as_secs()..=self.max.as_secs()))
        } else {
            let nanos = self.rng.gen_range(self.min.as_nanos()..=self.max.as_nanos());
            Duration::new(
                (nanos / NANOS_PER_SEC) as u64,
                (nanos % NANOS_PER_SEC) as u32,
            )
        }
    }
}

/// Constant interval, mainly for deterministic tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedInterval(pub Duration);

impl FixedInterval {
    pub const fn new(interval: Duration) -> Self {
        Self(interval)
    }

    /// Toggle as fast as the task can run
    pub const fn immediate() -> Self {
        Self(Duration::ZERO)
    }
}

impl IntervalSource for FixedInterval {
    fn next_interval(&mut self) -> Duration {
        self.0
    }
}
