/*!
 * Controller Configuration
 *
 * Interval bounds, delivery mode and task naming for `PhaseController`
 */

use crate::core::errors::{PhaseError, PhaseResult};
use crate::core::limits::{
    DEFAULT_MAX_INTERVAL, DEFAULT_MIN_INTERVAL, ENV_DELIVERY, ENV_MAX_INTERVAL_SECS,
    ENV_MIN_INTERVAL_SECS, TOGGLE_THREAD_NAME,
};
use crate::core::sync::RetrievalPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How phase transitions reach waiters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// Every waiter observes every transition
    #[default]
    Broadcast,
    /// Transitions are queued on a shared channel and consumed by whichever
    /// waiter receives them first
    Queue(RetrievalPolicy),
}

impl Delivery {
    /// Parse `broadcast`, `lifo` or `fifo` (case-insensitive)
    pub fn parse(name: &str) -> Option<Self> {
        if name.trim().eq_ignore_ascii_case("broadcast") {
            return Some(Self::Broadcast);
        }
        RetrievalPolicy::parse(name).map(Self::Queue)
    }
}

/// Controller configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Shortest dwell time of a phase
    pub min_interval: Duration,
    /// Longest dwell time of a phase
    pub max_interval: Duration,
    pub delivery: Delivery,
    /// Name of the toggle thread
    pub thread_name: &'static str,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            min_interval: DEFAULT_MIN_INTERVAL,
            max_interval: DEFAULT_MAX_INTERVAL,
            delivery: Delivery::Broadcast,
            thread_name: TOGGLE_THREAD_NAME,
        }
    }
}

impl ControllerConfig {
    /// Zero-delay toggling
    pub const fn immediate() -> Self {
        Self {
            min_interval: Duration::ZERO,
            max_interval: Duration::ZERO,
            delivery: Delivery::Broadcast,
            thread_name: TOGGLE_THREAD_NAME,
        }
    }

    /// Same bounds, queue delivery with the given policy
    pub const fn queued(mut self, policy: RetrievalPolicy) -> Self {
        self.delivery = Delivery::Queue(policy);
        self
    }

    pub const fn with_intervals(mut self, min: Duration, max: Duration) -> Self {
        self.min_interval = min;
        self.max_interval = max;
        self
    }

    pub fn validate(&self) -> PhaseResult<()> {
        if self.min_interval > self.max_interval {
            return Err(PhaseError::InvalidConfig(format!(
                "min interval {:?} exceeds max interval {:?}",
                self.min_interval, self.max_interval
            )));
        }
        if self.thread_name.is_empty() {
            return Err(PhaseError::InvalidConfig("thread name is empty".into()));
        }
        Ok(())
    }

    /// Defaults overridden by `PHASE_MIN_INTERVAL_SECS`,
    /// `PHASE_MAX_INTERVAL_SECS` and `PHASE_DELIVERY`
    pub fn from_env() -> PhaseResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> PhaseResult<Self> {
        let mut config = Self::default();

        if let Some(secs) = lookup(ENV_MIN_INTERVAL_SECS) {
            config.min_interval = parse_secs(ENV_MIN_INTERVAL_SECS, &secs)?;
        }
        if let Some(secs) = lookup(ENV_MAX_INTERVAL_SECS) {
            config.max_interval = parse_secs(ENV_MAX_INTERVAL_SECS, &secs)?;
        }
        if let Some(name) = lookup(ENV_DELIVERY) {
            config.delivery = Delivery::parse(&name).ok_or_else(|| {
                PhaseError::InvalidConfig(format!("{}: unknown delivery '{}'", ENV_DELIVERY, name))
            })?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_secs(key: &str, value: &str) -> PhaseResult<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| PhaseError::InvalidConfig(format!("{}: {}", key, e)))
}
