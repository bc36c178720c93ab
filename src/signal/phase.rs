/*!
 * Phase
 * The two observable states of the controller
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Controller phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Red,
    Green,
}

impl Phase {
    /// The phase that follows this one
    #[inline]
    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Phase::Red => Phase::Green,
            Phase::Green => Phase::Red,
        }
    }

    /// Dense index for per-phase counters
    #[inline]
    pub(crate) const fn index(self) -> usize {
        match self {
            Phase::Red => 0,
            Phase::Green => 1,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::Red => "red",
            Phase::Green => "green",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
