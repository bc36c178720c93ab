/*!
 * Phase Driver Library
 * Blocking phase signalling between a background driver and waiting threads
 */

pub mod core;
pub mod monitoring;
pub mod signal;

// Re-exports
pub use crate::core::errors::{PhaseError, PhaseResult};
pub use crate::core::sync::{ChannelError, RetrievalPolicy, SyncChannel, Watch};
pub use monitoring::init_tracing;
pub use signal::{
    ControllerConfig, Delivery, FixedInterval, IntervalSource, Phase, PhaseController, PhaseStats,
    UniformInterval,
};
