/*!
 * Error Types
 * Centralized error handling with thiserror and miette
 */

use miette::Diagnostic;
use thiserror::Error;

pub use crate::core::sync::{ChannelError, WaitError};

/// Result type for controller operations
pub type PhaseResult<T> = Result<T, PhaseError>;

/// Phase controller errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum PhaseError {
    #[error("Failed to spawn toggle task: {0}")]
    #[diagnostic(
        code(phase::spawn_failed),
        help("The OS refused to create a thread. Check process thread limits.")
    )]
    SpawnFailed(String),

    #[error("Toggle task already started")]
    #[diagnostic(
        code(phase::already_started),
        help("A controller drives exactly one toggle task. Create a new controller instead.")
    )]
    AlreadyStarted,

    #[error("Controller stopped")]
    #[diagnostic(
        code(phase::stopped),
        help("The toggle task has exited; no further phases will be published.")
    )]
    Stopped,

    #[error("Timed out waiting for phase")]
    #[diagnostic(code(phase::timeout))]
    Timeout,

    #[error("Toggle task panicked")]
    #[diagnostic(code(phase::task_panicked), help("See the task's panic output in the logs."))]
    TaskPanicked,

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(phase::invalid_config))]
    InvalidConfig(String),
}

impl From<WaitError> for PhaseError {
    fn from(err: WaitError) -> Self {
        match err {
            WaitError::Timeout => PhaseError::Timeout,
        }
    }
}

impl From<ChannelError> for PhaseError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::Timeout => PhaseError::Timeout,
            ChannelError::Closed | ChannelError::Empty => PhaseError::Stopped,
        }
    }
}
