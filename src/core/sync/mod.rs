/*!
 * Synchronization Primitives
 *
 * Blocking handoff and wait/notify primitives built on parking_lot:
 * - `SyncChannel`: unbounded queue, each value consumed by exactly one receiver
 * - `Watch`: shared state, every mutation observed by every waiter
 */

mod channel;
mod config;
mod watch;

pub use channel::{ChannelError, ChannelResult, SyncChannel};
pub use config::RetrievalPolicy;
pub use watch::{WaitError, WaitResult, Watch};
