/*!
 * Monitoring
 * Structured logging setup and wait tracing
 */

mod tracer;

pub use tracer::{init_tracing, WaitSpan};
