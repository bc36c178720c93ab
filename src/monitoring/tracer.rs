/*!
 * Structured Tracing
 * Subscriber setup and wait spans using the tracing crate
 *
 * Features:
 * - JSON-formatted logs for structured parsing
 * - Per-wait spans recording how long a waiter was blocked
 */

use crate::core::limits::ENV_TRACE_JSON;
use crate::signal::Phase;
use std::time::Instant;
use tracing::{debug, info, span, Level};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - PHASE_TRACE_JSON: Enable JSON output (default: false)
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(ENV_TRACE_JSON)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .init();
        info!("Structured tracing initialized with JSON output");
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .init();
        info!("Structured tracing initialized");
    }
}

/// Span covering one blocking wait for a phase
pub struct WaitSpan {
    span: tracing::Span,
    start: Instant,
    target: Phase,
}

impl WaitSpan {
    pub fn new(target: Phase) -> Self {
        let span = span!(
            Level::DEBUG,
            "wait_for_phase",
            phase = %target,
            waited_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            target,
        }
    }

    /// Record how the wait ended
    pub fn record_outcome(&self, outcome: &str) {
        self.span.record("outcome", outcome);
    }
}

impl Drop for WaitSpan {
    fn drop(&mut self) {
        let waited = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("waited_ms", waited.as_millis() as u64);
        debug!(
            target_phase = %self.target,
            waited_ms = waited.as_millis() as u64,
            "wait finished"
        );
    }
}
