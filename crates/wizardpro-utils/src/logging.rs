//! Logging and observability helpers for wizardpro
//!
//! Structured logging goes through `tracing`. Every phase invocation runs
//! inside a [`phase_span`] carrying `run_id` and `phase`, so events emitted
//! by the executor and the HTTP clients inherit those fields.

use tracing::{Level, error, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise the compact format logs wizardpro
/// crates at `info`; verbose mode raises them to `debug`, prints targets,
/// and emits an event when each span closes (which gives per-phase timing).
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("wizardpro=debug,wizardpro_engine=debug,wizardpro_llm=debug,wizardpro_phases=debug,info")
            } else {
                EnvFilter::try_new("info")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Create the span that wraps one phase invocation.
pub fn phase_span(run_id: &str, phase: &str) -> tracing::Span {
    span!(
        Level::INFO,
        "phase_execution",
        run_id = %run_id,
        phase = %phase,
    )
}

pub fn log_phase_start(run_id: &str, phase: &str, index: usize) {
    info!(
        run_id = %run_id,
        phase = %phase,
        index,
        "Starting phase"
    );
}

/// Log the status a phase returned together with its wall-clock duration.
pub fn log_phase_complete(run_id: &str, phase: &str, status: &str, duration_ms: u128) {
    info!(
        run_id = %run_id,
        phase = %phase,
        status = %status,
        duration_ms = %duration_ms,
        "Phase returned"
    );
}

pub fn log_phase_error(run_id: &str, phase: &str, error: &str, duration_ms: u128) {
    error!(
        run_id = %run_id,
        phase = %phase,
        duration_ms = %duration_ms,
        error = %error,
        "Phase failed"
    );
}
