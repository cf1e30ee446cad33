//! # SparkTimer
//!
//! Print time estimator and layer previewer for resin printer layer files.
//!
//! ## Architecture
//!
//! SparkTimer is organized as a workspace with multiple crates:
//!
//! 1. **sparktimer-core** - Errors, events, shared types, time helpers
//! 2. **sparktimer-settings** - Configuration and its persistence
//! 3. **sparktimer-visualizer** - Line interpreter, estimator, worker, layer decoding
//! 4. **sparktimer** - Command-line front end that integrates all crates

pub mod export;
pub mod summary;

pub use sparktimer_visualizer::{gcode, visualizer};

pub use sparktimer_core::{
    format_print_time, DecodeError, EstimationPolicy, Error, EventBus, PrintDuration, Result,
    WorkerError,
};
pub use sparktimer_settings::Config;
pub use sparktimer_visualizer::{
    DecodedLayer, Diagnostic, DiagnosticKind, LayerCache, LayerPreview, ParseHandle, ParseResult,
    ParseWorker, TimeEstimator,
};

pub use export::{export_layers, layer_file_name, requested_layers, LayerExport};
pub use summary::PrintSummary;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Estimator configured from the `[estimation]` settings
pub fn estimator_from_config(config: &Config) -> TimeEstimator {
    TimeEstimator::new(config.estimation.policy)
        .with_layer_overhead(config.estimation.layer_overhead_secs)
}

/// Run one parse pass of `path` on `worker` and wait for its result
pub fn parse_file(
    worker: &ParseWorker,
    path: impl AsRef<std::path::Path>,
) -> Result<ParseResult> {
    Ok(worker.start(path)?.wait()?)
}

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Pretty formatted output on stderr, keeping stdout for results
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
