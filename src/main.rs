//! # SparkTimer CLI
//!
//! Estimates the print time of a resin printer layer file and exports
//! decoded layers as PNG images.
//!
//! ## Usage
//!
//! ```bash
//! # Print the summary
//! sparktimer part.gcode
//!
//! # Use the fixed per-layer overhead estimate
//! sparktimer --policy layer-overhead part.gcode
//!
//! # Export layers 1 and 40 into ./renders
//! sparktimer part.gcode --layer 1 --layer 40 --export-dir renders
//!
//! # Machine readable summary
//! sparktimer part.gcode --json
//! ```

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sparktimer::{
    estimator_from_config, export_layers, init_logging, parse_file, requested_layers,
    Config, EstimationPolicy, EventBus, LayerCache, LayerPreview, ParseWorker, PrintSummary, VERSION,
};
use sparktimer_core::{AppEvent, EventFilter, FileEvent};

/// SparkTimer - print time estimator and layer previewer
#[derive(Parser, Debug)]
#[command(name = "sparktimer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Layer file to analyse
    file: PathBuf,

    /// Configuration file (TOML or JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Estimation policy, overriding the configuration
    #[arg(long, value_name = "POLICY")]
    policy: Option<EstimationPolicy>,

    /// Export this 1-based layer as PNG (repeatable)
    #[arg(long = "layer", value_name = "N")]
    layers: Vec<usize>,

    /// Export every captured layer
    #[arg(long)]
    all_layers: bool,

    /// Directory for exported PNGs, overriding the configuration
    #[arg(long, value_name = "DIR")]
    export_dir: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    init_logging()?;
    let cli = Cli::parse();
    tracing::info!("SparkTimer {} ({})", VERSION, sparktimer::BUILD_DATE);

    let mut config = Config::load_or_default(cli.config.as_deref())
        .with_context(|| "Failed to load configuration")?;
    if let Some(policy) = cli.policy {
        config.estimation.policy = policy;
    }

    let bus = Arc::new(EventBus::new());
    let show_progress = !cli.json;
    bus.subscribe(EventFilter::All, move |event| match event {
        AppEvent::File(FileEvent::Progress { percent }) if show_progress => {
            eprint!("\rReading... {:>3}%", percent);
            if percent == 100 {
                eprintln!();
            }
            let _ = std::io::stderr().flush();
        }
        other => tracing::debug!("{}", other.description()),
    });

    let worker =
        ParseWorker::new(estimator_from_config(&config)).with_event_bus(Arc::clone(&bus));
    let result = parse_file(&worker, &cli.file)?;

    if result.open_failed() {
        let reason = result
            .diagnostics
            .first()
            .map(|d| d.text.clone())
            .unwrap_or_default();
        eprintln!("Error: cannot open {}: {}", cli.file.display(), reason);
        return Ok(ExitCode::FAILURE);
    }

    // An export directory alone exports the configured initial layer.
    let fallback = cli
        .export_dir
        .as_ref()
        .map(|_| config.preview.initial_layer);
    let layer_numbers =
        requested_layers(cli.all_layers, result.captured_layers(), &cli.layers, fallback);

    let mut summary = PrintSummary::new(&cli.file, config.estimation.policy, &result);

    if !layer_numbers.is_empty() {
        let mut preview = LayerPreview::new().with_event_bus(Arc::clone(&bus));
        if config.preview.cache_layers {
            preview = preview.with_cache(LayerCache::new());
        }
        let dir = cli
            .export_dir
            .clone()
            .unwrap_or_else(|| config.preview.export_dir.clone());
        let exports = export_layers(&mut preview, &result, &layer_numbers, &dir)
            .with_context(|| format!("Failed to export layers to {}", dir.display()))?;
        summary = summary.with_exports(exports);
    }

    if cli.json {
        println!("{}", summary.to_json()?);
    } else {
        println!("{}", summary);
    }

    Ok(ExitCode::SUCCESS)
}
