//! Human and JSON summaries of a parse result

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use sparktimer_core::{format_print_time, EstimationPolicy};
use sparktimer_visualizer::{Diagnostic, ParseResult};

use crate::export::LayerExport;

/// Everything the front end reports about one file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrintSummary {
    pub file: PathBuf,
    pub policy: EstimationPolicy,
    /// Header width, shown as vertical pixels
    pub vertical_pixels: i32,
    /// Header height, shown as horizontal pixels
    pub horizontal_pixels: i32,
    pub layer_count: i32,
    pub captured_layers: usize,
    pub seconds: f64,
    pub print_time: String,
    pub has_errors: bool,
    pub cancelled: bool,
    pub lines_read: usize,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exports: Vec<LayerExport>,
}

impl PrintSummary {
    pub fn new(file: impl Into<PathBuf>, policy: EstimationPolicy, result: &ParseResult) -> Self {
        Self {
            file: file.into(),
            policy,
            vertical_pixels: result.vertical_pixels(),
            horizontal_pixels: result.horizontal_pixels(),
            layer_count: result.layer_count,
            captured_layers: result.layers.len(),
            seconds: result.accumulated_seconds,
            print_time: format_print_time(result.accumulated_seconds),
            has_errors: result.has_errors,
            cancelled: result.cancelled,
            lines_read: result.lines_read,
            diagnostics: result.diagnostics.clone(),
            exports: Vec::new(),
        }
    }

    pub fn with_exports(mut self, exports: Vec<LayerExport>) -> Self {
        self.exports = exports;
        self
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for PrintSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "File:              {}", self.file.display())?;
        writeln!(f, "Vertical pixels:   {}", self.vertical_pixels)?;
        writeln!(f, "Horizontal pixels: {}", self.horizontal_pixels)?;
        writeln!(f, "Layers:            {}", self.layer_count)?;
        writeln!(f, "Print time:        {} ({})", self.print_time, self.policy)?;
        write!(f, "Errors:            {}", if self.has_errors { "yes" } else { "no" })?;

        for diagnostic in &self.diagnostics {
            write!(f, "\n  {}", diagnostic)?;
        }
        if self.cancelled {
            write!(f, "\nCancelled after {} lines", self.lines_read)?;
        }
        for export in &self.exports {
            match (&export.path, &export.error) {
                (Some(path), _) => write!(f, "\nLayer {} -> {}", export.layer, path.display())?,
                (None, Some(error)) => write!(f, "\nLayer {} failed: {}", export.layer, error)?,
                (None, None) => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParseResult {
        ParseResult {
            width: 1440,
            height: 2560,
            layer_count: 3,
            accumulated_seconds: 3725.9,
            layers: vec![vec![0], vec![0]],
            ..ParseResult::default()
        }
    }

    #[test]
    fn test_labels_are_inverted() {
        let summary = PrintSummary::new("part.gcode", EstimationPolicy::MoveTime, &sample());
        let text = summary.to_string();
        assert!(text.contains("Vertical pixels:   1440"));
        assert!(text.contains("Horizontal pixels: 2560"));
        assert!(text.contains("Print time:        01h:02m:05s (move-time)"));
        assert!(text.contains("Errors:            no"));
    }

    #[test]
    fn test_json_summary() {
        let summary = PrintSummary::new("part.gcode", EstimationPolicy::LayerOverhead, &sample());
        let value: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
        assert_eq!(value["policy"], "layer_overhead");
        assert_eq!(value["captured_layers"], 2);
        assert_eq!(value["print_time"], "01h:02m:05s");
        assert!(value.get("exports").is_none());
    }
}
