//! PNG export of decoded layers

use std::path::{Path, PathBuf};

use serde::Serialize;
use sparktimer_core::Error;
use sparktimer_visualizer::{LayerPreview, ParseResult};
use tracing::{info, warn};

/// File name for 1-based layer `layer_number`
pub fn layer_file_name(layer_number: usize) -> String {
    format!("layer_{:04}.png", layer_number)
}

/// Layer numbers to export, ascending and without repeats
///
/// `all_layers` selects every captured layer. Otherwise `requested` is used,
/// falling back to `fallback` when nothing was requested.
pub fn requested_layers(
    all_layers: bool,
    captured: usize,
    requested: &[usize],
    fallback: Option<usize>,
) -> Vec<usize> {
    if all_layers {
        return (1..=captured).collect();
    }
    let mut numbers = if requested.is_empty() {
        fallback.into_iter().collect()
    } else {
        requested.to_vec()
    };
    numbers.sort_unstable();
    numbers.dedup();
    numbers
}

/// Outcome of exporting one layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerExport {
    /// 1-based layer number
    pub layer: usize,
    /// Written file, when the export succeeded
    pub path: Option<PathBuf>,
    /// Failure reason, when it did not
    pub error: Option<String>,
}

impl LayerExport {
    pub fn succeeded(&self) -> bool {
        self.path.is_some()
    }
}

/// Decode and save each 1-based layer in `layer_numbers` into `dir`
///
/// Each layer fails on its own; only a failure to create `dir` aborts.
pub fn export_layers(
    preview: &mut LayerPreview,
    result: &ParseResult,
    layer_numbers: &[usize],
    dir: &Path,
) -> Result<Vec<LayerExport>, Error> {
    std::fs::create_dir_all(dir)?;

    let exports = layer_numbers
        .iter()
        .map(|&layer| {
            let path = dir.join(layer_file_name(layer));
            match save_one(preview, result, layer, &path) {
                Ok(()) => LayerExport {
                    layer,
                    path: Some(path),
                    error: None,
                },
                Err(e) => {
                    warn!("Layer {} not exported: {}", layer, e);
                    LayerExport {
                        layer,
                        path: None,
                        error: Some(e.to_string()),
                    }
                }
            }
        })
        .collect::<Vec<_>>();

    let written = exports.iter().filter(|e| e.succeeded()).count();
    info!("Exported {} of {} layers to {}", written, exports.len(), dir.display());
    Ok(exports)
}

fn save_one(
    preview: &mut LayerPreview,
    result: &ParseResult,
    layer: usize,
    path: &Path,
) -> Result<(), Error> {
    preview.show_layer(result, layer)?.save_png(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_file_name() {
        assert_eq!(layer_file_name(1), "layer_0001.png");
        assert_eq!(layer_file_name(250), "layer_0250.png");
        assert_eq!(layer_file_name(12345), "layer_12345.png");
    }

    #[test]
    fn test_requested_layers_sorted_without_repeats() {
        assert_eq!(requested_layers(false, 5, &[3, 1, 3], None), vec![1, 3]);
        assert_eq!(requested_layers(false, 5, &[2, 2, 2], Some(1)), vec![2]);
    }

    #[test]
    fn test_requested_layers_fallback_and_all() {
        assert_eq!(requested_layers(false, 5, &[], Some(4)), vec![4]);
        assert!(requested_layers(false, 5, &[], None).is_empty());
        assert_eq!(requested_layers(true, 3, &[9], None), vec![1, 2, 3]);
    }
}
