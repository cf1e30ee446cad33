//! # SparkTimer Visualizer
//!
//! Layer file interpretation, print-time estimation, and layer bitmap
//! decoding for SparkTimer.

pub mod gcode;
pub mod utils;
pub mod visualizer;

pub use gcode::{
    classify, dwell_seconds, estimate_move_seconds, header_value, Diagnostic, DiagnosticKind,
    HeaderField, LineInterpreter, LineKind, ParseHandle, ParseResult, ParseWorker, TimeEstimator,
};

pub use utils::LayerFileReader;

pub use visualizer::{
    decode_buffer, decode_layer, reverse_bits, row_stride, DecodedLayer, LayerCache, LayerPreview,
    BIT_REVERSE,
};
