//! Layer file interpretation
//!
//! This module provides:
//! - Line classification and header extraction
//! - Print-time estimation for dwell and linear move commands
//! - The single-pass line interpreter
//! - The background parse worker

pub mod command;
pub mod estimator;
pub mod interpreter;
pub mod worker;

pub use command::{classify, header_value, HeaderField, LineKind, BLOCK_CLOSE, BLOCK_OPEN};
pub use estimator::{dwell_seconds, estimate_move_seconds, TimeEstimator};
pub use interpreter::{Diagnostic, DiagnosticKind, LineInterpreter, ParseResult};
pub use worker::{ParseHandle, ParseWorker};
