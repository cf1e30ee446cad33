//! Line interpreter
//!
//! Streams a layer file once, classifies every line and folds the results
//! into a [`ParseResult`]. Line-level failures are recorded as
//! [`Diagnostic`]s and never abort the pass.

use std::io::{BufRead, Cursor};
use std::sync::atomic::Ordering;

use serde::{Deserialize, Serialize};
use sparktimer_core::{CancelFlag, PrintDuration};
use tracing::{debug, info, warn};

use super::command::{classify, header_value, is_block_close, is_block_open, HeaderField, LineKind};
use super::estimator::TimeEstimator;
use crate::utils::file_io::{count_lines_in, read_line_bytes};

/// Kind of recovered failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Header comment whose value is not an integer
    InvalidHeaderValue,
    /// Dwell whose seconds are not an integer
    InvalidDwell,
    /// Linear move whose feed rate or distance is unusable
    InvalidMove,
    /// The stream failed mid-read
    ReadFailure,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidHeaderValue => write!(f, "invalid header value"),
            Self::InvalidDwell => write!(f, "invalid dwell"),
            Self::InvalidMove => write!(f, "invalid move"),
            Self::ReadFailure => write!(f, "read failure"),
        }
    }
}

/// A single recovered failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 1-based line number, 0 when no line was read
    pub line: usize,
    /// What went wrong
    pub kind: DiagnosticKind,
    /// Offending line text, or the error message for read failures
    pub text: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}: {}", self.line, self.kind, self.text)
    }
}

/// Accumulated outcome of one pass over a layer file
///
/// Owned by the interpreter while the pass runs, then handed to the caller
/// and not modified again.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseResult {
    /// Raster width from `;W:`. Firmware labels this value as the vertical
    /// pixel count, see [`ParseResult::vertical_pixels`].
    pub width: i32,
    /// Raster height from `;H:`. Labelled as the horizontal pixel count.
    pub height: i32,
    /// Declared layer count from `;L:`, 0 when absent
    pub layer_count: i32,
    /// Estimated print time
    pub accumulated_seconds: f64,
    /// Set once any line fails to parse
    pub has_errors: bool,
    /// Raw payload of every layer block, in file order
    pub layers: Vec<Vec<u8>>,
    /// Every recovered failure, in file order
    pub diagnostics: Vec<Diagnostic>,
    /// Lines consumed, including lines inside layer blocks
    pub lines_read: usize,
    /// Whether the pass stopped on a cancellation request
    pub cancelled: bool,
}

impl ParseResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a recovered failure and raise the error flag
    pub fn record(&mut self, line: usize, kind: DiagnosticKind, text: impl Into<String>) {
        let diagnostic = Diagnostic {
            line,
            kind,
            text: text.into(),
        };
        warn!("Recovered parse failure at {}", diagnostic);
        self.diagnostics.push(diagnostic);
        self.has_errors = true;
    }

    /// Raw payload of the 0-based layer `index`
    pub fn layer(&self, index: usize) -> Option<&[u8]> {
        self.layers.get(index).map(Vec::as_slice)
    }

    /// Number of layer blocks actually captured
    pub fn captured_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn print_time(&self) -> PrintDuration {
        PrintDuration::from_seconds(self.accumulated_seconds)
    }

    /// Value shown under the "vertical pixels" label (the header width)
    pub fn vertical_pixels(&self) -> i32 {
        self.width
    }

    /// Value shown under the "horizontal pixels" label (the header height)
    pub fn horizontal_pixels(&self) -> i32 {
        self.height
    }

    /// Whether the source could not be opened at all
    pub fn open_failed(&self) -> bool {
        self.lines_read == 0
            && self
                .diagnostics
                .iter()
                .any(|d| d.kind == DiagnosticKind::ReadFailure && d.line == 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockState {
    Text,
    AwaitingPayload,
    SkippingToClose,
}

/// Emits integer percentages only when they change
#[derive(Debug)]
struct ProgressTracker {
    total: usize,
    last: Option<u8>,
}

impl ProgressTracker {
    fn new(total: Option<usize>) -> Self {
        Self {
            total: total.unwrap_or(0),
            last: None,
        }
    }

    fn update(&mut self, consumed: usize) -> Option<u8> {
        if self.total == 0 {
            return None;
        }
        let percent = ((consumed as u128 * 100) / self.total as u128).min(100) as u8;
        self.emit(percent)
    }

    fn finish(&mut self) -> Option<u8> {
        self.emit(100)
    }

    fn emit(&mut self, percent: u8) -> Option<u8> {
        match self.last {
            Some(last) if last >= percent => None,
            _ => {
                self.last = Some(percent);
                Some(percent)
            }
        }
    }
}

/// Runs one pass of the line interpreter
#[derive(Debug, Clone, Default)]
pub struct LineInterpreter {
    estimator: TimeEstimator,
    cancel: Option<CancelFlag>,
}

impl LineInterpreter {
    pub fn new(estimator: TimeEstimator) -> Self {
        Self {
            estimator,
            cancel: None,
        }
    }

    /// Check `flag` before every line and stop once it is set
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn estimator(&self) -> &TimeEstimator {
        &self.estimator
    }

    /// Interpret a whole stream
    ///
    /// `total_lines` is the progress denominator. When it is `None` or 0 only
    /// the final 100 is reported. `progress` always receives 100 last.
    pub fn interpret<R, F>(
        &self,
        mut reader: R,
        total_lines: Option<usize>,
        mut progress: F,
    ) -> ParseResult
    where
        R: BufRead,
        F: FnMut(u8),
    {
        info!(
            "Interpreting layer file with {} policy ({} lines)",
            self.estimator.policy(),
            total_lines.map_or_else(|| "unknown".to_string(), |n| n.to_string())
        );

        let mut result = ParseResult::new();
        let mut tracker = ProgressTracker::new(total_lines);
        let mut state = BlockState::Text;
        let mut buf = Vec::new();

        loop {
            if self.is_cancelled() {
                info!("Interpretation cancelled after {} lines", result.lines_read);
                result.cancelled = true;
                break;
            }

            match read_line_bytes(&mut reader, &mut buf) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    let line = result.lines_read + 1;
                    result.record(line, DiagnosticKind::ReadFailure, e.to_string());
                    break;
                }
            }

            result.lines_read += 1;
            let line_number = result.lines_read;

            state = match state {
                BlockState::AwaitingPayload => {
                    result.layers.push(buf.clone());
                    BlockState::SkippingToClose
                }
                BlockState::SkippingToClose if is_block_close(&buf) => BlockState::Text,
                BlockState::SkippingToClose => BlockState::SkippingToClose,
                BlockState::Text if is_block_open(&buf) => BlockState::AwaitingPayload,
                BlockState::Text => {
                    self.interpret_text(&mut result, line_number, &buf);
                    BlockState::Text
                }
            };

            if let Some(percent) = tracker.update(line_number) {
                debug!("Progress {}%", percent);
                progress(percent);
            }
        }

        if let Some(percent) = tracker.finish() {
            progress(percent);
        }

        info!(
            "Interpreted {} lines: {} layers, {:.1}s, {} diagnostics",
            result.lines_read,
            result.layers.len(),
            result.accumulated_seconds,
            result.diagnostics.len()
        );

        result
    }

    /// Interpret an in-memory buffer, without progress reporting
    pub fn interpret_bytes(&self, data: &[u8]) -> ParseResult {
        let total = count_lines_in(&mut Cursor::new(data)).ok();
        self.interpret(Cursor::new(data), total, |_| {})
    }

    /// Interpret in-memory text, without progress reporting
    pub fn interpret_str(&self, text: &str) -> ParseResult {
        self.interpret_bytes(text.as_bytes())
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn interpret_text(&self, result: &mut ParseResult, line_number: usize, raw: &[u8]) {
        let line = String::from_utf8_lossy(raw).to_uppercase();

        match classify(&line) {
            LineKind::Empty | LineKind::Comment | LineKind::OtherCommand => {}
            LineKind::Header(field) => {
                let value = match header_value(&line) {
                    Ok(value) => value,
                    Err(_) => {
                        result.record(line_number, DiagnosticKind::InvalidHeaderValue, line.as_str());
                        -1
                    }
                };
                match field {
                    HeaderField::Width => result.width = value,
                    HeaderField::Height => result.height = value,
                    HeaderField::LayerCount => result.layer_count = value,
                }
            }
            LineKind::Dwell => match self.estimator.dwell(&line) {
                Ok(seconds) => result.accumulated_seconds += seconds,
                Err(_) => result.record(line_number, DiagnosticKind::InvalidDwell, line.as_str()),
            },
            LineKind::LinearMove => match self.estimator.linear_move(&line) {
                Ok(seconds) => result.accumulated_seconds += seconds,
                Err(_) => result.record(line_number, DiagnosticKind::InvalidMove, line.as_str()),
            },
            LineKind::Unrecognized(c) => {
                debug!("Line {}: unrecognized '{}' (0x{:X})", line_number, c, c as u32);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparktimer_core::{cancel_flag, EstimationPolicy};
    use std::io::{self, Read};

    fn interpret(text: &str) -> ParseResult {
        LineInterpreter::default().interpret_str(text)
    }

    #[test]
    fn test_headers() {
        let result = interpret(";W:1440\n;H:2560\n;L:3\n");
        assert_eq!(result.width, 1440);
        assert_eq!(result.height, 2560);
        assert_eq!(result.layer_count, 3);
        assert!(!result.has_errors);
        assert_eq!(result.vertical_pixels(), 1440);
        assert_eq!(result.horizontal_pixels(), 2560);
    }

    #[test]
    fn test_lowercase_header() {
        let result = interpret(";w:16\n;l:2\n");
        assert_eq!(result.width, 16);
        assert_eq!(result.layer_count, 2);
    }

    #[test]
    fn test_invalid_header_stores_minus_one() {
        let result = interpret(";W:abc\n");
        assert_eq!(result.width, -1);
        assert!(result.has_errors);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].line, 1);
        assert_eq!(result.diagnostics[0].kind, DiagnosticKind::InvalidHeaderValue);
    }

    #[test]
    fn test_block_capture_is_raw() {
        let data = b";W:8\n{{\n\x01\xffab\nignored\n}}\nG4 S2\n";
        let result = LineInterpreter::default().interpret_bytes(data);
        assert_eq!(result.layers, vec![b"\x01\xffab".to_vec()]);
        assert_eq!(result.accumulated_seconds, 2.0);
        assert_eq!(result.lines_read, 6);
    }

    #[test]
    fn test_block_lines_are_not_commands() {
        let result = interpret("{{\nG4 S10\nG4 S20\n}}\n");
        assert_eq!(result.layers, vec![b"G4 S10".to_vec()]);
        assert_eq!(result.accumulated_seconds, 0.0);
    }

    #[test]
    fn test_unterminated_blocks() {
        let result = interpret("{{\npayload\nmore");
        assert_eq!(result.layers.len(), 1);
        assert!(!result.has_errors);

        let result = interpret("G4 S1\n{{\n");
        assert!(result.layers.is_empty());
        assert!(!result.has_errors);
    }

    #[test]
    fn test_unrecognized_and_empty_lines_are_not_errors() {
        let result = interpret("\nX10\n T1\n;\nM106\nG90\n");
        assert!(!result.has_errors);
        assert_eq!(result.accumulated_seconds, 0.0);
    }

    #[test]
    fn test_progress_sequence() {
        let text = "G4 S1\n".repeat(10);
        let mut seen = Vec::new();
        LineInterpreter::default().interpret(Cursor::new(text.as_bytes()), Some(10), |p| seen.push(p));
        assert_eq!(seen, vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
    }

    #[test]
    fn test_progress_unknown_total() {
        let mut seen = Vec::new();
        LineInterpreter::default().interpret(Cursor::new(b"G4 S1\n".as_slice()), None, |p| seen.push(p));
        assert_eq!(seen, vec![100]);
    }

    #[test]
    fn test_progress_clamped_when_total_underestimated() {
        let text = "G4 S1\n".repeat(5);
        let mut seen = Vec::new();
        LineInterpreter::default().interpret(Cursor::new(text.as_bytes()), Some(2), |p| seen.push(p));
        assert_eq!(seen, vec![50, 100]);
    }

    #[test]
    fn test_cancel_before_start() {
        let flag = cancel_flag();
        flag.store(true, Ordering::Relaxed);
        let interpreter = LineInterpreter::default().with_cancel_flag(flag);

        let mut seen = Vec::new();
        let result = interpreter.interpret(Cursor::new(b"G4 S1\n".as_slice()), Some(1), |p| seen.push(p));
        assert!(result.cancelled);
        assert_eq!(result.lines_read, 0);
        assert_eq!(seen, vec![100]);
    }

    struct FailingReader {
        served: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::other("device gone"));
            }
            self.served = true;
            let data = b"G4 S5\n";
            buf[..data.len()].copy_from_slice(data);
            Ok(data.len())
        }
    }

    #[test]
    fn test_read_failure_keeps_partial_result() {
        let reader = io::BufReader::new(FailingReader { served: false });
        let mut seen = Vec::new();
        let result = LineInterpreter::default().interpret(reader, Some(4), |p| seen.push(p));

        assert_eq!(result.accumulated_seconds, 5.0);
        assert!(result.has_errors);
        let failure = result.diagnostics.last().unwrap();
        assert_eq!(failure.kind, DiagnosticKind::ReadFailure);
        assert_eq!(failure.line, 2);
        assert_eq!(seen.last(), Some(&100));
    }

    #[test]
    fn test_policy_is_applied() {
        let interpreter =
            LineInterpreter::new(TimeEstimator::new(EstimationPolicy::LayerOverhead));
        let result = interpreter.interpret_str("G4 S2\nG1 Z5 F60\nG4 S3\n");
        assert_eq!(result.accumulated_seconds, 2.0 + 3.0 + 26.0);
    }
}
