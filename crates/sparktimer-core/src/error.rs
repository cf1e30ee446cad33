//! Error handling for SparkTimer
//!
//! Provides error types for every layer of the pipeline:
//! - Layer file errors (opening and streaming the input)
//! - Estimate errors (numeric fields in motion and dwell commands)
//! - Decode errors (turning a packed layer buffer into a raster)
//! - Worker errors (background parse lifecycle)
//!
//! Line-level failures never surface as these errors past the interpreter;
//! they are recorded as diagnostics on the parse result instead.
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Layer file error type
///
/// Represents failures to open or stream a layer file.
#[derive(Error, Debug)]
pub enum LayerFileError {
    /// File does not exist
    #[error("File does not exist: {path}")]
    FileNotFound {
        /// The path that was requested.
        path: String,
    },

    /// Path exists but is not a regular file
    #[error("Path is not a file: {path}")]
    NotAFile {
        /// The path that was requested.
        path: String,
    },

    /// I/O failure while opening or reading
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Estimate error type
///
/// Raised by the time estimator when a numeric field cannot be used.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimateError {
    /// A field did not parse as a number
    #[error("Invalid number '{value}' in {field}")]
    InvalidNumber {
        /// Which field failed ("feed rate", "distance", "dwell").
        field: &'static str,
        /// The raw text that failed to parse.
        value: String,
    },

    /// Feed rate is zero or not finite, so no time can be derived
    #[error("Feed rate {feed_rate} cannot be used to derive a move time")]
    ZeroFeedRate {
        /// The offending feed rate.
        feed_rate: f64,
    },
}

/// Decode error type
///
/// Represents a failure to decode one layer. Always isolated to a single
/// decode request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Requested layer index is not present in the parsed file
    #[error("Layer {index} out of range ({available} layers available)")]
    LayerOutOfRange {
        /// The 0-based index that was requested.
        index: usize,
        /// Number of layers actually captured.
        available: usize,
    },

    /// A 1-based layer number of zero was requested
    #[error("Layer numbers start at 1, got {number}")]
    InvalidLayerNumber {
        /// The requested 1-based layer number.
        number: usize,
    },

    /// Header dimensions cannot describe a raster
    #[error("Invalid raster dimensions {width}x{height}")]
    InvalidDimensions {
        /// Header width.
        width: i32,
        /// Header height.
        height: i32,
    },

    /// Packed buffer holds fewer bytes than the dimensions require
    #[error("Layer buffer too short: expected {expected} bytes, got {actual}")]
    BufferTooShort {
        /// Bytes required (`height * row_stride`).
        expected: usize,
        /// Bytes available.
        actual: usize,
    },

    /// Encoding the decoded image failed
    #[error("Image error: {reason}")]
    Image {
        /// The reason reported by the image encoder.
        reason: String,
    },
}

/// Worker error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// A parse pass is already running
    #[error("A file is already being processed")]
    Busy,

    /// The worker thread went away without handing back a result
    #[error("Parse worker disconnected before completing")]
    Disconnected,
}

/// Main error type for SparkTimer
///
/// Unifies the errors that cross crate boundaries. Estimate errors never
/// do; the interpreter turns them into diagnostics.
#[derive(Error, Debug)]
pub enum Error {
    /// Layer file error
    #[error(transparent)]
    LayerFile(#[from] LayerFileError),

    /// Decode error
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Worker error
    #[error(transparent)]
    Worker(#[from] WorkerError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::LayerOutOfRange {
            index: 7,
            available: 3,
        };
        assert_eq!(err.to_string(), "Layer 7 out of range (3 layers available)");

        let err = DecodeError::BufferTooShort {
            expected: 20,
            actual: 4,
        };
        assert_eq!(
            err.to_string(),
            "Layer buffer too short: expected 20 bytes, got 4"
        );
    }

    #[test]
    fn test_estimate_error_display() {
        let err = EstimateError::InvalidNumber {
            field: "feed rate",
            value: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid number 'abc' in feed rate");
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = DecodeError::InvalidDimensions {
            width: -1,
            height: 10,
        }
        .into();
        assert!(matches!(err, Error::Decode(_)));

        let err: Error = WorkerError::Busy.into();
        assert!(matches!(err, Error::Worker(WorkerError::Busy)));

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = LayerFileError::from(io_err).into();
        assert!(matches!(err, Error::LayerFile(LayerFileError::Io(_))));
    }
}
