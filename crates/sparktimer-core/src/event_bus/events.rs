//! Event type definitions for the event bus.
//!
//! Events are cloneable and serializable so subscribers can log or forward
//! them without touching the parse result itself.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root event enum for all application events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppEvent {
    /// Layer file parse lifecycle
    File(FileEvent),
    /// Layer decode and preview
    Layer(LayerEvent),
}

impl AppEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            AppEvent::File(_) => EventCategory::File,
            AppEvent::Layer(_) => EventCategory::Layer,
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            AppEvent::File(e) => e.description(),
            AppEvent::Layer(e) => e.description(),
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Layer file parse events.
    File,
    /// Layer decode events.
    Layer,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::File => write!(f, "File"),
            EventCategory::Layer => write!(f, "Layer"),
        }
    }
}

/// Layer file parse events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FileEvent {
    /// A parse pass started.
    Opened {
        /// Path to the opened file.
        path: PathBuf,
        /// Total number of lines in the file.
        lines: usize,
    },
    /// A second open was refused because a pass is active.
    Rejected {
        /// Path that was refused.
        path: PathBuf,
    },
    /// Parse progress update.
    Progress {
        /// Integer percentage in `[0, 100]`.
        percent: u8,
    },
    /// Parse finished.
    Completed {
        /// Number of layer blocks captured.
        layers: usize,
        /// Estimated print time in seconds.
        seconds: f64,
        /// Whether any line failed to parse.
        has_errors: bool,
        /// Wall time spent on the pass.
        duration: Duration,
    },
    /// Parse stopped on request.
    Cancelled {
        /// Lines consumed before stopping.
        lines_read: usize,
    },
    /// Stream failed mid-read; a partial result is still handed back.
    ReadFailed {
        /// Line number at which reading failed.
        line: usize,
        /// Error message describing the failure.
        error: String,
    },
}

impl FileEvent {
    fn description(&self) -> String {
        match self {
            FileEvent::Opened { path, lines } => {
                format!("Opened: {} ({} lines)", path.display(), lines)
            }
            FileEvent::Rejected { path } => {
                format!("Rejected {}: a file is already being processed", path.display())
            }
            FileEvent::Progress { percent } => format!("Progress: {}%", percent),
            FileEvent::Completed {
                layers,
                seconds,
                has_errors,
                duration,
            } => format!(
                "Completed: {} layers, {:.1}s estimated, errors: {} ({:?})",
                layers, seconds, has_errors, duration
            ),
            FileEvent::Cancelled { lines_read } => {
                format!("Cancelled after {} lines", lines_read)
            }
            FileEvent::ReadFailed { line, error } => {
                format!("Read failed at line {}: {}", line, error)
            }
        }
    }
}

/// Layer decode events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LayerEvent {
    /// A layer was decoded and is ready for display.
    Decoded {
        /// 0-based layer index.
        index: usize,
        /// Width of the display image.
        width: u32,
        /// Height of the display image.
        height: u32,
    },
    /// A layer could not be decoded; the previous image stays in place.
    DecodeFailed {
        /// 0-based layer index that was requested.
        index: usize,
        /// Error message describing the failure.
        error: String,
    },
}

impl LayerEvent {
    fn description(&self) -> String {
        match self {
            LayerEvent::Decoded {
                index,
                width,
                height,
            } => format!("Layer {} decoded ({}x{})", index, width, height),
            LayerEvent::DecodeFailed { index, error } => {
                format!("Layer {} decode failed: {}", index, error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_category() {
        let event = AppEvent::File(FileEvent::Progress { percent: 40 });
        assert_eq!(event.category(), EventCategory::File);

        let event = AppEvent::Layer(LayerEvent::DecodeFailed {
            index: 2,
            error: "short".to_string(),
        });
        assert_eq!(event.category(), EventCategory::Layer);
    }

    #[test]
    fn test_event_description() {
        let event = AppEvent::File(FileEvent::Opened {
            path: PathBuf::from("part.gcode"),
            lines: 12,
        });
        assert_eq!(event.description(), "Opened: part.gcode (12 lines)");

        let event = AppEvent::Layer(LayerEvent::Decoded {
            index: 0,
            width: 4,
            height: 8,
        });
        assert_eq!(event.description(), "Layer 0 decoded (4x8)");
    }

    #[test]
    fn test_event_serializes() {
        let event = AppEvent::File(FileEvent::Cancelled { lines_read: 3 });
        let json = serde_json::to_string(&event).expect("serialize");
        let back: AppEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, event);
    }
}
