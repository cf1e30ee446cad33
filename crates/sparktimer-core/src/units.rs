//! Unit conversion utilities
//!
//! Feed rates in layer files are expressed in distance per minute while the
//! print-time total is kept in seconds. This module holds the conversions
//! between the two and the `HHh:MMm:SSs` display format.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Seconds in one minute
pub const SECONDS_PER_MINUTE: f64 = 60.0;

/// Default settling overhead added per dwell under `LayerOverhead`
pub const DEFAULT_LAYER_OVERHEAD_SECS: f64 = 13.0;

/// Print-time estimation policy
///
/// The two policies are mutually exclusive; exactly one is active per pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimationPolicy {
    /// Dwell seconds plus the time of every `G1` move
    #[default]
    MoveTime,
    /// Dwell seconds plus a fixed overhead per dwell; `G1` moves add nothing
    LayerOverhead,
}

impl fmt::Display for EstimationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MoveTime => write!(f, "move-time"),
            Self::LayerOverhead => write!(f, "layer-overhead"),
        }
    }
}

impl FromStr for EstimationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "move-time" | "move" => Ok(Self::MoveTime),
            "layer-overhead" | "overhead" => Ok(Self::LayerOverhead),
            _ => Err(format!("Unknown estimation policy: {}", s)),
        }
    }
}

/// Convert a feed rate (distance per minute) into seconds per unit distance
///
/// Returns `None` when the feed rate cannot produce a finite result.
pub fn seconds_per_unit(feed_rate_per_min: f64) -> Option<f64> {
    if feed_rate_per_min == 0.0 || !feed_rate_per_min.is_finite() {
        return None;
    }
    Some(SECONDS_PER_MINUTE / feed_rate_per_min)
}

/// Print duration split into display components
///
/// Hours are total hours and deliberately do not wrap at a day boundary,
/// so a 25 hour print reads `25h:00m:00s` rather than `01h:00m:00s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrintDuration {
    /// Whole hours
    pub hours: u64,
    /// Minutes within the hour
    pub minutes: u64,
    /// Whole seconds within the minute
    pub seconds: u64,
}

impl PrintDuration {
    /// Build from a total in seconds
    ///
    /// Fractional seconds are truncated; negative or non-finite totals
    /// collapse to zero.
    pub fn from_seconds(total: f64) -> Self {
        let whole = if total.is_finite() && total > 0.0 {
            total.trunc() as u64
        } else {
            0
        };

        Self {
            hours: whole / 3600,
            minutes: (whole % 3600) / 60,
            seconds: whole % 60,
        }
    }
}

impl fmt::Display for PrintDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}h:{:02}m:{:02}s",
            self.hours, self.minutes, self.seconds
        )
    }
}

/// Format a total in seconds as `HHh:MMm:SSs`
pub fn format_print_time(total_seconds: f64) -> String {
    PrintDuration::from_seconds(total_seconds).to_string()
}
