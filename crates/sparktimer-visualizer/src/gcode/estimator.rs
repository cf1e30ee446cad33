//! Print-time estimation for motion and dwell commands
//!
//! The free functions are pure and policy-free. [`TimeEstimator`] applies
//! the active [`EstimationPolicy`] on top of them.

use sparktimer_core::units::{seconds_per_unit, EstimationPolicy, DEFAULT_LAYER_OVERHEAD_SECS};
use sparktimer_core::EstimateError;

/// Seconds spent on a `G1` move line
///
/// The line must hold exactly two fields after the `G1` token (comment
/// removed): a feed rate prefixed `F` and a distance prefixed `Z`, in either
/// order. Any other field count contributes `0.0` without error.
///
/// The move time is `(60 / feed) * distance`, feed being distance per minute.
/// The distance keeps its sign, so a downward move subtracts time.
pub fn estimate_move_seconds(line: &str) -> Result<f64, EstimateError> {
    let upper = line.to_ascii_uppercase();
    let body = upper.strip_prefix("G1").unwrap_or(&upper);
    let body = body.split(';').next().unwrap_or("").trim();

    let fields: Vec<&str> = body.split(' ').collect();
    if fields.len() != 2 {
        return Ok(0.0);
    }

    let (feed_field, distance_field) = if fields[0].starts_with('F') {
        (fields[0], fields[1])
    } else {
        (fields[1], fields[0])
    };

    let feed = parse_prefixed(feed_field, 'F', "feed rate")?;
    let distance = parse_prefixed(distance_field, 'Z', "distance")?;

    let per_unit =
        seconds_per_unit(feed).ok_or(EstimateError::ZeroFeedRate { feed_rate: feed })?;

    Ok(per_unit * distance)
}

/// Seconds requested by a `G4 S<int>` dwell line
pub fn dwell_seconds(line: &str) -> Result<f64, EstimateError> {
    let upper = line.to_ascii_uppercase();
    let body = upper.strip_prefix("G4 S").unwrap_or(&upper);
    let value = body.split(';').next().unwrap_or("").trim();

    value
        .parse::<i64>()
        .map(|seconds| seconds as f64)
        .map_err(|_| EstimateError::InvalidNumber {
            field: "dwell",
            value: value.to_string(),
        })
}

fn parse_prefixed(field: &str, prefix: char, name: &'static str) -> Result<f64, EstimateError> {
    let digits = field.strip_prefix(prefix).unwrap_or(field);
    match digits.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(EstimateError::InvalidNumber {
            field: name,
            value: field.to_string(),
        }),
    }
}

/// Applies the active estimation policy to individual commands
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeEstimator {
    policy: EstimationPolicy,
    layer_overhead_secs: f64,
}

impl TimeEstimator {
    /// Estimator for `policy` with the default per-dwell overhead
    pub fn new(policy: EstimationPolicy) -> Self {
        Self {
            policy,
            layer_overhead_secs: DEFAULT_LAYER_OVERHEAD_SECS,
        }
    }

    /// Override the per-dwell overhead used by `LayerOverhead`
    pub fn with_layer_overhead(mut self, seconds: f64) -> Self {
        self.layer_overhead_secs = seconds;
        self
    }

    pub fn policy(&self) -> EstimationPolicy {
        self.policy
    }

    pub fn layer_overhead_secs(&self) -> f64 {
        self.layer_overhead_secs
    }

    /// Contribution of a dwell line under the active policy
    pub fn dwell(&self, line: &str) -> Result<f64, EstimateError> {
        let seconds = dwell_seconds(line)?;
        Ok(match self.policy {
            EstimationPolicy::MoveTime => seconds,
            EstimationPolicy::LayerOverhead => seconds + self.layer_overhead_secs,
        })
    }

    /// Contribution of a linear move line under the active policy
    pub fn linear_move(&self, line: &str) -> Result<f64, EstimateError> {
        match self.policy {
            EstimationPolicy::MoveTime => estimate_move_seconds(line),
            EstimationPolicy::LayerOverhead => Ok(0.0),
        }
    }
}

impl Default for TimeEstimator {
    fn default() -> Self {
        Self::new(EstimationPolicy::default())
    }
}
