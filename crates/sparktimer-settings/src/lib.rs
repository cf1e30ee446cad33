//! SparkTimer Settings Crate
//!
//! Handles application configuration and its persistence.

pub mod config;
pub mod error;

pub use config::{Config, EstimationPolicy, EstimationSettings, PreviewSettings};
pub use error::{ConfigError, SettingsError, SettingsResult};
