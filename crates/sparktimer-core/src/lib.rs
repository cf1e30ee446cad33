//! # SparkTimer Core
//!
//! Core types, errors, and events shared by the SparkTimer crates.

pub mod error;
pub mod event_bus;
pub mod types;
pub mod units;

pub use error::{DecodeError, Error, EstimateError, LayerFileError, Result, WorkerError};

pub use event_bus::{
    AppEvent, EventBus, EventBusConfig, EventBusError, EventCategory, EventFilter, FileEvent,
    LayerEvent, SubscriptionId,
};

pub use types::{cancel_flag, thread_safe_map, CancelFlag, ThreadSafeMap};

pub use units::{
    format_print_time, seconds_per_unit, EstimationPolicy, PrintDuration,
    DEFAULT_LAYER_OVERHEAD_SECS, SECONDS_PER_MINUTE,
};
