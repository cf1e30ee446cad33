//! # Event Bus Module
//!
//! Publish/subscribe notifications for parse progress and layer decoding.
//! The parse worker and the layer preview publish; front ends subscribe.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sparktimer_core::event_bus::{AppEvent, EventBus, EventCategory, EventFilter};
//!
//! let bus = EventBus::new();
//! let subscription = bus.subscribe(
//!     EventFilter::Categories(vec![EventCategory::File]),
//!     |event| tracing::info!("{}", event.description()),
//! );
//!
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
