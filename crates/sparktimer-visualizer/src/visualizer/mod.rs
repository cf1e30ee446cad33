//! Layer bitmap decoding and preview
//!
//! This module provides:
//! - Bit-reversal and row unpacking of layer payloads
//! - Clockwise rotation into the display orientation
//! - PNG export of decoded layers
//! - An optional decoded-layer cache
//! - The preview holder that keeps the displayed layer

pub mod bitmap;
pub mod cache;
pub mod preview;

pub use bitmap::{decode_buffer, decode_layer, reverse_bits, row_stride, DecodedLayer, BIT_REVERSE};
pub use cache::LayerCache;
pub use preview::LayerPreview;
