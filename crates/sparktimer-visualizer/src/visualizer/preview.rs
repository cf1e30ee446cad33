//! Layer preview state
//!
//! Holds the image currently on display. A failed decode leaves the
//! previous image in place.

use std::sync::Arc;

use sparktimer_core::{AppEvent, DecodeError, EventBus, LayerEvent};
use tracing::{info, warn};

use super::bitmap::{decode_layer, DecodedLayer};
use super::cache::LayerCache;
use crate::gcode::ParseResult;

/// Presentation-side holder for the displayed layer
#[derive(Debug, Default)]
pub struct LayerPreview {
    current: Option<Arc<DecodedLayer>>,
    cache: Option<LayerCache>,
    event_bus: Option<Arc<EventBus>>,
}

impl LayerPreview {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve decodes through a [`LayerCache`]
    pub fn with_cache(mut self, cache: LayerCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Publish decode outcomes on `bus`
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Show 1-based layer `layer_number` of a completed parse
    ///
    /// On failure the previously displayed layer is kept and the error is
    /// returned to the caller.
    pub fn show_layer(
        &mut self,
        result: &ParseResult,
        layer_number: usize,
    ) -> Result<&DecodedLayer, DecodeError> {
        let index = layer_number.saturating_sub(1);
        let decoded = if layer_number == 0 {
            Err(DecodeError::InvalidLayerNumber {
                number: layer_number,
            })
        } else {
            match &self.cache {
                Some(cache) => cache.get_or_decode(result, index),
                None => decode_layer(result, index).map(Arc::new),
            }
        };

        match decoded {
            Ok(layer) => {
                let (width, height) = layer.image().dimensions();
                info!("Showing layer {} ({}x{})", layer_number, width, height);
                self.publish(LayerEvent::Decoded {
                    index,
                    width,
                    height,
                });
                let shown: &Arc<DecodedLayer> = self.current.insert(layer);
                Ok(shown.as_ref())
            }
            Err(e) => {
                warn!("Cannot show layer {}: {}", layer_number, e);
                self.publish(LayerEvent::DecodeFailed {
                    index,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Layer currently on display
    pub fn current(&self) -> Option<&DecodedLayer> {
        self.current.as_deref()
    }

    /// 1-based number of the layer on display
    pub fn current_layer_number(&self) -> Option<usize> {
        self.current.as_ref().map(|layer| layer.index() + 1)
    }

    /// Drop the displayed layer and any cached decodes
    pub fn clear(&mut self) {
        self.current = None;
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    fn publish(&self, event: LayerEvent) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.publish(AppEvent::Layer(event));
        }
    }
}
