//! Decoded layer cache
//!
//! Keeps one decoded image per layer index. Each entry remembers a hash of
//! the raster size and raw payload it was decoded from, and is only reused
//! when the queried result still has the same source for that index.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use sparktimer_core::{thread_safe_map, DecodeError, ThreadSafeMap};
use tracing::{debug, trace};

use super::bitmap::{decode_layer, DecodedLayer};
use crate::gcode::ParseResult;

/// Thread-safe cache of decoded layers
#[derive(Debug, Clone)]
pub struct LayerCache {
    entries: ThreadSafeMap<usize, (u64, Arc<DecodedLayer>)>,
}

impl Default for LayerCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerCache {
    pub fn new() -> Self {
        Self {
            entries: thread_safe_map(),
        }
    }

    /// Cached decode of layer `index`, decoding on a miss
    ///
    /// An entry decoded from a different raster size or payload counts as a
    /// miss and is replaced. Failures are not cached.
    pub fn get_or_decode(
        &self,
        result: &ParseResult,
        index: usize,
    ) -> Result<Arc<DecodedLayer>, DecodeError> {
        let hash = source_hash(result, index);

        if let Some((stored, layer)) = self.entries.lock().get(&index) {
            if *stored == hash {
                trace!("Layer cache hit for {}", index);
                return Ok(Arc::clone(layer));
            }
            debug!("Cached layer {} is stale", index);
        }

        // Decode without holding the lock.
        let layer = Arc::new(decode_layer(result, index)?);
        self.entries
            .lock()
            .insert(index, (hash, Arc::clone(&layer)));
        debug!("Cached layer {}", index);
        Ok(layer)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.entries.lock().contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

fn source_hash(result: &ParseResult, index: usize) -> u64 {
    let mut hasher = DefaultHasher::new();
    result.width.hash(&mut hasher);
    result.height.hash(&mut hasher);
    result.layer(index).hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(width: i32, payloads: Vec<Vec<u8>>) -> ParseResult {
        ParseResult {
            width,
            height: 1,
            layers: payloads,
            ..ParseResult::default()
        }
    }

    #[test]
    fn test_cached_decode_matches_direct_decode() {
        let result = result_with(8, vec![vec![0x35], vec![0xC0]]);
        let cache = LayerCache::new();

        let cached = cache.get_or_decode(&result, 1).unwrap();
        assert_eq!(*cached, decode_layer(&result, 1).unwrap());
        assert!(cache.contains(1));

        let again = cache.get_or_decode(&result, 1).unwrap();
        assert!(Arc::ptr_eq(&cached, &again));
    }

    #[test]
    fn test_failures_are_not_cached() {
        let result = result_with(8, vec![vec![0x01]]);
        let cache = LayerCache::new();
        assert!(cache.get_or_decode(&result, 4).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_changed_payload_is_redecoded() {
        let cache = LayerCache::new();
        cache
            .get_or_decode(&result_with(8, vec![vec![0x01]]), 0)
            .unwrap();
        assert_eq!(cache.len(), 1);

        let other = result_with(8, vec![vec![0x02]]);
        let layer = cache.get_or_decode(&other, 0).unwrap();
        assert_eq!(layer.is_set(1, 0), Some(true));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_results_differing_after_first_layer() {
        let cache = LayerCache::new();
        let first = result_with(8, vec![vec![0x00], vec![0x01]]);
        let second = result_with(8, vec![vec![0x00], vec![0xFF]]);

        cache.get_or_decode(&first, 0).unwrap();
        cache.get_or_decode(&first, 1).unwrap();

        let shared = cache.get_or_decode(&second, 0).unwrap();
        assert_eq!(*shared, decode_layer(&second, 0).unwrap());

        let changed = cache.get_or_decode(&second, 1).unwrap();
        assert_eq!(*changed, decode_layer(&second, 1).unwrap());
        assert_ne!(*changed, decode_layer(&first, 1).unwrap());
    }

    #[test]
    fn test_raster_size_change_is_redecoded() {
        let cache = LayerCache::new();
        let narrow = result_with(8, vec![vec![0x80, 0x01]]);
        let wide = result_with(16, vec![vec![0x80, 0x01]]);

        cache.get_or_decode(&narrow, 0).unwrap();
        let layer = cache.get_or_decode(&wide, 0).unwrap();
        assert_eq!(layer.width(), 16);
    }
}
