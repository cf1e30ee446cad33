//! Type aliases for commonly used complex types.
//!
//! Gives names to the shared-state shapes used across the parse worker
//! and the layer cache.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sparktimer_core::types::*;
//!
//! // Instead of: Arc<parking_lot::Mutex<HashMap<usize, Layer>>>
//! let cache: ThreadSafeMap<usize, Layer> = thread_safe_map();
//! ```

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

// =============================================================================
// THREAD-SAFE SHARED TYPES
// =============================================================================

/// A thread-safe hash map for cross-thread key-value storage.
///
/// Uses `parking_lot::Mutex` for better performance than `std::sync::Mutex`.
pub type ThreadSafeMap<K, V> = Arc<Mutex<HashMap<K, V>>>;

/// A shared flag checked cooperatively by long-running passes.
///
/// Setting it to `true` asks the owner to stop at the next check point.
pub type CancelFlag = Arc<AtomicBool>;

// =============================================================================
// CONSTRUCTOR HELPERS
// =============================================================================

/// Create a new empty `ThreadSafeMap<K, V>`.
#[inline]
pub fn thread_safe_map<K, V>() -> ThreadSafeMap<K, V> {
    Arc::new(Mutex::new(HashMap::new()))
}

/// Create a new, unset `CancelFlag`.
#[inline]
pub fn cancel_flag() -> CancelFlag {
    Arc::new(AtomicBool::new(false))
}
