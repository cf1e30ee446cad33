//! Type system utilities and aliases.
//!
//! ## Modules
//!
//! - [`aliases`]: Type aliases for `Arc<Mutex<T>>`, cancel flags and progress callbacks.

pub mod aliases;

pub use aliases::*;
