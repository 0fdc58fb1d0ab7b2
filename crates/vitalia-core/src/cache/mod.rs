//! TTL+LRU cache for expensive lookups.

pub mod layer;

pub use layer::{CacheStats, ResponseCache};
