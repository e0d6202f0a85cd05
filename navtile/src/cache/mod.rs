//! Tile caching: a generic bounded LRU store and the manager that fronts
//! the tile loader with it.
//!
//! The [`LruCache`] itself is not thread-safe; [`TileCacheManager`] owns
//! it behind a single mutex so recency bookkeeping is always updated
//! atomically with lookup, and so a cache miss and the load that fills it
//! happen under one critical section.

mod lru;
mod manager;

pub use lru::LruCache;
pub use manager::TileCacheManager;
