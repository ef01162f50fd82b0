// crates/cache/src/lib.rs
//! Dependency-aware in-process cache
//!
//! Entries expire after their TTL and may depend on other keys. Removing a
//! key, whether by delete, pattern clear or expiry, transitively removes
//! every entry computed from it.
//!
//! # Example
//!
//! ```rust
//! use contentguard_cache::CacheManager;
//! use std::time::Duration;
//!
//! let cache = CacheManager::new();
//! let ttl = Duration::from_secs(300);
//!
//! cache.set("category:rust", "Rust".to_string(), ttl);
//! cache.set_with_dependencies("posts:rust", "[...]".to_string(), ttl, ["category:rust"]);
//!
//! cache.delete("category:rust");
//! assert_eq!(cache.get("posts:rust"), None);
//! assert_eq!(cache.stats().counters.cascade_invalidations, 1);
//! ```

mod entry;
mod graph;
mod manager;
mod metrics;
mod sweeper;

pub use manager::CacheManager;
pub use metrics::{
    CacheCounters, CacheStatistics, EfficiencyLevel, MetricsCalculator, StatsDisplay,
    EDGE_OVERHEAD_BYTES, ENTRY_OVERHEAD_BYTES, FALLBACK_DATA_BYTES,
};
pub use sweeper::Sweeper;
