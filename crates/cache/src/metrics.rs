// crates/cache/src/metrics.rs
//! Derived cache statistics

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Fixed bookkeeping cost charged to every entry
pub const ENTRY_OVERHEAD_BYTES: usize = 24;

/// Cost charged per dependency or dependent edge
pub const EDGE_OVERHEAD_BYTES: usize = 16;

/// Data size assumed when a value cannot be serialized
pub const FALLBACK_DATA_BYTES: usize = 1024;

/// Raw counters kept by the cache manager
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheCounters {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub cascade_invalidations: u64,
    pub dependency_registrations: u64,
    /// Entries dropped because their TTL lapsed
    pub expirations: u64,
}

/// Aggregate statistics of a cache
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStatistics {
    #[serde(flatten)]
    pub counters: CacheCounters,
    /// hits + misses
    pub total: u64,
    /// Percentage, rounded to two decimals
    pub hit_rate: f64,
    /// Cascade invalidations per delete, as a percentage
    pub invalidation_rate: f64,
    pub size: usize,
    pub memory_usage_bytes: usize,
    /// Mean TTL of live entries
    pub avg_ttl: Duration,
}

impl CacheStatistics {
    pub fn efficiency_level(&self) -> EfficiencyLevel {
        MetricsCalculator::efficiency_level(self.hit_rate)
    }

    /// Human-readable one-line summary
    pub fn display(&self) -> StatsDisplay<'_> {
        StatsDisplay(self)
    }
}

/// Coarse rating of a hit rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EfficiencyLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for EfficiencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EfficiencyLevel::Low => "low",
            EfficiencyLevel::Medium => "medium",
            EfficiencyLevel::High => "high",
        })
    }
}

/// Pure functions turning raw counters into statistics
pub struct MetricsCalculator;

impl MetricsCalculator {
    pub fn round2(value: f64) -> f64 {
        (value * 100.0).round() / 100.0
    }

    fn percentage(part: u64, whole: u64) -> f64 {
        if whole == 0 {
            0.0
        } else {
            Self::round2(part as f64 / whole as f64 * 100.0)
        }
    }

    pub fn hit_rate(hits: u64, misses: u64) -> f64 {
        Self::percentage(hits, hits + misses)
    }

    pub fn invalidation_rate(cascade_invalidations: u64, deletes: u64) -> f64 {
        Self::percentage(cascade_invalidations, deletes)
    }

    /// Arithmetic mean, zero for an empty input
    pub fn avg_ttl<I>(ttls: I) -> Duration
    where
        I: IntoIterator<Item = Duration>,
    {
        let (count, total) = ttls
            .into_iter()
            .fold((0u128, 0u128), |(n, sum), ttl| (n + 1, sum + ttl.as_nanos()));

        if count == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(u64::try_from(total / count).unwrap_or(u64::MAX))
        }
    }

    /// Estimated footprint of one entry
    ///
    /// `2 * key_len + 2 * data_bytes + ENTRY_OVERHEAD_BYTES`, plus
    /// `EDGE_OVERHEAD_BYTES` per edge. This is an observability estimate,
    /// not allocator accounting.
    pub fn entry_memory(key: &str, data_bytes: usize, edges: usize) -> usize {
        2 * key.len() + 2 * data_bytes + ENTRY_OVERHEAD_BYTES + edges * EDGE_OVERHEAD_BYTES
    }

    /// JSON-serialized size of `data`, or a conservative fallback
    pub fn data_size<T: Serialize>(key: &str, data: &T) -> usize {
        match serde_json::to_vec(data) {
            Ok(bytes) => bytes.len(),
            Err(e) => {
                log::warn!("Could not size cache entry '{}': {}", key, e);
                FALLBACK_DATA_BYTES
            }
        }
    }

    /// `High` above 80, `Medium` above 50, `Low` otherwise
    pub fn efficiency_level(hit_rate: f64) -> EfficiencyLevel {
        if hit_rate > 80.0 {
            EfficiencyLevel::High
        } else if hit_rate > 50.0 {
            EfficiencyLevel::Medium
        } else {
            EfficiencyLevel::Low
        }
    }

    pub fn format_hit_rate(hit_rate: f64) -> String {
        format!("{:.2}%", hit_rate)
    }

    pub fn format_memory_mb(bytes: usize) -> String {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    }

    pub fn format_avg_ttl(avg_ttl: Duration) -> String {
        format!("{}s", avg_ttl.as_secs())
    }
}

/// Formats [`CacheStatistics`] for operators
pub struct StatsDisplay<'a>(&'a CacheStatistics);

impl fmt::Display for StatsDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.0;
        write!(
            f,
            "hit rate {} ({}), {} entries, {}, avg ttl {}, {} cascades / {} deletes",
            MetricsCalculator::format_hit_rate(stats.hit_rate),
            stats.efficiency_level(),
            stats.size,
            MetricsCalculator::format_memory_mb(stats.memory_usage_bytes),
            MetricsCalculator::format_avg_ttl(stats.avg_ttl),
            stats.counters.cascade_invalidations,
            stats.counters.deletes,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        assert_eq!(MetricsCalculator::hit_rate(0, 0), 0.0);
        assert_eq!(MetricsCalculator::hit_rate(1, 1), 50.0);
        assert_eq!(MetricsCalculator::hit_rate(1, 2), 33.33);
        assert_eq!(MetricsCalculator::hit_rate(2, 1), 66.67);
        assert_eq!(MetricsCalculator::hit_rate(5, 0), 100.0);
    }

    #[test]
    fn test_invalidation_rate() {
        assert_eq!(MetricsCalculator::invalidation_rate(3, 0), 0.0);
        assert_eq!(MetricsCalculator::invalidation_rate(1, 4), 25.0);
        assert_eq!(MetricsCalculator::invalidation_rate(6, 2), 300.0);
    }

    #[test]
    fn test_efficiency_boundaries() {
        assert_eq!(MetricsCalculator::efficiency_level(80.0), EfficiencyLevel::Medium);
        assert_eq!(MetricsCalculator::efficiency_level(80.1), EfficiencyLevel::High);
        assert_eq!(MetricsCalculator::efficiency_level(50.0), EfficiencyLevel::Low);
        assert_eq!(MetricsCalculator::efficiency_level(50.1), EfficiencyLevel::Medium);
        assert_eq!(MetricsCalculator::efficiency_level(0.0), EfficiencyLevel::Low);
        assert_eq!(EfficiencyLevel::High.to_string(), "high");
    }

    #[test]
    fn test_avg_ttl() {
        assert_eq!(MetricsCalculator::avg_ttl(Vec::new()), Duration::ZERO);
        assert_eq!(
            MetricsCalculator::avg_ttl(vec![Duration::from_secs(10), Duration::from_secs(20)]),
            Duration::from_secs(15)
        );
    }

    #[test]
    fn test_entry_memory_estimate() {
        // "key" = 3 bytes, data 10 bytes, no edges
        assert_eq!(MetricsCalculator::entry_memory("key", 10, 0), 6 + 20 + 24);
        assert_eq!(MetricsCalculator::entry_memory("key", 10, 2), 6 + 20 + 24 + 32);
        assert_eq!(MetricsCalculator::data_size("k", &"abc"), 5);
    }

    #[test]
    fn test_data_size_falls_back_on_serialization_error() {
        use std::collections::HashMap;

        // JSON object keys must be strings
        let mut unserializable = HashMap::new();
        unserializable.insert(vec![1u8], 1u8);
        assert_eq!(
            MetricsCalculator::data_size("bad", &unserializable),
            FALLBACK_DATA_BYTES
        );
    }

    #[test]
    fn test_formatting() {
        assert_eq!(MetricsCalculator::format_hit_rate(66.666), "66.67%");
        assert_eq!(MetricsCalculator::format_hit_rate(0.0), "0.00%");
        assert_eq!(MetricsCalculator::format_memory_mb(1024 * 1024 * 3 / 2), "1.50 MB");
        assert_eq!(MetricsCalculator::format_avg_ttl(Duration::from_millis(59_999)), "59s");
    }

    #[test]
    fn test_stats_display() {
        let stats = CacheStatistics {
            counters: CacheCounters {
                hits: 9,
                misses: 1,
                ..Default::default()
            },
            total: 10,
            hit_rate: 90.0,
            invalidation_rate: 0.0,
            size: 4,
            memory_usage_bytes: 0,
            avg_ttl: Duration::from_secs(300),
        };

        let line = stats.display().to_string();
        assert!(line.contains("90.00% (high)"));
        assert!(line.contains("4 entries"));
        assert!(line.contains("0.00 MB"));
        assert!(line.contains("avg ttl 300s"));
    }
}
