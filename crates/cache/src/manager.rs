// crates/cache/src/manager.rs
//! Cache manager with dependency-aware invalidation

use crate::entry::CacheEntry;
use crate::graph::DependencyGraph;
use crate::metrics::{CacheCounters, CacheStatistics, MetricsCalculator};
use contentguard_telemetry::{event_types, Emitter, EventCategory};
use serde::Serialize;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Entries, graph and counters live under one lock so that a cascade is
/// never observed half-done.
struct CacheInner<T> {
    entries: HashMap<String, CacheEntry<T>>,
    graph: DependencyGraph,
    counters: CacheCounters,
}

impl<T> CacheInner<T> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            graph: DependencyGraph::default(),
            counters: CacheCounters::default(),
        }
    }

    /// Removes `key` and every entry depending on it
    ///
    /// Returns the keys of the dependent entries removed by the cascade.
    fn invalidate(&mut self, key: &str) -> Vec<String> {
        self.entries.remove(key);

        let cascaded: Vec<String> = self
            .graph
            .cascade(key)
            .into_iter()
            .filter(|reached| self.entries.remove(reached).is_some())
            .collect();

        self.counters.cascade_invalidations += cascaded.len() as u64;
        cascaded
    }
}

enum Lookup<T> {
    Hit(T),
    Expired(Vec<String>),
    Absent,
}

/// In-process key/value cache with TTL expiry and cascade invalidation
///
/// Cloning yields another handle to the same cache.
pub struct CacheManager<T> {
    inner: Arc<Mutex<CacheInner<T>>>,
    emitter: Emitter,
}

impl<T> CacheManager<T> {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner::new())),
            emitter: Emitter::disabled(),
        }
    }

    /// Publishes hit, miss and cascade events through `emitter`
    pub fn with_telemetry(mut self, emitter: Emitter) -> Self {
        self.emitter = emitter;
        self
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner<T>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stores `data` under `key` for `ttl`
    pub fn set(&self, key: impl Into<String>, data: T, ttl: Duration) {
        self.set_with_dependencies(key, data, ttl, std::iter::empty::<&str>());
    }

    /// Stores `data` under `key`, invalidated whenever any of `dependencies` is
    ///
    /// Re-setting a key replaces its own dependency edges but keeps the
    /// entries that depend on it.
    pub fn set_with_dependencies<I, S>(&self, key: impl Into<String>, data: T, ttl: Duration, dependencies: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let key = key.into();
        let mut inner = self.lock();

        inner.graph.clear_dependencies(&key);
        for dependency in dependencies {
            if inner.graph.add_edge(&key, dependency.as_ref()) {
                inner.counters.dependency_registrations += 1;
            }
        }

        inner.entries.insert(key, CacheEntry::new(data, ttl));
        inner.counters.sets += 1;
    }

    /// Deletes `key` and cascades to everything depending on it
    ///
    /// Returns false if the key was neither cached nor part of the graph.
    pub fn delete(&self, key: &str) -> bool {
        let cascaded = {
            let mut inner = self.lock();
            if !inner.entries.contains_key(key) && !inner.graph.contains(key) {
                return false;
            }
            inner.counters.deletes += 1;
            inner.invalidate(key)
        };

        log::debug!("Deleted '{}' ({} dependents invalidated)", key, cascaded.len());
        self.report_cascade(key, &cascaded);
        true
    }

    /// Removes every entry, or only keys containing `pattern`
    ///
    /// Counters survive. A pattern clear behaves like a `delete` of each
    /// matched key: seeds count as deletes, their dependents as cascade
    /// invalidations. A seed already taken by an earlier seed's cascade is
    /// not counted twice. Returns the number of entries removed, dependents
    /// included.
    pub fn clear(&self, pattern: Option<&str>) -> usize {
        let Some(pattern) = pattern else {
            let mut inner = self.lock();
            let removed = inner.entries.len();
            inner.entries.clear();
            inner.graph.clear();
            log::info!("Cache cleared ({} entries)", removed);
            return removed;
        };

        let (removed, cascades) = {
            let mut inner = self.lock();
            let mut matched: Vec<String> = inner
                .entries
                .keys()
                .chain(inner.graph.keys())
                .filter(|key| key.contains(pattern))
                .cloned()
                .collect();
            matched.sort();
            matched.dedup();

            let before = inner.entries.len();
            let mut taken: HashSet<String> = HashSet::new();
            let mut cascades = Vec::new();
            for key in matched {
                if taken.contains(&key) {
                    continue;
                }
                inner.counters.deletes += 1;
                let cascaded = inner.invalidate(&key);
                taken.extend(cascaded.iter().cloned());
                cascades.push((key, cascaded));
            }
            (before - inner.entries.len(), cascades)
        };

        for (key, cascaded) in &cascades {
            self.report_cascade(key, cascaded);
        }
        log::info!("Cache cleared {} entries matching '{}'", removed, pattern);
        removed
    }

    /// Drops expired entries and their dependents; returns entries removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let (removed, cascades) = {
            let mut inner = self.lock();
            let expired: Vec<String> = inner
                .entries
                .iter()
                .filter(|(_, entry)| !entry.is_live(now))
                .map(|(key, _)| key.clone())
                .collect();

            let before = inner.entries.len();
            let mut cascades = Vec::new();
            for key in expired {
                // An earlier cascade may already have taken it
                if inner.entries.contains_key(&key) {
                    inner.counters.expirations += 1;
                    let cascaded = inner.invalidate(&key);
                    cascades.push((key, cascaded));
                }
            }
            (before - inner.entries.len(), cascades)
        };

        for (key, cascaded) in &cascades {
            self.report_cascade(key, cascaded);
        }
        removed
    }

    /// Whether a live entry exists for `key`, without touching counters
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.lock()
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_live(now))
    }

    /// Number of stored entries, expired ones not yet swept included
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Stored keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Keys that `key` depends on
    pub fn dependencies_of(&self, key: &str) -> Vec<String> {
        self.lock().graph.dependencies_of(key)
    }

    /// Keys that depend on `key`
    pub fn dependents_of(&self, key: &str) -> Vec<String> {
        self.lock().graph.dependents_of(key)
    }

    /// Raw counters
    pub fn counters(&self) -> CacheCounters {
        self.lock().counters
    }

    /// Zeroes every counter; entries are kept
    pub fn reset_stats(&self) {
        self.lock().counters = CacheCounters::default();
    }

    fn report_cascade(&self, key: &str, cascaded: &[String]) {
        if cascaded.is_empty() {
            return;
        }
        self.emitter.emit(
            event_types::CACHE_CASCADE,
            EventCategory::Cache,
            json!({ "key": key, "invalidated": cascaded }),
        );
    }
}

impl<T: Clone> CacheManager<T> {
    /// Returns the live value for `key`
    ///
    /// An expired entry counts as a miss and is removed on the spot,
    /// together with everything depending on it.
    pub fn get(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        let lookup = {
            let mut inner = self.lock();
            let hit = inner
                .entries
                .get(key)
                .map(|entry| entry.is_live(now).then(|| entry.data.clone()));

            match hit {
                Some(Some(data)) => {
                    inner.counters.hits += 1;
                    Lookup::Hit(data)
                }
                Some(None) => {
                    inner.counters.misses += 1;
                    inner.counters.expirations += 1;
                    Lookup::Expired(inner.invalidate(key))
                }
                None => {
                    inner.counters.misses += 1;
                    Lookup::Absent
                }
            }
        };

        match lookup {
            Lookup::Hit(data) => {
                self.emitter
                    .emit(event_types::CACHE_HIT, EventCategory::Cache, json!({ "key": key }));
                Some(data)
            }
            Lookup::Expired(cascaded) => {
                log::debug!("Cache entry '{}' expired", key);
                self.emitter.emit(
                    event_types::CACHE_MISS,
                    EventCategory::Cache,
                    json!({ "key": key, "expired": true }),
                );
                self.report_cascade(key, &cascaded);
                None
            }
            Lookup::Absent => {
                self.emitter.emit(
                    event_types::CACHE_MISS,
                    EventCategory::Cache,
                    json!({ "key": key, "expired": false }),
                );
                None
            }
        }
    }
}

impl<T: Serialize> CacheManager<T> {
    /// Aggregate statistics over counters and stored entries
    pub fn stats(&self) -> CacheStatistics {
        let now = Instant::now();
        let inner = self.lock();
        let counters = inner.counters;

        let memory_usage_bytes: usize = inner
            .entries
            .iter()
            .map(|(key, entry)| {
                MetricsCalculator::entry_memory(
                    key,
                    MetricsCalculator::data_size(key, &entry.data),
                    inner.graph.edge_count(key),
                )
            })
            .sum();

        let avg_ttl = MetricsCalculator::avg_ttl(
            inner
                .entries
                .values()
                .filter(|entry| entry.is_live(now))
                .map(|entry| entry.ttl),
        );

        CacheStatistics {
            counters,
            total: counters.hits + counters.misses,
            hit_rate: MetricsCalculator::hit_rate(counters.hits, counters.misses),
            invalidation_rate: MetricsCalculator::invalidation_rate(
                counters.cascade_invalidations,
                counters.deletes,
            ),
            size: inner.entries.len(),
            memory_usage_bytes,
            avg_ttl,
        }
    }
}

impl<T> Clone for CacheManager<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            emitter: self.emitter.clone(),
        }
    }
}

impl<T> Default for CacheManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for CacheManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheManager")
            .field("len", &self.len())
            .field("emitter", &self.emitter)
            .finish()
    }
}
