// crates/cache/src/graph.rs
//! Dependency graph between cache keys
//!
//! Edges are stored twice, as adjacency sets keyed by cache key:
//! `dependencies[a]` contains `b` exactly when `dependents[b]` contains `a`.
//! A key may appear here without a cached value, for instance when it is
//! only named as someone's dependency.

use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Default)]
pub(crate) struct DependencyGraph {
    dependencies: HashMap<String, HashSet<String>>,
    dependents: HashMap<String, HashSet<String>>,
}

impl DependencyGraph {
    /// Records that `key` depends on `dependency`; returns false if the edge existed
    pub(crate) fn add_edge(&mut self, key: &str, dependency: &str) -> bool {
        let inserted = self
            .dependencies
            .entry(key.to_string())
            .or_default()
            .insert(dependency.to_string());
        self.dependents
            .entry(dependency.to_string())
            .or_default()
            .insert(key.to_string());
        inserted
    }

    /// Drops every edge from `key` to the keys it depends on
    pub(crate) fn clear_dependencies(&mut self, key: &str) {
        if let Some(dependencies) = self.dependencies.remove(key) {
            for dependency in dependencies {
                remove_from(&mut self.dependents, &dependency, key);
            }
        }
    }

    /// Removes `key` and all of its edges, returning its former dependents
    pub(crate) fn remove_node(&mut self, key: &str) -> HashSet<String> {
        self.clear_dependencies(key);

        let dependents = self.dependents.remove(key).unwrap_or_default();
        for dependent in &dependents {
            remove_from(&mut self.dependencies, dependent, key);
        }
        dependents
    }

    /// Removes `seed` and every key that transitively depends on it
    ///
    /// Returns the reached keys in breadth-first order, excluding `seed`.
    /// Cycles terminate through the visited set.
    pub(crate) fn cascade(&mut self, seed: &str) -> Vec<String> {
        let mut visited: HashSet<String> = HashSet::from([seed.to_string()]);
        let mut queue: VecDeque<String> = self.remove_node(seed).into_iter().collect();
        let mut reached = Vec::new();

        while let Some(key) = queue.pop_front() {
            if !visited.insert(key.clone()) {
                continue;
            }
            let next = self.remove_node(&key);
            queue.extend(next.into_iter().filter(|k| !visited.contains(k)));
            reached.push(key);
        }

        reached
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.dependencies.contains_key(key) || self.dependents.contains_key(key)
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &String> {
        self.dependencies
            .keys()
            .chain(self.dependents.keys().filter(|k| !self.dependencies.contains_key(*k)))
    }

    pub(crate) fn dependencies_of(&self, key: &str) -> Vec<String> {
        sorted(self.dependencies.get(key))
    }

    pub(crate) fn dependents_of(&self, key: &str) -> Vec<String> {
        sorted(self.dependents.get(key))
    }

    /// Number of edges touching `key`, in either direction
    pub(crate) fn edge_count(&self, key: &str) -> usize {
        self.dependencies.get(key).map_or(0, HashSet::len)
            + self.dependents.get(key).map_or(0, HashSet::len)
    }

    pub(crate) fn clear(&mut self) {
        self.dependencies.clear();
        self.dependents.clear();
    }
}

fn remove_from(map: &mut HashMap<String, HashSet<String>>, key: &str, value: &str) {
    if let Some(set) = map.get_mut(key) {
        set.remove(value);
        if set.is_empty() {
            map.remove(key);
        }
    }
}

fn sorted(set: Option<&HashSet<String>>) -> Vec<String> {
    let mut keys: Vec<String> = set.map(|s| s.iter().cloned().collect()).unwrap_or_default();
    keys.sort();
    keys
}
