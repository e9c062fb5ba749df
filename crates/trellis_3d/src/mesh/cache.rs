//! Shared geometry cache.
//!
//! Identical primitive parameters produce identical meshes, so geometry
//! nodes share one mesh per parameter set. Entries are weak: when the last
//! node holding a mesh drops it, the entry dies and is pruned on the next
//! lookup. The cache itself never keeps a mesh alive.

use std::sync::{Arc, Weak};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::Mesh;

/// Statistics about the geometry cache.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of entries, live or dead.
    pub entries: usize,
    /// Entries whose mesh is still alive.
    pub live: usize,
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
}

impl CacheStats {
    /// Get the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f32 / total as f32
        }
    }
}

/// Weak-reference mesh cache keyed by parameter strings.
#[derive(Default)]
pub struct GeometryCache {
    entries: FxHashMap<String, Weak<Mesh>>,
    hits: u64,
    misses: u64,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a live mesh.
    pub fn get(&mut self, key: &str) -> Option<Arc<Mesh>> {
        match self.entries.get(key).and_then(Weak::upgrade) {
            Some(mesh) => {
                self.hits += 1;
                Some(mesh)
            }
            None => {
                self.entries.remove(key);
                self.misses += 1;
                None
            }
        }
    }

    /// Look up or build-and-insert.
    pub fn get_or_insert_with(&mut self, key: &str, build: impl FnOnce() -> Mesh) -> Arc<Mesh> {
        if let Some(mesh) = self.get(key) {
            return mesh;
        }
        let mesh = Arc::new(build());
        self.entries.insert(key.to_string(), Arc::downgrade(&mesh));
        mesh
    }

    /// Drop entries whose mesh is gone.
    pub fn prune(&mut self) {
        self.entries.retain(|_, weak| weak.strong_count() > 0);
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            live: self
                .entries
                .values()
                .filter(|w| w.strong_count() > 0)
                .count(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}
