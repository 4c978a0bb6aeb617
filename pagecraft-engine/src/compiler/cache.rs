//! Compiled-component cache keyed by the content hash of the prepared source.
//!
//! Entries are immutable once inserted. Two threads missing on the same key
//! both compile and the last insert wins, which is fine because compilation
//! is deterministic.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::CompiledComponent;
use crate::error::CompileResult;

pub type CacheEntry = CompileResult<Arc<CompiledComponent>>;

pub fn source_hash(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

pub struct RenderCache {
    entries: DashMap<String, CacheEntry>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RenderCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the cached result for `source`, compiling it on a miss.
    /// Failures are cached too, so broken source is not re-parsed on every
    /// render either.
    pub fn get_or_compile(&self, source: &str, compile: impl FnOnce() -> CacheEntry) -> CacheEntry {
        let key = source_hash(source);
        if let Some(entry) = self.entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(hash = %&key[..12], "render cache hit");
            return entry.value().clone();
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(hash = %&key[..12], "render cache miss");
        let entry = compile();
        if self.entries.len() >= self.capacity {
            debug!(capacity = self.capacity, "render cache full, clearing");
            self.entries.clear();
        }
        self.entries.insert(key, entry.clone());
        entry
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CompileError, CompileErrorKind};

    #[test]
    fn hash_is_content_based() {
        assert_eq!(source_hash("a"), source_hash(&String::from("a")));
        assert_ne!(source_hash("a"), source_hash("b"));
        assert_eq!(source_hash("").len(), 64);
    }

    #[test]
    fn compiles_once_per_source() {
        let cache = RenderCache::new(8);
        let mut calls = 0;
        for _ in 0..3 {
            let _ = cache.get_or_compile("src", || {
                calls += 1;
                Err(CompileError::new(CompileErrorKind::Syntax, "x", "src"))
            });
        }
        assert_eq!(calls, 1);
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 2,
                misses: 1,
                entries: 1
            }
        );
    }

    #[test]
    fn full_cache_is_cleared_before_insert() {
        let cache = RenderCache::new(2);
        let fail = |s: &str| -> CacheEntry { Err(CompileError::new(CompileErrorKind::Syntax, "x", s)) };
        let _ = cache.get_or_compile("a", || fail("a"));
        let _ = cache.get_or_compile("b", || fail("b"));
        let _ = cache.get_or_compile("c", || fail("c"));
        assert_eq!(cache.len(), 1);
    }
}
