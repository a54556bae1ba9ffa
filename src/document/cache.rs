//! Bounded document cache with LRU eviction
//!
//! Keeps parsed documents keyed by normalized path under two independent
//! bounds: document count and aggregate estimated memory.
//!
//! # Thread Safety
//!
//! Entries and access ranks live in `DashMap`s, so `get`, `contains` and
//! `remove` on different keys never wait on each other. Admission (`put`),
//! `evict_lru` and `clear` are serialized by a single `parking_lot::Mutex`
//! so that two writers never pick the same victim or double-count freed
//! memory. Entries are handed out as `Arc<LoadedDocument>`: evicting an
//! entry never invalidates a reference a caller already holds.
//!
//! # Eviction
//!
//! LRU order is tracked with a monotonic tick rather than wall-clock time,
//! so two accesses within the same clock resolution still rank correctly.
//! `put` evicts one victim per round until both bounds hold or the cache is
//! empty. A document whose own estimate exceeds the memory bound is refused
//! up front instead of flushing the whole cache for nothing.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::path::normalize_key;
use super::types::{CacheStatistics, DocumentSummary, LoadedDocument};

/// Default maximum number of cached documents
pub const DEFAULT_MAX_DOCUMENTS: usize = 50;
/// Default aggregate memory bound (2 GiB)
pub const DEFAULT_MAX_MEMORY_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Cache bounds
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of documents kept
    pub max_documents: usize,
    /// Maximum sum of `memory_size_bytes` over all entries
    pub max_memory_bytes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_documents: DEFAULT_MAX_DOCUMENTS,
            max_memory_bytes: DEFAULT_MAX_MEMORY_BYTES,
        }
    }
}

/// Concurrent LRU document cache
pub struct DocumentCache {
    /// Normalized path -> document
    documents: DashMap<String, Arc<LoadedDocument>>,
    /// Normalized path -> access tick, used only for victim selection
    access_ranks: DashMap<String, u64>,
    /// Monotonic access clock
    clock: AtomicU64,
    /// Serializes admission and eviction
    eviction_lock: Mutex<()>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    config: CacheConfig,
}

impl Default for DocumentCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl DocumentCache {
    /// Create a new document cache with the given bounds
    pub fn new(config: CacheConfig) -> Self {
        Self {
            documents: DashMap::new(),
            access_ranks: DashMap::new(),
            clock: AtomicU64::new(0),
            eviction_lock: Mutex::new(()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Insert a document, evicting least-recently-used entries as needed
    ///
    /// Returns `false` when the document could not be retained; the caller
    /// still owns a usable document in that case, it is just not cached.
    pub fn put(&self, path: impl AsRef<Path>, document: LoadedDocument) -> bool {
        let key = normalize_key(path);
        let incoming = document.memory_size_bytes;

        if incoming > self.config.max_memory_bytes {
            warn!(
                "Refusing to cache {}: estimated {} bytes exceeds the {} byte memory bound",
                key, incoming, self.config.max_memory_bytes
            );
            return false;
        }

        let _guard = self.eviction_lock.lock();

        // Replacing a key releases its previous slot and memory first
        self.remove_entry(&key);

        while self.exceeds_bounds(incoming) {
            if !self.evict_one() {
                break;
            }
        }

        if self.documents.len() >= self.config.max_documents {
            warn!(
                "Cache full ({} documents), {} not cached",
                self.documents.len(),
                key
            );
            return false;
        }

        document.reset_access();
        // Document before rank: a rank without a document is skipped by
        // eviction, a document without a rank could never be evicted
        self.documents.insert(key.clone(), Arc::new(document));
        let tick = self.next_tick();
        self.access_ranks.insert(key.clone(), tick);

        debug!("Cached {} ({} bytes)", key, incoming);
        true
    }

    /// Look up a document, recording the access
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Arc<LoadedDocument>> {
        let key = normalize_key(path);
        let document = self.documents.get(&key).map(|entry| Arc::clone(entry.value()));

        match document {
            Some(document) => {
                if let Some(mut rank) = self.access_ranks.get_mut(&key) {
                    *rank = self.next_tick();
                }
                document.record_access();
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit: {}", key);
                Some(document)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("Cache miss: {}", key);
                None
            }
        }
    }

    /// Check if a document is cached (does not count as an access)
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.documents.contains_key(&normalize_key(path))
    }

    /// Evict the least-recently-used document
    ///
    /// Returns `false` when there was nothing to evict.
    pub fn evict_lru(&self) -> bool {
        let _guard = self.eviction_lock.lock();
        self.evict_one()
    }

    /// Remove a document
    pub fn remove(&self, path: impl AsRef<Path>) -> bool {
        self.take(path).is_some()
    }

    /// Remove a document and hand back the evicted entry
    ///
    /// Outstanding `Arc`s stay valid; the entry only leaves the cache.
    pub fn take(&self, path: impl AsRef<Path>) -> Option<Arc<LoadedDocument>> {
        let key = normalize_key(path);
        let _guard = self.eviction_lock.lock();
        let removed = self.remove_entry(&key);
        if let Some(document) = &removed {
            info!(
                "Removed {} from cache ({} bytes)",
                key, document.memory_size_bytes
            );
        }
        removed
    }

    /// Drop every cached document
    pub fn clear(&self) {
        let _guard = self.eviction_lock.lock();
        let count = self.documents.len();
        self.access_ranks.clear();
        self.documents.clear();
        info!("Cleared {} documents from cache", count);
    }

    /// Sum of `memory_size_bytes` over all entries
    pub fn memory_usage(&self) -> u64 {
        self.documents
            .iter()
            .map(|entry| entry.value().memory_size_bytes)
            .sum()
    }

    /// Get the number of cached documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Snapshot of cached documents, most recently used first
    pub fn documents(&self) -> Vec<DocumentSummary> {
        let mut ranked: Vec<(u64, DocumentSummary)> = self
            .documents
            .iter()
            .map(|entry| {
                let rank = self
                    .access_ranks
                    .get(entry.key())
                    .map(|r| *r.value())
                    .unwrap_or(0);
                (rank, entry.value().summary())
            })
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0));
        ranked.into_iter().map(|(_, summary)| summary).collect()
    }

    /// Get cache statistics
    pub fn statistics(&self) -> CacheStatistics {
        let mut documents_by_type = BTreeMap::new();
        let mut memory_usage_bytes = 0u64;
        let mut document_count = 0usize;

        for entry in self.documents.iter() {
            let document = entry.value();
            *documents_by_type
                .entry(document.document_type.label().to_string())
                .or_insert(0) += 1;
            memory_usage_bytes += document.memory_size_bytes;
            document_count += 1;
        }

        let memory_utilization_percent = if self.config.max_memory_bytes == 0 {
            0.0
        } else {
            memory_usage_bytes as f64 / self.config.max_memory_bytes as f64 * 100.0
        };

        CacheStatistics {
            document_count,
            memory_usage_bytes,
            max_documents: self.config.max_documents,
            max_memory_bytes: self.config.max_memory_bytes,
            documents_by_type,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            memory_utilization_percent,
        }
    }

    fn exceeds_bounds(&self, incoming: u64) -> bool {
        self.documents.len() >= self.config.max_documents
            || self.memory_usage() + incoming > self.config.max_memory_bytes
    }

    /// One eviction round. Caller must hold `eviction_lock`.
    fn evict_one(&self) -> bool {
        loop {
            // Collect the key first: DashMap iteration holds shard locks
            let victim = self
                .access_ranks
                .iter()
                .min_by_key(|entry| *entry.value())
                .map(|entry| entry.key().clone());

            let Some(key) = victim else {
                return false;
            };

            self.access_ranks.remove(&key);
            // A concurrent remove may have taken the document already;
            // keep scanning for a live victim in that case
            if let Some((_, document)) = self.documents.remove(&key) {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                info!(
                    "Evicted {} ({} bytes, {} accesses)",
                    key,
                    document.memory_size_bytes,
                    document.access_count()
                );
                return true;
            }
        }
    }

    /// Caller must hold `eviction_lock`.
    fn remove_entry(&self, key: &str) -> Option<Arc<LoadedDocument>> {
        self.access_ranks.remove(key);
        self.documents.remove(key).map(|(_, document)| document)
    }

    fn next_tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }
}
