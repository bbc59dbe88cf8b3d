//! Caller-owned compilation cache.
//!
//! Keys are blake3 hashes over the invocation batch (ids, names, arguments,
//! cost estimates, in submission order) plus the fusion-relevant config
//! fields. The cache is an explicit object passed by the caller, never a
//! process-wide singleton, so compilation stays a pure function of its
//! inputs plus the cache handed in.

use std::collections::{HashMap, VecDeque};

use blake3::Hasher;

use toolfuse_core::types::{CompilationResult, ToolInvocation};

use crate::fusion::FusionConfig;

const DEFAULT_CAPACITY: usize = 64;

/// Bounded FIFO cache of compilation results.
pub struct CompilationCache {
    capacity: usize,
    entries: HashMap<String, CompilationResult>,
    order: VecDeque<String>,
    hits: u64,
    misses: u64,
}

impl CompilationCache {
    /// Creates a cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a cache holding at most `capacity` results.
    ///
    /// A zero capacity is clamped to one entry.
    pub fn with_capacity(capacity: usize) -> Self {
        CompilationCache {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Computes the cache key for a batch plus config.
    pub fn key(invocations: &[ToolInvocation], config: &FusionConfig) -> String {
        let mut hasher = Hasher::new();

        for invocation in invocations {
            hasher.update(invocation.id.as_bytes());
            hasher.update(&[0]);
            hasher.update(invocation.name.as_bytes());
            hasher.update(&[0]);
            hasher.update(&serde_json::to_vec(&invocation.arguments).unwrap_or_default());
            hasher.update(&invocation.estimated_cost.to_le_bytes());
        }

        hasher.update(&config.min_token_savings_threshold.to_le_bytes());
        hasher.update(&(config.max_parallelism as u64).to_le_bytes());
        hasher.update(&[config.enable_dependency_analysis as u8]);
        hasher.update(&config.fusion_overhead.to_le_bytes());

        hasher.finalize().to_hex().to_string()
    }

    /// Returns a clone of the stored result, counting a hit or miss.
    pub fn lookup(&mut self, key: &str) -> Option<CompilationResult> {
        match self.entries.get(key) {
            Some(result) => {
                self.hits += 1;
                Some(result.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Stores a result, evicting the oldest entry at capacity.
    pub fn store(&mut self, key: String, result: CompilationResult) {
        if self.entries.contains_key(&key) {
            self.entries.insert(key, result);
            return;
        }

        while self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            } else {
                break;
            }
        }

        self.order.push_back(key.clone());
        self.entries.insert(key, result);
    }

    /// Number of cached results.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lookups that found a stored result.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Number of lookups that found nothing.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Drops all entries, keeping the hit/miss counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

impl Default for CompilationCache {
    fn default() -> Self {
        Self::new()
    }
}
