//! Memoised similarity tables keyed by ratings content.
//!
//! Training is the expensive part of a similarity request. `SimilarityCache`
//! keeps the table from the first training run on a given ratings matrix and
//! serves it again for identical content and settings. The cache is an
//! ordinary value owned by the caller.
//!
//! Entries are found by a 64-bit hash of the ratings and the builder settings,
//! then confirmed against the stored ratings and settings, so a hash collision
//! retrains instead of returning another matrix's table. Each entry keeps its
//! own copy of the ratings; `with_max_entries` bounds how many are held,
//! evicting the oldest first.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};

use log::{debug, info, warn};

use crate::builder::{EngineBuilder, Fingerprint};
use crate::errors::EngineError;
use crate::ratings::RatingsMatrix;
use crate::similarity::SimilarityTable;

#[derive(Debug)]
struct CacheEntry {
    ratings: RatingsMatrix,
    fingerprint: Fingerprint,
    table: SimilarityTable,
}

#[derive(Debug, Default)]
pub struct SimilarityCache {
    builder: EngineBuilder,
    entries: HashMap<u64, CacheEntry>,
    // insertion order, oldest first
    order: VecDeque<u64>,
    max_entries: Option<usize>,
    hits: usize,
    misses: usize,
}

impl SimilarityCache {
    pub fn new(builder: EngineBuilder) -> Self {
        Self {
            builder,
            entries: HashMap::new(),
            order: VecDeque::new(),
            max_entries: None,
            hits: 0,
            misses: 0,
        }
    }

    /// Keep at most `max` tables (at least one).
    pub fn with_max_entries(mut self, max: usize) -> Self {
        let max = max.max(1);
        info!("Similarity cache limited to {} entries", max);
        self.max_entries = Some(max);
        self.evict_to(max);
        self
    }

    fn key(&self, ratings: &RatingsMatrix) -> u64 {
        let mut hasher = DefaultHasher::new();
        ratings.content_hash().hash(&mut hasher);
        self.builder.fingerprint().hash(&mut hasher);
        hasher.finish()
    }

    fn matches(&self, key: u64, ratings: &RatingsMatrix) -> Option<bool> {
        self.entries.get(&key).map(|entry| {
            entry.fingerprint == self.builder.fingerprint() && entry.ratings.same_content(ratings)
        })
    }

    /// Cached table for `ratings`, training on a miss.
    pub fn get_or_train(&mut self, ratings: &RatingsMatrix) -> Result<&SimilarityTable, EngineError> {
        let key = self.key(ratings);
        match self.matches(key, ratings) {
            Some(true) => {
                self.hits += 1;
                debug!("Similarity cache hit for key {:016x}", key);
                return Ok(&self.entries[&key].table);
            }
            Some(false) => {
                warn!("Similarity cache key {:016x} collides with other content, retraining", key);
                self.remove(key);
            }
            None => info!("Similarity cache miss for key {:016x}, training", key),
        }
        self.misses += 1;

        let table = self.builder.train(ratings)?;
        if let Some(max) = self.max_entries {
            self.evict_to(max - 1);
        }
        self.entries.insert(
            key,
            CacheEntry {
                ratings: ratings.clone(),
                fingerprint: self.builder.fingerprint(),
                table,
            },
        );
        self.order.push_back(key);
        Ok(&self.entries[&key].table)
    }

    fn remove(&mut self, key: u64) {
        self.entries.remove(&key);
        self.order.retain(|k| *k != key);
    }

    fn evict_to(&mut self, max: usize) {
        while self.entries.len() > max {
            match self.order.pop_front() {
                Some(oldest) => {
                    debug!("Evicting similarity table {:016x}", oldest);
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since construction.
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}
