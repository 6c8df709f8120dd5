//! # LFU (Least Frequently Used) replacement policy
//!
//! Evicts the resident key with the lowest access count. Counts start at 1 on
//! admission and grow by one on every hit; they are forgotten on eviction.
//!
//! ## Architecture
//!
//! ```text
//!   FrequencyBuckets<K>
//!
//!   min_freq ─► [freq 1] ◄──► [freq 2] ◄──► [freq 5]
//!                 │              │             │
//!               D ◄─► B         C             A
//!             newest  oldest
//!                     (victim)
//! ```
//!
//! ## Tie-breaking
//!
//! Among keys with equal counts the victim is the one whose last admission or
//! hit is oldest. A hit moves the key to the newest end of its new bucket.
//!
//! ```text
//!   Access pattern: A, B, A, C, A, D   capacity 3
//!
//!     After A,B,A,C: {A:2, B:1, C:1}
//!     A hit:         {A:3, B:1, C:1}
//!     Admit D:       {A:3, C:1, D:1}  ← B evicted (freq 1, older than C)
//! ```
//!
//! ## Example
//!
//! ```
//! use cachesim::policy::lfu::LfuCache;
//! use cachesim::traits::CoreCache;
//!
//! let mut cache = LfuCache::new(2);
//! cache.access(&"hot");
//! cache.access(&"hot");
//! cache.access(&"cold");
//! cache.access(&"new"); // evicts "cold"
//!
//! assert!(cache.contains(&"hot"));
//! assert_eq!(cache.frequency(&"hot"), Some(2));
//! assert!(!cache.contains(&"cold"));
//! ```

use crate::ds::FrequencyBuckets;
use crate::error::{ConfigError, InvariantError};
use crate::metrics::snapshot::PolicySnapshot;
use crate::traits::{Access, CacheKey, CoreCache};

#[derive(Debug)]
pub struct LfuCache<K> {
    buckets: FrequencyBuckets<K>,
    capacity: usize,
}

impl<K: CacheKey> LfuCache<K> {
    /// Creates an LFU cache. A capacity of 0 admits nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            buckets: FrequencyBuckets::with_capacity(capacity),
            capacity,
        }
    }

    pub fn try_new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidCapacity {
                capacity,
                minimum: 1,
            });
        }
        Ok(Self::new(capacity))
    }

    /// Access count of a resident key.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.buckets.frequency(key)
    }

    /// Next eviction victim and its count.
    pub fn peek_lfu(&self) -> Option<(&K, u64)> {
        self.buckets.peek_min()
    }
}

impl<K: CacheKey> CoreCache<K> for LfuCache<K> {
    fn access(&mut self, key: &K) -> Access {
        if self.buckets.touch(key).is_some() {
            return Access::Hit;
        }
        if self.capacity == 0 {
            return Access::Miss;
        }

        if self.buckets.len() >= self.capacity {
            self.buckets.pop_min();
        }
        self.buckets.insert(key.clone());
        Access::Miss
    }

    fn contains(&self, key: &K) -> bool {
        self.buckets.contains(key)
    }

    fn len(&self) -> usize {
        self.buckets.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.buckets.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "LFU holds {} keys over capacity {}",
                self.buckets.len(),
                self.capacity
            )));
        }
        match (self.buckets.is_empty(), self.buckets.min_freq()) {
            (true, None) => {}
            (false, Some(f)) if f >= 1 => {}
            (empty, min) => {
                return Err(InvariantError::new(format!(
                    "LFU min frequency {min:?} inconsistent with empty={empty}"
                )));
            }
        }
        self.buckets.check()
    }

    fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot::Lfu {
            resident: self.buckets.len(),
            min_frequency: self.buckets.min_freq().unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lfu_equal_counts_evict_earlier_insert() {
        let mut cache = LfuCache::new(2);
        cache.access(&1);
        cache.access(&2);
        cache.access(&3);

        assert!(!cache.contains(&1));
        assert!(cache.contains(&2));
        assert!(cache.contains(&3));
    }

    #[test]
    fn lfu_equal_counts_evict_oldest_touch() {
        let mut cache = LfuCache::new(2);
        cache.access(&"a");
        cache.access(&"b");
        cache.access(&"b");
        cache.access(&"a");
        // both at 2; "b" reached it first
        assert_eq!(cache.peek_lfu(), Some((&"b", 2)));

        cache.access(&"c");
        assert!(!cache.contains(&"b"));
        assert!(cache.contains(&"a"));
    }

    #[test]
    fn lfu_counts_grow_on_hits_and_reset_on_eviction() {
        let mut cache = LfuCache::new(1);
        cache.access(&5u32);
        assert_eq!(cache.access(&5), Access::Hit);
        assert_eq!(cache.frequency(&5), Some(2));

        cache.access(&6);
        assert_eq!(cache.frequency(&5), None);
        cache.access(&5);
        assert_eq!(cache.frequency(&5), Some(1));
        assert!(cache.check_invariants().is_ok());
    }

    #[test]
    fn lfu_snapshot_reports_min_frequency() {
        let mut cache = LfuCache::new(3);
        cache.access(&1);
        cache.access(&1);
        assert_eq!(
            cache.snapshot(),
            PolicySnapshot::Lfu {
                resident: 1,
                min_frequency: 2
            }
        );
    }
}
