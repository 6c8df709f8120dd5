//! First-In, First-Out (FIFO) replacement policy.
//!
//! Evicts the key that was admitted earliest. A hit never reorders the queue,
//! so a key accessed on every request is still evicted as soon as it becomes
//! the oldest resident.
//!
//! ## Architecture
//!
//! ```text
//!   resident: FxHashSet<K>          queue: VecDeque<K>
//!                                   front ─► [a] [b] [c] ◄─ back
//!                                          oldest       newest
//!                                          (evict)      (admit)
//! ```
//!
//! | Operation | Time |
//! |-----------|------|
//! | hit       | O(1) |
//! | miss      | O(1) |
//!
//! ## Example
//!
//! ```
//! use cachesim::policy::fifo::FifoCache;
//! use cachesim::traits::{Access, CoreCache};
//!
//! let mut cache = FifoCache::new(2);
//! cache.access(&"a");
//! cache.access(&"b");
//! assert_eq!(cache.access(&"a"), Access::Hit);
//!
//! // "a" is still the oldest despite the hit.
//! cache.access(&"c");
//! assert!(!cache.contains(&"a"));
//! ```

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::error::{ConfigError, InvariantError};
use crate::metrics::snapshot::PolicySnapshot;
use crate::traits::{Access, CacheKey, CoreCache};

#[derive(Debug)]
pub struct FifoCache<K> {
    resident: FxHashSet<K>,
    queue: VecDeque<K>,
    capacity: usize,
}

impl<K: CacheKey> FifoCache<K> {
    /// Creates a FIFO cache. A capacity of 0 admits nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            resident: FxHashSet::with_capacity_and_hasher(capacity, Default::default()),
            queue: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Creates a FIFO cache, rejecting a zero capacity.
    pub fn try_new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidCapacity {
                capacity,
                minimum: 1,
            });
        }
        Ok(Self::new(capacity))
    }

    /// Oldest resident key, the next eviction victim.
    pub fn peek_oldest(&self) -> Option<&K> {
        self.queue.front()
    }
}

impl<K: CacheKey> CoreCache<K> for FifoCache<K> {
    fn access(&mut self, key: &K) -> Access {
        if self.resident.contains(key) {
            return Access::Hit;
        }
        if self.capacity == 0 {
            return Access::Miss;
        }

        if self.queue.len() >= self.capacity
            && let Some(victim) = self.queue.pop_front()
        {
            self.resident.remove(&victim);
        }
        self.queue.push_back(key.clone());
        self.resident.insert(key.clone());
        Access::Miss
    }

    fn contains(&self, key: &K) -> bool {
        self.resident.contains(key)
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.queue.len() != self.resident.len() {
            return Err(InvariantError::new(format!(
                "FIFO queue holds {} keys but {} are resident",
                self.queue.len(),
                self.resident.len()
            )));
        }
        if self.queue.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "FIFO holds {} keys over capacity {}",
                self.queue.len(),
                self.capacity
            )));
        }
        if let Some(stray) = self.queue.iter().find(|k| !self.resident.contains(*k)) {
            return Err(InvariantError::new(format!(
                "FIFO queue entry {stray:?} missing from resident set"
            )));
        }
        Ok(())
    }

    fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot::Fifo {
            resident: self.queue.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_evicts_in_admission_order_despite_hits() {
        let mut cache = FifoCache::new(3);
        for k in [1, 2, 3] {
            assert_eq!(cache.access(&k), Access::Miss);
        }
        for _ in 0..5 {
            assert_eq!(cache.access(&1), Access::Hit);
        }

        assert_eq!(cache.access(&4), Access::Miss);
        assert!(!cache.contains(&1));
        assert_eq!(cache.peek_oldest(), Some(&2));
        assert!(cache.check_invariants().is_ok());
    }

    #[test]
    fn fifo_zero_capacity_admits_nothing() {
        let mut cache = FifoCache::new(0);
        assert_eq!(cache.access(&"a"), Access::Miss);
        assert_eq!(cache.access(&"a"), Access::Miss);
        assert!(cache.is_empty());
        assert!(FifoCache::<u32>::try_new(0).is_err());
    }

    #[test]
    fn fifo_snapshot_reports_resident() {
        let mut cache = FifoCache::try_new(4).unwrap();
        cache.access(&10u64);
        cache.access(&11u64);
        assert_eq!(cache.snapshot(), PolicySnapshot::Fifo { resident: 2 });
    }
}
