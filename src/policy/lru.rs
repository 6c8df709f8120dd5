//! Least Recently Used (LRU) replacement policy.
//!
//! Exact LRU: every hit moves the key to the most-recently-used end, and a
//! miss at capacity evicts the least-recently-used end.
//!
//! ## Architecture
//!
//! ```text
//!   index: FxHashMap<K, SlotId>        order: IntrusiveList<K>
//!   ┌─────────┬─────────┐              head ─► [c] ◄──► [a] ◄──► [b] ◄── tail
//!   │  key a  │  id_1   │                MRU                        LRU
//!   │  key b  │  id_2   │                                         (evict)
//!   │  key c  │  id_3   │
//!   └─────────┴─────────┘
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
//! use cachesim::policy::lru::LruCache;
//! use cachesim::traits::{Access, CoreCache};
//!
//! let mut cache = LruCache::new(2);
//! cache.access(&1);
//! cache.access(&2);
//! cache.access(&1); // 2 is now LRU
//! cache.access(&3);
//!
//! assert!(cache.contains(&1));
//! assert!(!cache.contains(&2));
//! assert_eq!(cache.peek_lru(), Some(&1));
//! ```

use rustc_hash::FxHashMap;

use crate::ds::{IntrusiveList, SlotId};
use crate::error::{ConfigError, InvariantError};
use crate::metrics::snapshot::PolicySnapshot;
use crate::traits::{Access, CacheKey, CoreCache};

#[derive(Debug)]
pub struct LruCache<K> {
    index: FxHashMap<K, SlotId>,
    order: IntrusiveList<K>,
    capacity: usize,
}

impl<K: CacheKey> LruCache<K> {
    /// Creates an LRU cache. A capacity of 0 admits nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            order: IntrusiveList::with_capacity(capacity),
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

    /// Least recently used key, the next eviction victim.
    pub fn peek_lru(&self) -> Option<&K> {
        self.order.back()
    }

    /// Resident keys from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }
}

impl<K: CacheKey> CoreCache<K> for LruCache<K> {
    fn access(&mut self, key: &K) -> Access {
        if let Some(&id) = self.index.get(key) {
            self.order.move_to_front(id);
            return Access::Hit;
        }
        if self.capacity == 0 {
            return Access::Miss;
        }

        if self.order.len() >= self.capacity
            && let Some(victim) = self.order.pop_back()
        {
            self.index.remove(&victim);
        }
        let id = self.order.push_front(key.clone());
        self.index.insert(key.clone(), id);
        Access::Miss
    }

    fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.index.len() != self.order.len() {
            return Err(InvariantError::new(format!(
                "LRU index has {} keys, list has {}",
                self.index.len(),
                self.order.len()
            )));
        }
        if self.order.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "LRU holds {} keys over capacity {}",
                self.order.len(),
                self.capacity
            )));
        }
        self.order.check_links()?;
        for (key, &id) in &self.index {
            if self.order.get(id) != Some(key) {
                return Err(InvariantError::new(format!(
                    "LRU index entry {key:?} points at a stale node"
                )));
            }
        }
        Ok(())
    }

    fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot::Lru {
            resident: self.order.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lru_first_key_misses_after_capacity_plus_one_distinct() {
        let capacity = 4;
        let mut cache = LruCache::new(capacity);
        for k in 0..=capacity as u32 {
            assert_eq!(cache.access(&k), Access::Miss);
        }
        assert_eq!(cache.access(&0), Access::Miss);
        assert!(cache.check_invariants().is_ok());
    }

    #[test]
    fn lru_hit_refreshes_recency() {
        let mut cache = LruCache::new(3);
        cache.access(&"a");
        cache.access(&"b");
        cache.access(&"c");
        assert_eq!(cache.access(&"a"), Access::Hit);

        assert_eq!(
            cache.iter().copied().collect::<Vec<_>>(),
            vec!["a", "c", "b"]
        );
        cache.access(&"d");
        assert!(!cache.contains(&"b"));
        assert!(cache.contains(&"a"));
    }

    #[test]
    fn lru_zero_capacity_rejected_by_try_new() {
        assert!(matches!(
            LruCache::<u8>::try_new(0),
            Err(ConfigError::InvalidCapacity { capacity: 0, minimum: 1 })
        ));
        let mut cache = LruCache::new(0);
        assert_eq!(cache.access(&1u8), Access::Miss);
        assert_eq!(cache.len(), 0);
    }
}
