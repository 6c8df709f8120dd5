//! Belady's optimal (OPT) replacement policy.
//!
//! OPT is clairvoyant: it is built from the complete request sequence and,
//! on a miss at capacity, evicts the resident key whose next request lies
//! farthest in the future. A key that never recurs is evicted first; among
//! several such keys the one admitted earliest goes first.
//!
//! Unlike the other policies OPT cannot run online. It must be fed exactly
//! the sequence it was built from, in order; [`CoreCache::validate`] rejects
//! any other key with [`AccessError::UnforeseenKey`]. Its hit count is an
//! upper bound for every other policy on the same sequence and capacity.
//!
//! ## Architecture
//!
//! ```text
//!   requests:  [ a  b  a  c  b  d ]        next_use[i]: index of the next
//!   next_use:  [ 2  4  ∞  ∞  ∞  ∞ ]        request for the same key (∞ = never)
//!                    ▲
//!                  cursor
//!
//!   order: BTreeMap<(Reverse(next_use), admitted), K>
//!          first entry = farthest next use, then earliest admission
//! ```
//!
//! `next_use` is built once by a reverse scan; each access is O(log n).
//!
//! ## Example
//!
//! ```
//! use cachesim::policy::opt::OptCache;
//! use cachesim::traits::{Access, CoreCache};
//!
//! let requests = [1, 2, 1, 3, 2];
//! let mut cache = OptCache::try_new(2, &requests).unwrap();
//! let outcomes: Vec<_> = requests.iter().map(|k| cache.access(k)).collect();
//! assert_eq!(
//!     outcomes,
//!     [Access::Miss, Access::Miss, Access::Hit, Access::Miss, Access::Hit]
//! );
//! ```

use std::cmp::Reverse;
use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::error::{AccessError, ConfigError, InvariantError};
use crate::metrics::snapshot::PolicySnapshot;
use crate::traits::{Access, CacheKey, CoreCache};

const NEVER: usize = usize::MAX;

type Rank = (Reverse<usize>, u64);

#[derive(Debug)]
pub struct OptCache<K> {
    requests: Vec<K>,
    next_use: Vec<usize>,
    cursor: usize,
    resident: FxHashMap<K, Rank>,
    order: BTreeMap<Rank, K>,
    admitted: u64,
    capacity: usize,
}

impl<K: CacheKey> OptCache<K> {
    /// Builds an OPT cache primed with the full request sequence.
    pub fn try_new(capacity: usize, requests: &[K]) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidCapacity {
                capacity,
                minimum: 1,
            });
        }
        Ok(Self {
            requests: requests.to_vec(),
            next_use: next_use_table(requests),
            cursor: 0,
            resident: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            order: BTreeMap::new(),
            admitted: 0,
            capacity,
        })
    }

    /// Index of the next request this cache expects.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Length of the primed sequence.
    pub fn horizon(&self) -> usize {
        self.requests.len()
    }

    /// Index of the next request for `key` after the current position, if
    /// the key is resident and recurs.
    pub fn next_use(&self, key: &K) -> Option<usize> {
        let &(Reverse(next), _) = self.resident.get(key)?;
        (next != NEVER).then_some(next)
    }

    fn upcoming_use(&self, key: &K) -> usize {
        match self.requests.get(self.cursor) {
            Some(expected) if expected == key => self.next_use[self.cursor],
            _ => NEVER,
        }
    }
}

/// For each position, the position of the next request for the same key.
fn next_use_table<K: CacheKey>(requests: &[K]) -> Vec<usize> {
    let mut next_use = vec![NEVER; requests.len()];
    let mut seen: FxHashMap<&K, usize> = FxHashMap::default();
    for (idx, key) in requests.iter().enumerate().rev() {
        if let Some(later) = seen.insert(key, idx) {
            next_use[idx] = later;
        }
    }
    next_use
}

impl<K: CacheKey> CoreCache<K> for OptCache<K> {
    fn access(&mut self, key: &K) -> Access {
        let next = self.upcoming_use(key);
        self.cursor += 1;

        if let Some(rank) = self.resident.get_mut(key) {
            let old = *rank;
            rank.0 = Reverse(next);
            let new = *rank;
            if let Some(k) = self.order.remove(&old) {
                self.order.insert(new, k);
            }
            return Access::Hit;
        }
        if self.capacity == 0 {
            return Access::Miss;
        }

        if self.resident.len() >= self.capacity
            && let Some((_, victim)) = self.order.pop_first()
        {
            self.resident.remove(&victim);
        }
        let rank = (Reverse(next), self.admitted);
        self.admitted += 1;
        self.resident.insert(key.clone(), rank);
        self.order.insert(rank, key.clone());
        Access::Miss
    }

    fn contains(&self, key: &K) -> bool {
        self.resident.contains_key(key)
    }

    fn len(&self) -> usize {
        self.resident.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn validate(&self, key: &K) -> Result<(), AccessError> {
        if !key.is_well_formed() {
            return Err(AccessError::MalformedKey);
        }
        match self.requests.get(self.cursor) {
            Some(expected) if expected == key => Ok(()),
            _ => Err(AccessError::UnforeseenKey {
                position: self.cursor,
            }),
        }
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.resident.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "OPT holds {} keys over capacity {}",
                self.resident.len(),
                self.capacity
            )));
        }
        if self.order.len() != self.resident.len() {
            return Err(InvariantError::new(format!(
                "OPT order has {} entries, {} resident",
                self.order.len(),
                self.resident.len()
            )));
        }
        for (key, rank) in &self.resident {
            if self.order.get(rank) != Some(key) {
                return Err(InvariantError::new(format!(
                    "OPT rank for {key:?} missing from eviction order"
                )));
            }
            let Reverse(next) = rank.0;
            if next != NEVER && (next < self.cursor || self.requests.get(next) != Some(key)) {
                return Err(InvariantError::new(format!(
                    "OPT next use {next} for {key:?} is not a future request"
                )));
            }
        }
        Ok(())
    }

    fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot::Opt {
            resident: self.resident.len(),
            cursor: self.cursor,
            horizon: self.requests.len(),
        }
    }
}
