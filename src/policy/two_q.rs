//! Two-Queue (2Q) replacement policy.
//!
//! Separates first-time keys from keys that have shown repeat interest, so a
//! one-pass scan cannot flush the hot set.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           TwoQCache<K> Layout                           │
//! │                                                                         │
//! │   index: FxHashMap<K, Slot>   (resident keys only)                      │
//! │                                                                         │
//! │   A1in (FIFO, a1in_cap)             Am (LRU, am_cap)                    │
//! │   ┌──────────────────────┐          ┌──────────────────────┐            │
//! │   │ front          back  │          │ MRU             LRU  │            │
//! │   │ [b] ◄──► [c] ◄──► [d]│          │ [x] ◄──► [y] ◄──► [z]│            │
//! │   │ evict          admit │          │ promote        evict │            │
//! │   └──────────┬───────────┘          └──────────▲───────────┘            │
//! │              │ evicted keys                    │ ghost hit              │
//! │              ▼                                 │                        │
//! │   A1out (ghost FIFO, a1out_cap) ───────────────┘                        │
//! │   keys only, not resident                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Access Rules
//!
//! | Key found in | Result | Effect                                              |
//! |--------------|--------|-----------------------------------------------------|
//! | Am           | hit    | move to Am MRU                                      |
//! | A1in         | hit    | none; A1in stays in admission order                 |
//! | A1out        | miss   | drop from A1out; evict Am LRU if full; admit to Am  |
//! | nowhere      | miss   | if A1in full, its oldest moves to A1out; admit to A1in |
//!
//! Am evictions are discarded without a ghost. Resident keys never exceed
//! `capacity`. At capacity 1 both queues share the single slot: admitting to
//! one queue first evicts the resident key of the other.
//!
//! ## Example Usage
//!
//! ```
//! use cachesim::policy::two_q::{TwoQCache, TwoQConfig};
//! use cachesim::traits::{Access, CoreCache};
//!
//! // 4 slots: 1 for A1in, 3 for Am.
//! let mut cache = TwoQCache::try_new(4, TwoQConfig::default()).unwrap();
//! for key in ["a", "b", "c"] {
//!     cache.access(&key);
//! }
//! // "a" was pushed out of A1in into A1out; its return promotes it.
//! assert_eq!(cache.access(&"a"), Access::Miss);
//! assert!(cache.in_main(&"a"));
//! ```
//!
//! ## References
//!
//! - Johnson & Shasha, "2Q: A Low Overhead High Performance Buffer Management
//!   Replacement Algorithm", VLDB 1994

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::ds::{GhostList, IntrusiveList, SlotId};
use crate::error::{ConfigError, InvariantError};
use crate::metrics::snapshot::PolicySnapshot;
use crate::traits::{Access, CacheKey, CoreCache};

/// Partition parameters for [`TwoQCache`].
///
/// `a1in_fraction` of the capacity (rounded, at least one slot, leaving at
/// least one slot for Am when there are two or more) goes to A1in. A1out remembers
/// `a1out_fraction * capacity` ghosts (rounded, at least one).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TwoQConfig {
    pub a1in_fraction: f64,
    pub a1out_fraction: f64,
}

impl Default for TwoQConfig {
    fn default() -> Self {
        Self {
            a1in_fraction: 0.25,
            a1out_fraction: 0.5,
        }
    }
}

impl TwoQConfig {
    /// Resolves the fractions into `(a1in_slots, a1out_slots)` for `capacity`.
    pub fn partition(&self, capacity: usize) -> Result<(usize, usize), ConfigError> {
        check_fraction("a1in_fraction", self.a1in_fraction)?;
        check_fraction("a1out_fraction", self.a1out_fraction)?;
        if capacity == 0 {
            return Err(ConfigError::InvalidCapacity {
                capacity,
                minimum: 1,
            });
        }

        let a1in = ((capacity as f64 * self.a1in_fraction).round() as usize)
            .clamp(1, max_a1in(capacity));
        let a1out = ((capacity as f64 * self.a1out_fraction).round() as usize).max(1);
        Ok((a1in, a1out))
    }
}

/// Largest A1in size that still leaves Am a slot of its own.
fn max_a1in(capacity: usize) -> usize {
    capacity.saturating_sub(1).max(1)
}

fn check_fraction(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidFraction { name, value })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    A1in(SlotId),
    Am(SlotId),
}

#[derive(Debug)]
pub struct TwoQCache<K> {
    index: FxHashMap<K, Slot>,
    a1in: IntrusiveList<K>,
    am: IntrusiveList<K>,
    a1out: GhostList<K>,
    a1in_cap: usize,
    am_cap: usize,
    capacity: usize,
}

impl<K: CacheKey> TwoQCache<K> {
    /// Creates a 2Q cache partitioned by `config`.
    pub fn try_new(capacity: usize, config: TwoQConfig) -> Result<Self, ConfigError> {
        let (a1in, a1out) = config.partition(capacity)?;
        Self::with_partition(capacity, a1in, a1out)
    }

    /// Creates a 2Q cache with explicit A1in and A1out sizes.
    ///
    /// Am receives `capacity - a1in_slots`. With capacity 1, A1in takes the
    /// only slot and Am borrows it on promotion.
    pub fn with_partition(
        capacity: usize,
        a1in_slots: usize,
        a1out_slots: usize,
    ) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidCapacity {
                capacity,
                minimum: 1,
            });
        }
        if a1in_slots == 0 || a1in_slots > max_a1in(capacity) {
            return Err(ConfigError::InvalidSlots {
                name: "a1in_slots",
                value: a1in_slots,
                max: max_a1in(capacity),
            });
        }
        if a1out_slots == 0 {
            return Err(ConfigError::InvalidSlots {
                name: "a1out_slots",
                value: a1out_slots,
                max: usize::MAX,
            });
        }

        let am_cap = (capacity - a1in_slots).max(1);
        Ok(Self {
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            a1in: IntrusiveList::with_capacity(a1in_slots),
            am: IntrusiveList::with_capacity(am_cap),
            a1out: GhostList::new(a1out_slots),
            a1in_cap: a1in_slots,
            am_cap,
            capacity,
        })
    }

    pub fn a1in_len(&self) -> usize {
        self.a1in.len()
    }

    pub fn am_len(&self) -> usize {
        self.am.len()
    }

    pub fn a1out_len(&self) -> usize {
        self.a1out.len()
    }

    pub fn a1in_capacity(&self) -> usize {
        self.a1in_cap
    }

    pub fn am_capacity(&self) -> usize {
        self.am_cap
    }

    pub fn a1out_capacity(&self) -> usize {
        self.a1out.capacity()
    }

    /// Returns `true` if `key` is resident in Am.
    pub fn in_main(&self, key: &K) -> bool {
        matches!(self.index.get(key), Some(Slot::Am(_)))
    }

    /// Returns `true` if `key` is remembered in A1out.
    pub fn in_ghost(&self, key: &K) -> bool {
        self.a1out.contains(key)
    }

    fn admit_main(&mut self, key: &K) {
        if self.am.len() >= self.am_cap {
            self.evict_main();
        }
        if self.len() >= self.capacity {
            self.evict_probation();
        }
        let id = self.am.push_front(key.clone());
        self.index.insert(key.clone(), Slot::Am(id));
    }

    fn admit_probation(&mut self, key: &K) {
        if self.a1in.len() >= self.a1in_cap {
            self.evict_probation();
        }
        if self.len() >= self.capacity {
            self.evict_main();
        }
        let id = self.a1in.push_back(key.clone());
        self.index.insert(key.clone(), Slot::A1in(id));
    }

    /// Drops the Am LRU key for good.
    fn evict_main(&mut self) {
        if let Some(victim) = self.am.pop_back() {
            self.index.remove(&victim);
        }
    }

    /// Moves the oldest A1in key to A1out.
    fn evict_probation(&mut self) {
        if let Some(victim) = self.a1in.pop_front() {
            self.index.remove(&victim);
            self.a1out.record(victim);
        }
    }
}

impl<K: CacheKey> CoreCache<K> for TwoQCache<K> {
    fn access(&mut self, key: &K) -> Access {
        match self.index.get(key) {
            Some(&Slot::Am(id)) => {
                self.am.move_to_front(id);
                return Access::Hit;
            }
            Some(Slot::A1in(_)) => return Access::Hit,
            None => {}
        }

        if self.a1out.remove(key) {
            self.admit_main(key);
        } else {
            self.admit_probation(key);
        }
        Access::Miss
    }

    fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    fn len(&self) -> usize {
        self.a1in.len() + self.am.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "2Q holds {} keys over capacity {}",
                self.len(),
                self.capacity
            )));
        }
        if self.a1in.len() > self.a1in_cap {
            return Err(InvariantError::new(format!(
                "A1in holds {} over its quota {}",
                self.a1in.len(),
                self.a1in_cap
            )));
        }
        if self.am.len() > self.am_cap {
            return Err(InvariantError::new(format!(
                "Am holds {} over its quota {}",
                self.am.len(),
                self.am_cap
            )));
        }
        if self.index.len() != self.len() {
            return Err(InvariantError::new(format!(
                "2Q index has {} keys, queues hold {}",
                self.index.len(),
                self.len()
            )));
        }
        self.a1in.check_links()?;
        self.am.check_links()?;
        self.a1out.check()?;
        for (key, slot) in &self.index {
            let found = match *slot {
                Slot::A1in(id) => self.a1in.get(id),
                Slot::Am(id) => self.am.get(id),
            };
            if found != Some(key) {
                return Err(InvariantError::new(format!(
                    "2Q index entry {key:?} points at a stale node"
                )));
            }
            if self.a1out.contains(key) {
                return Err(InvariantError::new(format!(
                    "2Q key {key:?} is both resident and a ghost"
                )));
            }
        }
        Ok(())
    }

    fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot::TwoQ {
            a1in: self.a1in.len(),
            a1out: self.a1out.len(),
            am: self.am.len(),
        }
    }
}
