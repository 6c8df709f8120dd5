//! Adaptive Replacement Cache (ARC) replacement policy.
//!
//! Balances recency against frequency by keeping two resident lists and two
//! ghost lists, and moving a target size `p` for T1 toward whichever side's
//! ghosts are being re-requested.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ArcCache<K> Layout                            │
//! │                                                                         │
//! │   index: FxHashMap<K, SlotId>      arena: SlotArena<Node<K>>            │
//! │   (every key in T1, T2, B1, B2)    Node { prev, next, list, key }       │
//! │                                                                         │
//! │   T1 (resident, seen once)            T2 (resident, seen again)         │
//! │   MRU ─► [..] ◄──► [..] ◄─ LRU        MRU ─► [..] ◄──► [..] ◄─ LRU      │
//! │                      │                                   │              │
//! │                      ▼ replace                           ▼ replace      │
//! │   B1 (ghost of T1, ≤ c)               B2 (ghost of T2, ≤ c)             │
//! │                                                                         │
//! │   p ∈ [0, c]: target size of T1                                         │
//! │   • B1 ghost hit → p += max(1, |B2| / |B1|)                             │
//! │   • B2 ghost hit → p -= max(1, |B1| / |B2|)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All four lists share one arena, so moving a key between lists relinks a
//! node and never reallocates it.
//!
//! ## Access Flow
//!
//! ```text
//!   key in T1 or T2  → hit;  move to T2 MRU
//!   key in B1        → miss; raise p; REPLACE; move to T2 MRU
//!   key in B2        → miss; lower p; REPLACE(in B2); move to T2 MRU
//!   key nowhere      → miss;
//!       |T1|+|B1| = c:   |T1| < c → drop B1 LRU, REPLACE
//!                        else     → drop T1 LRU (no ghost)
//!       otherwise, total ≥ c:  drop B2 LRU if total = 2c, REPLACE
//!       admit to T1 MRU
//!
//!   REPLACE(in_b2):
//!       T1 non-empty and (|T1| > p or (in_b2 and |T1| = p)) → T1 LRU to B1
//!       else T2 LRU to B2 (T1 LRU if T2 is empty)
//! ```
//!
//! ## Invariants
//!
//! - `|T1| + |T2| ≤ c`
//! - `|T1| + |B1| ≤ c`
//! - `|T1| + |T2| + |B1| + |B2| ≤ 2c`
//! - `0 ≤ p ≤ c`
//!
//! ## Example Usage
//!
//! ```
//! use cachesim::policy::arc::ArcCache;
//! use cachesim::traits::{Access, CoreCache};
//!
//! let mut cache = ArcCache::new(2);
//! cache.access(&1);
//! cache.access(&2);
//! assert_eq!(cache.access(&1), Access::Hit); // 1 moves to T2
//! cache.access(&3);                           // 2 leaves T1 for B1
//! assert_eq!(cache.access(&2), Access::Miss); // ghost hit raises p
//! assert_eq!(cache.p(), 1);
//! ```
//!
//! ## References
//!
//! - Megiddo & Modha, "ARC: A Self-Tuning, Low Overhead Replacement Cache",
//!   FAST 2003

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::ds::{SlotArena, SlotId};
use crate::error::{ConfigError, InvariantError};
use crate::metrics::snapshot::PolicySnapshot;
use crate::traits::{Access, CacheKey, CoreCache};

/// Which list a node belongs to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum ListKind {
    T1,
    T2,
    B1,
    B2,
}

impl ListKind {
    const ALL: [ListKind; 4] = [ListKind::T1, ListKind::T2, ListKind::B1, ListKind::B2];

    fn slot(self) -> usize {
        match self {
            ListKind::T1 => 0,
            ListKind::T2 => 1,
            ListKind::B1 => 2,
            ListKind::B2 => 3,
        }
    }
}

#[derive(Debug)]
struct Node<K> {
    prev: Option<SlotId>,
    next: Option<SlotId>,
    list: ListKind,
    key: K,
}

/// Head is MRU, tail is LRU.
#[derive(Debug, Default, Clone, Copy)]
struct Lane {
    head: Option<SlotId>,
    tail: Option<SlotId>,
    len: usize,
}

#[derive(Debug)]
pub struct ArcCache<K> {
    index: FxHashMap<K, SlotId>,
    arena: SlotArena<Node<K>>,
    lanes: [Lane; 4],
    p: usize,
    capacity: usize,
}

impl<K: CacheKey> ArcCache<K> {
    /// Creates an ARC cache. `p` starts at 0. A capacity of 0 admits nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            index: FxHashMap::with_capacity_and_hasher(2 * capacity, Default::default()),
            arena: SlotArena::with_capacity(2 * capacity),
            lanes: [Lane::default(); 4],
            p: 0,
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

    /// Current target size of T1.
    pub fn p(&self) -> usize {
        self.p
    }

    pub fn t1_len(&self) -> usize {
        self.lane(ListKind::T1).len
    }

    pub fn t2_len(&self) -> usize {
        self.lane(ListKind::T2).len
    }

    pub fn b1_len(&self) -> usize {
        self.lane(ListKind::B1).len
    }

    pub fn b2_len(&self) -> usize {
        self.lane(ListKind::B2).len
    }

    /// Returns `true` if `key` is remembered in B1 or B2.
    pub fn is_ghost(&self, key: &K) -> bool {
        matches!(self.list_of(key), Some(ListKind::B1 | ListKind::B2))
    }

    fn list_of(&self, key: &K) -> Option<ListKind> {
        let id = *self.index.get(key)?;
        self.arena.get(id).map(|node| node.list)
    }

    #[inline]
    fn lane(&self, kind: ListKind) -> &Lane {
        &self.lanes[kind.slot()]
    }

    #[inline]
    fn lane_mut(&mut self, kind: ListKind) -> &mut Lane {
        &mut self.lanes[kind.slot()]
    }

    fn attach_head(&mut self, id: SlotId, kind: ListKind) {
        let old_head = self.lane(kind).head;
        let Some(node) = self.arena.get_mut(id) else {
            return;
        };
        node.prev = None;
        node.next = old_head;
        node.list = kind;

        match old_head {
            Some(head) => {
                if let Some(head_node) = self.arena.get_mut(head) {
                    head_node.prev = Some(id);
                }
            }
            None => self.lane_mut(kind).tail = Some(id),
        }
        let lane = self.lane_mut(kind);
        lane.head = Some(id);
        lane.len += 1;
    }

    fn detach(&mut self, id: SlotId) {
        let Some(node) = self.arena.get(id) else {
            return;
        };
        let (prev, next, kind) = (node.prev, node.next, node.list);

        match prev {
            Some(p) => {
                if let Some(prev_node) = self.arena.get_mut(p) {
                    prev_node.next = next;
                }
            }
            None => self.lane_mut(kind).head = next,
        }
        match next {
            Some(n) => {
                if let Some(next_node) = self.arena.get_mut(n) {
                    next_node.prev = prev;
                }
            }
            None => self.lane_mut(kind).tail = prev,
        }
        self.lane_mut(kind).len -= 1;
    }

    /// Unlinks the LRU node of `kind` and returns its id.
    fn pop_lru(&mut self, kind: ListKind) -> Option<SlotId> {
        let id = self.lane(kind).tail?;
        self.detach(id);
        Some(id)
    }

    /// Forgets a node that is already unlinked.
    fn discard(&mut self, id: SlotId) {
        if let Some(node) = self.arena.remove(id) {
            self.index.remove(&node.key);
        }
    }

    /// Moves the LRU of resident list `from` into ghost list `to`, trimming
    /// the ghost list back to `capacity`.
    fn demote(&mut self, from: ListKind, to: ListKind) {
        let Some(id) = self.pop_lru(from) else {
            return;
        };
        self.attach_head(id, to);
        if self.lane(to).len > self.capacity
            && let Some(old) = self.pop_lru(to)
        {
            self.discard(old);
        }
    }

    fn replace(&mut self, in_b2: bool) {
        let t1 = self.t1_len();
        if t1 > 0 && (t1 > self.p || (in_b2 && t1 == self.p)) {
            self.demote(ListKind::T1, ListKind::B1);
        } else if self.t2_len() > 0 {
            self.demote(ListKind::T2, ListKind::B2);
        } else if t1 > 0 {
            self.demote(ListKind::T1, ListKind::B1);
        }
    }

    fn make_room_for_new(&mut self) {
        let c = self.capacity;
        let t1_b1 = self.t1_len() + self.b1_len();
        if t1_b1 >= c {
            if self.t1_len() < c {
                if let Some(id) = self.pop_lru(ListKind::B1) {
                    self.discard(id);
                }
                self.replace(false);
            } else if let Some(id) = self.pop_lru(ListKind::T1) {
                self.discard(id);
            }
        } else {
            let total = t1_b1 + self.t2_len() + self.b2_len();
            if total >= c {
                if total >= 2 * c
                    && let Some(id) = self.pop_lru(ListKind::B2)
                {
                    self.discard(id);
                }
                self.replace(false);
            }
        }
    }

    fn adapt(&mut self, ghost: ListKind) {
        let (b1, b2) = (self.b1_len(), self.b2_len());
        let before = self.p;
        match ghost {
            ListKind::B1 => {
                let delta = if b1 > 0 { (b2 / b1).max(1) } else { 1 };
                self.p = (self.p + delta).min(self.capacity);
            }
            ListKind::B2 => {
                let delta = if b2 > 0 { (b1 / b2).max(1) } else { 1 };
                self.p = self.p.saturating_sub(delta);
            }
            ListKind::T1 | ListKind::T2 => return,
        }
        trace!(from = before, to = self.p, ?ghost, b1, b2, "arc target adapted");
    }
}

impl<K: CacheKey> CoreCache<K> for ArcCache<K> {
    fn access(&mut self, key: &K) -> Access {
        if self.capacity == 0 {
            return Access::Miss;
        }

        if let Some(&id) = self.index.get(key)
            && let Some(list) = self.arena.get(id).map(|node| node.list)
        {
            return match list {
                ListKind::T1 | ListKind::T2 => {
                    self.detach(id);
                    self.attach_head(id, ListKind::T2);
                    Access::Hit
                }
                ghost @ (ListKind::B1 | ListKind::B2) => {
                    self.adapt(ghost);
                    self.detach(id);
                    self.replace(ghost == ListKind::B2);
                    self.attach_head(id, ListKind::T2);
                    Access::Miss
                }
            };
        }

        self.make_room_for_new();
        let id = self.arena.insert(Node {
            prev: None,
            next: None,
            list: ListKind::T1,
            key: key.clone(),
        });
        self.index.insert(key.clone(), id);
        self.attach_head(id, ListKind::T1);
        Access::Miss
    }

    fn contains(&self, key: &K) -> bool {
        matches!(self.list_of(key), Some(ListKind::T1 | ListKind::T2))
    }

    fn len(&self) -> usize {
        self.t1_len() + self.t2_len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        let c = self.capacity;
        let (t1, t2, b1, b2) = (self.t1_len(), self.t2_len(), self.b1_len(), self.b2_len());

        if t1 + t2 > c {
            return Err(InvariantError::new(format!(
                "ARC resident {t1}+{t2} exceeds capacity {c}"
            )));
        }
        if t1 + b1 > c {
            return Err(InvariantError::new(format!(
                "ARC |T1|+|B1| = {} exceeds capacity {c}",
                t1 + b1
            )));
        }
        if t1 + t2 + b1 + b2 > 2 * c {
            return Err(InvariantError::new(format!(
                "ARC directory holds {} keys, over 2c = {}",
                t1 + t2 + b1 + b2,
                2 * c
            )));
        }
        if self.p > c {
            return Err(InvariantError::new(format!(
                "ARC p = {} outside [0, {c}]",
                self.p
            )));
        }

        let total = t1 + t2 + b1 + b2;
        if self.index.len() != total || self.arena.len() != total {
            return Err(InvariantError::new(format!(
                "ARC index {} / arena {} disagree with list total {total}",
                self.index.len(),
                self.arena.len()
            )));
        }

        for kind in ListKind::ALL {
            let lane = self.lane(kind);
            let mut count = 0usize;
            let mut prev = None;
            let mut current = lane.head;
            while let Some(id) = current {
                let node = self.arena.get(id).ok_or_else(|| {
                    InvariantError::new(format!("ARC {kind:?}: stale SlotId {id:?}"))
                })?;
                if node.list != kind {
                    return Err(InvariantError::new(format!(
                        "ARC node {:?} linked in {kind:?} but tagged {:?}",
                        node.key, node.list
                    )));
                }
                if node.prev != prev {
                    return Err(InvariantError::new(format!(
                        "ARC {kind:?}: node {:?} prev pointer inconsistent",
                        node.key
                    )));
                }
                if self.index.get(&node.key) != Some(&id) {
                    return Err(InvariantError::new(format!(
                        "ARC node {:?} missing from index",
                        node.key
                    )));
                }
                count += 1;
                if count > lane.len {
                    return Err(InvariantError::new(format!(
                        "ARC {kind:?} walk exceeds recorded length {}",
                        lane.len
                    )));
                }
                prev = Some(id);
                current = node.next;
            }
            if count != lane.len || lane.tail != prev {
                return Err(InvariantError::new(format!(
                    "ARC {kind:?} has {count} linked nodes, recorded {}",
                    lane.len
                )));
            }
        }
        Ok(())
    }

    fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot::Arc {
            t1: self.t1_len(),
            t2: self.t2_len(),
            b1: self.b1_len(),
            b2: self.b2_len(),
            p: self.p,
        }
    }
}
