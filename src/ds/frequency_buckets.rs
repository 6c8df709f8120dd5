//! Keys grouped by access count, for LFU eviction.
//!
//! Each distinct count owns an [`IntrusiveList`] of the keys that currently
//! have it, newest touch at the front. The counts themselves are kept in a
//! `BTreeMap`, so the lowest one is always the first entry and a bucket that
//! empties simply disappears.
//!
//! ```text
//!   counts: BTreeMap<u64, IntrusiveList<K>>
//!
//!     1 ─► [d] ◄──► [b]        ◄── evicted next (oldest at count 1)
//!     2 ─► [c]
//!     5 ─► [a]
//!
//!   index: FxHashMap<K, (count, SlotId)>
//! ```
//!
//! `insert` places a key at count 1, `touch` moves it to the front of
//! count + 1, and `pop_min` takes the back of the lowest bucket. Every
//! operation is O(log b) in the number of distinct counts.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;
use crate::error::InvariantError;

#[derive(Debug)]
pub struct FrequencyBuckets<K> {
    counts: BTreeMap<u64, IntrusiveList<K>>,
    index: FxHashMap<K, (u64, SlotId)>,
}

impl<K> FrequencyBuckets<K>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            counts: BTreeMap::new(),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.index.get(key).map(|&(count, _)| count)
    }

    /// Lowest count held, `None` when empty.
    pub fn min_freq(&self) -> Option<u64> {
        self.counts.first_key_value().map(|(&count, _)| count)
    }

    /// The key [`pop_min`](Self::pop_min) would return, with its count.
    pub fn peek_min(&self) -> Option<(&K, u64)> {
        let (&count, bucket) = self.counts.first_key_value()?;
        bucket.back().map(|key| (key, count))
    }

    /// Tracks `key` at count 1; returns `false` if it is already tracked.
    pub fn insert(&mut self, key: K) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        let id = self.bucket(1).push_front(key.clone());
        self.index.insert(key, (1, id));
        true
    }

    /// Bumps the count of `key` and returns the new value. Counts stop at
    /// `u64::MAX`, where a touch only refreshes the key's age.
    pub fn touch(&mut self, key: &K) -> Option<u64> {
        let (count, id) = *self.index.get(key)?;
        let owned = self.detach(count, id)?;
        let next = count.saturating_add(1);
        let id = self.bucket(next).push_front(owned);
        if let Some(slot) = self.index.get_mut(key) {
            *slot = (next, id);
        }
        Some(next)
    }

    /// Removes the key with the lowest count; among equal counts, the one
    /// inserted or touched longest ago.
    pub fn pop_min(&mut self) -> Option<(K, u64)> {
        let mut entry = self.counts.first_entry()?;
        let count = *entry.key();
        let key = entry.get_mut().pop_back()?;
        if entry.get().is_empty() {
            entry.remove();
        }
        self.index.remove(&key);
        Some((key, count))
    }

    /// Walks every bucket and checks it against the index.
    pub fn check(&self) -> Result<(), InvariantError> {
        let mut total = 0usize;
        for (&count, bucket) in &self.counts {
            if bucket.is_empty() {
                return Err(InvariantError::new(format!("bucket {count} is empty")));
            }
            bucket.check_links()?;
            for key in bucket.iter() {
                match self.index.get(key) {
                    Some(&(indexed, id)) if indexed == count && bucket.get(id) == Some(key) => {}
                    other => {
                        return Err(InvariantError::new(format!(
                            "{key:?} sits in bucket {count} but is indexed as {other:?}"
                        )));
                    }
                }
            }
            total += bucket.len();
        }
        if total != self.index.len() {
            return Err(InvariantError::new(format!(
                "buckets hold {total} keys, index has {}",
                self.index.len()
            )));
        }
        Ok(())
    }

    fn bucket(&mut self, count: u64) -> &mut IntrusiveList<K> {
        self.counts
            .entry(count)
            .or_insert_with(|| IntrusiveList::with_capacity(1))
    }

    // Takes `id` out of bucket `count`, dropping the bucket once empty.
    fn detach(&mut self, count: u64, id: SlotId) -> Option<K> {
        let bucket = self.counts.get_mut(&count)?;
        let key = bucket.remove(id)?;
        if bucket.is_empty() {
            self.counts.remove(&count);
        }
        Some(key)
    }
}
