//! Bounded memory of recently evicted keys.
//!
//! A ghost is a key the cache no longer holds but still remembers having
//! seen. 2Q's A1out is a `GhostList`: keys pushed out of A1in are recorded
//! here, and a later miss on one of them promotes it straight to Am.
//!
//! The newest ghost sits at the front; once `capacity` ghosts are held, each
//! new record drops the oldest from the back.

use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;
use crate::error::InvariantError;

#[derive(Debug)]
pub struct GhostList<K> {
    order: IntrusiveList<K>,
    slots: FxHashMap<K, SlotId>,
    capacity: usize,
}

impl<K> GhostList<K>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            order: IntrusiveList::with_capacity(capacity),
            slots: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    /// Remembers `key` as the newest ghost and returns the ghost it pushed
    /// out, if any. Recording a key already held only refreshes it.
    pub fn record(&mut self, key: K) -> Option<K> {
        if self.capacity == 0 {
            return None;
        }
        if let Some(&id) = self.slots.get(&key) {
            self.order.move_to_front(id);
            return None;
        }

        let dropped = if self.order.len() >= self.capacity {
            self.order.pop_back()
        } else {
            None
        };
        if let Some(old) = &dropped {
            self.slots.remove(old);
        }
        let id = self.order.push_front(key.clone());
        self.slots.insert(key, id);
        dropped
    }

    /// Forgets `key`; returns `true` if it was a ghost.
    pub fn remove(&mut self, key: &K) -> bool {
        match self.slots.remove(key) {
            Some(id) => self.order.remove(id).is_some(),
            None => false,
        }
    }

    /// Checks the bound, the list links and that every indexed key sits on
    /// the node its slot names.
    pub fn check(&self) -> Result<(), InvariantError> {
        if self.order.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "ghost list holds {} keys over capacity {}",
                self.order.len(),
                self.capacity
            )));
        }
        if self.slots.len() != self.order.len() {
            return Err(InvariantError::new(format!(
                "ghost index has {} keys, list has {}",
                self.slots.len(),
                self.order.len()
            )));
        }
        self.order.check_links()?;
        for (key, &id) in &self.slots {
            if self.order.get(id) != Some(key) {
                return Err(InvariantError::new(format!(
                    "ghost {key:?} indexed at a node holding another key"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oldest_ghost_is_dropped_when_full() {
        let mut ghosts = GhostList::new(2);
        assert_eq!(ghosts.record("a"), None);
        assert_eq!(ghosts.record("b"), None);
        assert_eq!(ghosts.record("c"), Some("a"));

        assert!(!ghosts.contains(&"a"));
        assert!(ghosts.contains(&"b"));
        assert!(ghosts.contains(&"c"));
        assert!(ghosts.check().is_ok());
    }

    #[test]
    fn recording_again_refreshes_age() {
        let mut ghosts = GhostList::new(2);
        ghosts.record(1);
        ghosts.record(2);
        ghosts.record(1);
        assert_eq!(ghosts.record(3), Some(2));
        assert!(ghosts.contains(&1));
        assert_eq!(ghosts.len(), 2);
    }

    #[test]
    fn zero_capacity_remembers_nothing() {
        let mut ghosts = GhostList::new(0);
        assert_eq!(ghosts.record("a"), None);
        assert!(ghosts.is_empty());
        assert!(!ghosts.contains(&"a"));
        assert!(ghosts.check().is_ok());
    }

    #[test]
    fn remove_frees_room() {
        let mut ghosts = GhostList::new(2);
        ghosts.record('x');
        ghosts.record('y');
        assert!(ghosts.remove(&'x'));
        assert!(!ghosts.remove(&'x'));

        assert_eq!(ghosts.record('z'), None);
        assert_eq!(ghosts.capacity(), 2);
        assert!(ghosts.check().is_ok());
    }
}
