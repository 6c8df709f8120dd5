//! Doubly linked list whose nodes live in a [`SlotArena`].
//!
//! Pushing returns the node's [`SlotId`]; callers keep it in their own index
//! and later relink or remove the node in O(1) without a search.
//!
//! ```text
//!   head ─► [id_4] ◄──► [id_0] ◄──► [id_2] ◄── tail
//!            front                   back
//! ```
//!
//! LRU and 2Q's Am treat the front as most recently used. 2Q's A1in and the
//! ghost list use it as a queue.

use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::InvariantError;

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

#[derive(Debug, Clone, Copy)]
enum End {
    Front,
    Back,
}

#[derive(Debug)]
pub struct IntrusiveList<T> {
    nodes: SlotArena<Node<T>>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
}

impl<T> IntrusiveList<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: SlotArena::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn back(&self) -> Option<&T> {
        self.get(self.tail?)
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.nodes.get(id).map(|node| &node.value)
    }

    /// Values from front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    pub fn push_front(&mut self, value: T) -> SlotId {
        self.push(value, End::Front)
    }

    pub fn push_back(&mut self, value: T) -> SlotId {
        self.push(value, End::Back)
    }

    pub fn pop_front(&mut self) -> Option<T> {
        self.remove(self.head?)
    }

    pub fn pop_back(&mut self) -> Option<T> {
        self.remove(self.tail?)
    }

    /// Unlinks node `id` and returns its value; `None` for a stale id.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        self.unlink(id)?;
        self.nodes.remove(id).map(|node| node.value)
    }

    /// Relinks `id` at the front. Returns `false` for a stale id.
    pub fn move_to_front(&mut self, id: SlotId) -> bool {
        if self.head == Some(id) {
            return true;
        }
        if self.unlink(id).is_none() {
            return false;
        }
        self.link(id, End::Front);
        true
    }

    /// Walks the list from the front and verifies every back pointer, the
    /// tail, and the recorded length.
    pub fn check_links(&self) -> Result<(), InvariantError> {
        let mut walked = 0usize;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let node = self
                .nodes
                .get(id)
                .ok_or_else(|| InvariantError::new(format!("list links to freed node {id:?}")))?;
            if node.prev != prev {
                return Err(InvariantError::new(format!(
                    "list node {id:?} points back to {:?}, expected {prev:?}",
                    node.prev
                )));
            }
            walked += 1;
            if walked > self.len() {
                return Err(InvariantError::new("list walk does not terminate"));
            }
            prev = Some(id);
            cursor = node.next;
        }
        if walked != self.len() || self.tail != prev {
            return Err(InvariantError::new(format!(
                "list walk reached {walked} nodes ending at {prev:?}; recorded {} ending at {:?}",
                self.len(),
                self.tail
            )));
        }
        Ok(())
    }

    fn push(&mut self, value: T, end: End) -> SlotId {
        let id = self.nodes.insert(Node {
            value,
            prev: None,
            next: None,
        });
        self.link(id, end);
        id
    }

    // `id` must be allocated and currently unlinked.
    fn link(&mut self, id: SlotId, end: End) {
        let neighbour = match end {
            End::Front => self.head,
            End::Back => self.tail,
        };
        if let Some(node) = self.nodes.get_mut(id) {
            match end {
                End::Front => node.next = neighbour,
                End::Back => node.prev = neighbour,
            }
        }
        match neighbour.and_then(|n| self.nodes.get_mut(n)) {
            Some(other) => match end {
                End::Front => other.prev = Some(id),
                End::Back => other.next = Some(id),
            },
            None => {
                self.head = Some(id);
                self.tail = Some(id);
            }
        }
        match end {
            End::Front => self.head = Some(id),
            End::Back => self.tail = Some(id),
        }
    }

    fn unlink(&mut self, id: SlotId) -> Option<()> {
        let node = self.nodes.get_mut(id)?;
        let (prev, next) = (node.prev.take(), node.next.take());

        match prev.and_then(|p| self.nodes.get_mut(p)) {
            Some(before) => before.next = next,
            None => self.head = next,
        }
        match next.and_then(|n| self.nodes.get_mut(n)) {
            Some(after) => after.prev = prev,
            None => self.tail = prev,
        }
        Some(())
    }
}

pub struct Iter<'a, T> {
    list: &'a IntrusiveList<T>,
    cursor: Option<SlotId>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.nodes.get(self.cursor?)?;
        self.cursor = node.next;
        Some(&node.value)
    }
}
