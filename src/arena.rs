//! Node storage for a single tree.
//!
//! Nodes live in a [Slab] and refer to each other by [NodeId]. Every
//! insert stamps its slot with a fresh, monotonically increasing number
//! which is also carried by the handle, so a handle to a removed node
//! never aliases a node that later reuses the same slot.

use slab::Slab;

use std::{
    mem,
    ops::{Index, IndexMut},
};

use crate::node::{Node, NodeId};

struct Slot<T> {
    stamp: u64,
    node: Node<T>,
}

pub(crate) struct Arena<T> {
    slots: Slab<Slot<T>>,
    stamp: u64,
}

impl<T> Arena<T> {
    pub fn new() -> Arena<T> {
        Arena {
            slots: Slab::new(),
            stamp: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn insert(&mut self, node: Node<T>) -> NodeId {
        self.stamp += 1;
        let stamp = self.stamp;
        let index = self.slots.insert(Slot { stamp, node });
        NodeId { index, stamp }
    }

    pub fn remove(&mut self, id: NodeId) -> Option<Node<T>> {
        if self.contains(id) {
            Some(self.slots.remove(id.index).node)
        } else {
            None
        }
    }

    /// Remove a node the engine keeps linked, panics on a stale handle.
    pub fn take(&mut self, id: NodeId) -> Node<T> {
        match self.remove(id) {
            Some(node) => node,
            None => panic!("arena: dangling link {:?}, call the programmer", id),
        }
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.slots
            .get(id.index)
            .map_or(false, |slot| slot.stamp == id.stamp)
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node<T>> {
        match self.slots.get(id.index) {
            Some(slot) if slot.stamp == id.stamp => Some(&slot.node),
            _ => None,
        }
    }

    /// Exchange the payload of two distinct nodes, leaving their links and
    /// colors in place. Return false if either handle is stale or both
    /// refer to the same node.
    pub fn swap_payload(&mut self, a: NodeId, b: NodeId) -> bool {
        if a == b || !self.contains(a) || !self.contains(b) {
            return false;
        }
        match self.slots.get2_mut(a.index, b.index) {
            Some((x, y)) => {
                mem::swap(&mut x.node.payload, &mut y.node.payload);
                true
            }
            None => false,
        }
    }

    /// Remove every node, in slot order.
    pub fn drain(&mut self) -> impl Iterator<Item = Node<T>> + '_ {
        self.slots.drain().map(|slot| slot.node)
    }
}

// Indexing is reserved for handles the engine itself keeps linked, a stale
// handle here is a broken tree.
impl<T> Index<NodeId> for Arena<T> {
    type Output = Node<T>;

    fn index(&self, id: NodeId) -> &Node<T> {
        match self.get(id) {
            Some(node) => node,
            None => panic!("arena: dangling link {:?}, call the programmer", id),
        }
    }
}

impl<T> IndexMut<NodeId> for Arena<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut Node<T> {
        match self.slots.get_mut(id.index) {
            Some(slot) if slot.stamp == id.stamp => &mut slot.node,
            _ => panic!("arena: dangling link {:?}, call the programmer", id),
        }
    }
}

#[cfg(test)]
#[path = "arena_test.rs"]
mod arena_test;
