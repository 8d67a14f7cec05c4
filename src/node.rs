use std::fmt;

/// Color of a tree node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Color {
    Red,
    Black,
}

/// Handle to a node linked into an [RbTree][crate::RbTree].
///
/// Handles are cheap to copy and stay valid until the node they refer to
/// is removed from its tree. A handle whose node has been removed is
/// detected as stale, even if its slot got reused by a later insert.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct NodeId {
    pub(crate) index: usize,
    pub(crate) stamp: u64,
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "NodeId<{}@{}>", self.index, self.stamp)
    }
}

// Node corresponds to a single entry in RbTree instance.
pub(crate) struct Node<T> {
    pub payload: T,
    pub color: Color,             // store: black or red
    pub parent: Option<NodeId>,   // lookup: parent, never owns
    pub left: Option<NodeId>,     // store: left child
    pub right: Option<NodeId>,    // store: right child
}

impl<T> Node<T> {
    /// New nodes are always linked red.
    pub fn new(payload: T, parent: Option<NodeId>) -> Node<T> {
        Node {
            payload,
            color: Color::Red,
            parent,
            left: None,
            right: None,
        }
    }

    #[inline]
    pub fn set_red(&mut self) {
        self.color = Color::Red
    }

    #[inline]
    pub fn set_black(&mut self) {
        self.color = Color::Black
    }

    #[inline]
    pub fn is_black(&self) -> bool {
        self.color == Color::Black
    }

    #[inline]
    pub fn is_red(&self) -> bool {
        self.color == Color::Red
    }

    /// Return the only child of this node, if it has at most one.
    #[inline]
    pub fn as_only_child(&self) -> Option<NodeId> {
        self.left.or(self.right)
    }

    #[inline]
    pub fn has_two_children(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }
}

#[cfg(test)]
#[path = "node_test.rs"]
mod node_test;
