//! Module provide the red-black tree engine by [RbTree] type.
//!
//! RbTree is a classic, parent linked, [red-black][wiki-rbtree] tree.
//!
//! - Payload type and its construction are supplied by a [Template].
//! - Insert, erase and lookup in O(log n).
//! - Single step traversal via predecessor(), successor(), leftmost()
//!   and rightmost().
//! - Whole tree operations, clear() and merge().
//! - No Durability guarantee.
//! - Not thread safe.
//!
//! Nodes are stored in a per-tree arena and addressed by [NodeId]
//! handles. Children are owned top-down by the tree, the parent link is a
//! plain back-index used for rotations and traversal.
//!
//! Every public mutation leaves the tree satisfying:
//!
//! * Keys are in sorted order, as defined by the template.
//! * Root, if present, is black.
//! * No red node has a red child.
//! * Every path from a node down to an absent child has the same number
//!   of black nodes.
//!
//! [wiki-rbtree]: https://en.wikipedia.org/wiki/Red%E2%80%93black_tree

use log::{debug, trace};

use std::{cmp::Ordering, fmt, rc::Rc};

use crate::{
    arena::Arena,
    node::{Color, Node, NodeId},
    tmpl::Template,
    Error, Result,
};

/// RbTree manage a single instance of in-memory red-black tree, whose
/// payload is built and ordered by its [Template].
pub struct RbTree<T, A> {
    tmpl: Rc<Template<T, A>>,
    root: Option<NodeId>,
    arena: Arena<T>,
}

impl<T, A> RbTree<T, A> {
    /// Create an empty tree, parametrised by `tmpl`.
    pub fn new(tmpl: &Rc<Template<T, A>>) -> RbTree<T, A> {
        RbTree {
            tmpl: Rc::clone(tmpl),
            root: None,
            arena: Arena::new(),
        }
    }
}

/// Maintenance API.
impl<T, A> RbTree<T, A> {
    /// Return number of entries in this instance.
    #[inline]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Check whether this index is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Return the template this tree was created with.
    pub fn to_template(&self) -> Rc<Template<T, A>> {
        Rc::clone(&self.tmpl)
    }

    /// Return the root node, if any.
    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Return payload held by node `id`. None if `id` is stale.
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.arena.get(id).map(|node| &node.payload)
    }

    /// Return color of node `id`. None if `id` is stale.
    #[inline]
    pub fn color(&self, id: NodeId) -> Option<Color> {
        self.arena.get(id).map(|node| node.color)
    }

    /// Return the number of nodes on the longest root to leaf path.
    pub fn height(&self) -> usize {
        self.do_height(self.root)
    }

    fn do_height(&self, id: Option<NodeId>) -> usize {
        match id {
            Some(id) => {
                let node = &self.arena[id];
                1 + self.do_height(node.left).max(self.do_height(node.right))
            }
            None => 0,
        }
    }

    #[allow(dead_code)]
    #[cfg(test)]
    pub fn pretty_print(&self)
    where
        T: fmt::Debug,
    {
        if let Some(root) = self.root {
            self.do_pretty_print(root, "".to_string())
        }
    }

    #[cfg(test)]
    fn do_pretty_print(&self, id: NodeId, mut prefix: String)
    where
        T: fmt::Debug,
    {
        let node = &self.arena[id];
        match node.color {
            Color::Black => println!("{}(b)<{:?}>", prefix, node.payload),
            Color::Red => println!("{}(r)<{:?}>", prefix, node.payload),
        }
        prefix.push_str("  ");
        match (node.left, node.right) {
            (None, None) => (),
            (Some(l), None) => self.do_pretty_print(l, prefix),
            (None, Some(r)) => {
                println!("{}nil", prefix);
                self.do_pretty_print(r, prefix)
            }
            (Some(l), Some(r)) => {
                self.do_pretty_print(l, prefix.clone());
                self.do_pretty_print(r, prefix)
            }
        }
    }
}

/// Write API.
impl<T, A> RbTree<T, A> {
    /// Build a payload from `args` using the template allocator and insert
    /// it. Return handle to the new node.
    ///
    /// Fails with `DuplicateKey` if an equal payload is already in the
    /// tree, in which case the new payload is released and the tree is left
    /// unmodified.
    pub fn insert(&mut self, args: A) -> Result<NodeId> {
        let payload = self.tmpl.alloc(args)?;
        self.insert_raw(payload)
    }

    /// Insert an already constructed payload, bypassing the allocator.
    /// Rest of the semantics are same as [RbTree::insert].
    pub fn insert_raw(&mut self, payload: T) -> Result<NodeId> {
        if let Err(err) = self.tmpl.pre_insert(self, &payload) {
            debug!("{} pre_insert veto: {}", self.tmpl.to_name(), err);
            self.tmpl.release(payload);
            return Err(err);
        }

        match self.do_insert(payload) {
            Ok(id) => Ok(id),
            Err(payload) => {
                self.tmpl.release(payload);
                debug!("{} rejected duplicate", self.tmpl.to_name());
                err_at!(DuplicateKey, msg: "template {}", self.tmpl.to_name())
            }
        }
    }

    /// Unlink node `id` and release its payload with the template's free
    /// operation.
    ///
    /// If node `id` has two children, its payload is exchanged with its
    /// in-order predecessor and the predecessor's node is unlinked instead.
    /// In that case `id` stays valid, now holding the predecessor's
    /// payload, and the predecessor's handle turns stale.
    pub fn erase(&mut self, id: NodeId) -> Result<()> {
        if !self.tmpl.has_free() {
            return err_at!(
                MissingCapability, msg: "erase, template {} has no free", self.tmpl.to_name()
            );
        }
        let payload = self.remove(id)?;
        self.tmpl.release(payload);
        Ok(())
    }

    /// Same as [RbTree::erase], but hand the payload back to the caller
    /// instead of releasing it. Does not need a free operation.
    pub fn remove(&mut self, id: NodeId) -> Result<T> {
        if !self.arena.contains(id) {
            return err_at!(InvalidArgument, msg: "stale node {:?}", id);
        }
        self.tmpl.pre_delete(self, id)?;
        Ok(self.unlink(id))
    }

    /// Erase every entry, one root at a time.
    pub fn clear(&mut self) -> Result<()> {
        if !self.tmpl.has_free() {
            return err_at!(
                MissingCapability, msg: "clear, template {} has no free", self.tmpl.to_name()
            );
        }
        while let Some(root) = self.root {
            self.erase(root)?;
        }
        Ok(())
    }

    /// Move every entry from `src` into this tree. Both trees must share
    /// the same template instance.
    ///
    /// Entries are detached from `src`'s root and inserted into this tree
    /// one at a time. On the first conflict, `DuplicateKey` or a
    /// pre-insert veto, merge stops without rollback: entries already moved
    /// stay here, the rest stay in `src`, both trees remain valid.
    ///
    /// `src` is rebalanced after every detach, so handles into `src` may
    /// turn stale or refer to a different payload once merge returns.
    pub fn merge(&mut self, src: &mut RbTree<T, A>) -> Result<()> {
        if !Rc::ptr_eq(&self.tmpl, &src.tmpl) {
            return err_at!(
                InvalidArgument,
                msg: "merge {} <- {}, templates differ",
                self.tmpl.to_name(),
                src.tmpl.to_name()
            );
        }
        if !self.tmpl.has_free() {
            return err_at!(
                MissingCapability, msg: "merge, template {} has no free", self.tmpl.to_name()
            );
        }

        let mut n_moved = 0_usize;
        while let Some(root) = src.root {
            self.tmpl.pre_insert(self, &src.arena[root].payload)?;

            let payload = src.unlink(root);
            if let Err(payload) = self.do_insert(payload) {
                // just detached from src, cannot collide there.
                if let Err(payload) = src.do_insert(payload) {
                    self.tmpl.release(payload);
                }
                debug!("{} merge stopped after {} entries", self.tmpl.to_name(), n_moved);
                return err_at!(DuplicateKey, msg: "merge stopped after {} entries", n_moved);
            }
            n_moved += 1;
        }

        Ok(())
    }
}

/// Read API.
impl<T, A> RbTree<T, A> {
    /// Build a probe payload from `args` and look for an equal payload in
    /// the tree. The probe is released before returning.
    pub fn find(&self, args: A) -> Result<Option<NodeId>> {
        let probe = self.tmpl.alloc(args)?;
        let res = self.find_raw(&probe);
        self.tmpl.release(probe);
        Ok(res)
    }

    /// Look for a node whose payload orders equal to `probe`.
    pub fn find_raw(&self, probe: &T) -> Option<NodeId> {
        let mut cursor = self.root;
        while let Some(id) = cursor {
            let node = &self.arena[id];
            cursor = match self.tmpl.order(Some(probe), Some(&node.payload)) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(id),
            };
        }
        None
    }

    /// Return the node with smallest payload.
    pub fn leftmost(&self) -> Option<NodeId> {
        self.root.map(|root| self.leftmost_from(root))
    }

    /// Return the node with largest payload.
    pub fn rightmost(&self) -> Option<NodeId> {
        self.root.map(|root| self.rightmost_from(root))
    }

    /// Return the in-order predecessor of `id`. None if `id` is the
    /// leftmost node or a stale handle.
    pub fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        let node = self.arena.get(id)?;
        if let Some(left) = node.left {
            return Some(self.rightmost_from(left));
        }

        let (mut child, mut parent) = (id, node.parent);
        while let Some(p) = parent {
            if self.arena[p].right == Some(child) {
                return Some(p);
            }
            child = p;
            parent = self.arena[p].parent;
        }
        None
    }

    /// Return the in-order successor of `id`. None if `id` is the
    /// rightmost node or a stale handle.
    pub fn successor(&self, id: NodeId) -> Option<NodeId> {
        let node = self.arena.get(id)?;
        if let Some(right) = node.right {
            return Some(self.leftmost_from(right));
        }

        let (mut child, mut parent) = (id, node.parent);
        while let Some(p) = parent {
            if self.arena[p].left == Some(child) {
                return Some(p);
            }
            child = p;
            parent = self.arena[p].parent;
        }
        None
    }

    fn leftmost_from(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.arena[id].left {
            id = left;
        }
        id
    }

    fn rightmost_from(&self, mut id: NodeId) -> NodeId {
        while let Some(right) = self.arena[id].right {
            id = right;
        }
        id
    }
}

/// Validation API.
impl<T, A> RbTree<T, A> {
    /// Compute black height of the tree, counting black nodes from root
    /// down to any absent child.
    ///
    /// Fails if a red node has a red child or if two sibling subtrees
    /// differ in black height. An empty tree is reported as a failure,
    /// callers wanting to treat it as balanced must check is_empty().
    pub fn is_balanced(&self) -> Result<usize> {
        match self.root {
            Some(root) => self.black_height(Some(root)),
            None => err_at!(Fatal, msg: "empty tree"),
        }
    }

    fn black_height(&self, id: Option<NodeId>) -> Result<usize> {
        let node = match id {
            Some(id) => &self.arena[id],
            None => return Ok(0),
        };

        if node.is_red() && (self.is_red(node.left) || self.is_red(node.right)) {
            return err_at!(Fatal, msg: "consecutive reds at {:?}", id);
        }

        let lblacks = self.black_height(node.left)?;
        let rblacks = self.black_height(node.right)?;
        if lblacks != rblacks {
            return err_at!(Fatal, msg: "unbalanced blacks {} {}", lblacks, rblacks);
        }

        Ok(lblacks + if node.is_black() { 1 } else { 0 })
    }

    /// Validate tree with following rules:
    ///
    /// * Root is black and has no parent.
    /// * Every child links back to its parent.
    /// * From root to any leaf, no consecutive reds allowed in its path.
    /// * Number of blacks should be same under left child and right child.
    /// * In-order walk yields payloads in strictly ascending order.
    /// * Every node in the arena is reachable from root.
    ///
    /// Unlike [RbTree::is_balanced], an empty tree is valid.
    pub fn validate(&self) -> Result<()> {
        let root = match self.root {
            Some(root) => root,
            None if self.arena.len() == 0 => return Ok(()),
            None => return err_at!(Fatal, msg: "{} nodes without root", self.arena.len()),
        };

        match self.arena.get(root) {
            Some(node) if node.is_red() => err_at!(Fatal, msg: "red root")?,
            Some(node) if node.parent.is_some() => err_at!(Fatal, msg: "root has parent")?,
            Some(_) => (),
            None => err_at!(Fatal, msg: "dangling root {:?}", root)?,
        }

        let mut n_count = 0;
        self.validate_tree(root, &mut n_count)?;
        if n_count != self.arena.len() {
            err_at!(Fatal, msg: "mismatch in count {} != {}", n_count, self.arena.len())?;
        }

        let (mut prev, mut cursor, mut n_walk) = (None, self.leftmost(), 0);
        while let Some(id) = cursor {
            if let Some(prev) = prev {
                if self.tmpl.order(self.get(prev), self.get(id)) != Ordering::Less {
                    err_at!(Fatal, msg: "sort order broken at {:?}", id)?;
                }
            }
            n_walk += 1;
            prev = Some(id);
            cursor = self.successor(id);
        }
        if n_walk != n_count {
            err_at!(Fatal, msg: "mismatch in walk {} != {}", n_walk, n_count)?;
        }

        Ok(())
    }

    fn validate_tree(&self, id: NodeId, n_count: &mut usize) -> Result<usize> {
        *n_count += 1;
        let node = &self.arena[id];

        let mut n_blacks = [0_usize; 2];
        for (i, child) in [node.left, node.right].iter().enumerate() {
            let child = match child {
                Some(child) => *child,
                None => continue,
            };
            let cnode = match self.arena.get(child) {
                Some(cnode) => cnode,
                None => return err_at!(Fatal, msg: "dangling child {:?}", child),
            };
            if cnode.parent != Some(id) {
                err_at!(Fatal, msg: "broken parent link {:?} -> {:?}", child, id)?;
            }
            if node.is_red() && cnode.is_red() {
                err_at!(Fatal, msg: "consecutive reds {:?} -> {:?}", id, child)?;
            }
            let want = if i == 0 { Ordering::Less } else { Ordering::Greater };
            if self.tmpl.order(Some(&cnode.payload), Some(&node.payload)) != want {
                err_at!(Fatal, msg: "sort child:{:?} parent:{:?}", child, id)?;
            }
            n_blacks[i] = self.validate_tree(child, n_count)?;
        }

        if n_blacks[0] != n_blacks[1] {
            err_at!(Fatal, msg: "unbalanced blacks {} {}", n_blacks[0], n_blacks[1])?;
        }

        Ok(n_blacks[0] + if node.is_black() { 1 } else { 0 })
    }
}

impl<T, A> RbTree<T, A> {
    // Descend from root and link `payload` at the empty slot it orders
    // into, then rebalance. Hand the payload back on duplicate.
    fn do_insert(&mut self, payload: T) -> std::result::Result<NodeId, T> {
        let (mut parent, mut left) = (None, false);
        let mut cursor = self.root;
        while let Some(id) = cursor {
            let node = &self.arena[id];
            parent = Some(id);
            cursor = match self.tmpl.order(Some(&payload), Some(&node.payload)) {
                Ordering::Less => {
                    left = true;
                    node.left
                }
                Ordering::Greater => {
                    left = false;
                    node.right
                }
                Ordering::Equal => return Err(payload),
            };
        }

        let id = self.arena.insert(Node::new(payload, parent));
        match parent {
            Some(p) if left => self.arena[p].left = Some(id),
            Some(p) => self.arena[p].right = Some(id),
            None => self.root = Some(id),
        }
        self.insert_fixup(id);

        Ok(id)
    }

    //               G                  P
    //              / \                / \
    //            (p)  U     -->     (n) (g)
    //            /                        \
    //          (n)                         U
    //
    fn insert_fixup(&mut self, mut id: NodeId) {
        loop {
            let parent = match self.arena[id].parent {
                Some(parent) => parent,
                None => {
                    self.arena[id].set_black();
                    break;
                }
            };
            if self.arena[parent].is_black() {
                break;
            }
            // red parent is never root, so grandparent is always there.
            let grand = match self.arena[parent].parent {
                Some(grand) => grand,
                None => {
                    self.arena[parent].set_black();
                    break;
                }
            };

            let parent_left = self.arena[grand].left == Some(parent);
            let uncle = match parent_left {
                true => self.arena[grand].right,
                false => self.arena[grand].left,
            };

            if let Some(uncle) = uncle.filter(|u| self.arena[*u].is_red()) {
                self.arena[parent].set_black();
                self.arena[uncle].set_black();
                self.arena[grand].set_red();
                id = grand;
                continue;
            }

            let mut top = parent;
            if parent_left && self.arena[parent].right == Some(id) {
                self.rotate_left(parent);
                top = id;
            } else if !parent_left && self.arena[parent].left == Some(id) {
                self.rotate_right(parent);
                top = id;
            }

            self.arena[top].set_black();
            self.arena[grand].set_red();
            self.rotate_toward(grand, !parent_left);
            break;
        }
    }

    // Detach node `id` from the tree and return its payload. Two-children
    // nodes trade payload with their predecessor, whose node is detached
    // in its place.
    fn unlink(&mut self, id: NodeId) -> T {
        let left = self.arena[id].left;
        let target = match left {
            Some(left) if self.arena[id].has_two_children() => {
                let pred = self.rightmost_from(left);
                self.arena.swap_payload(id, pred);
                pred
            }
            _ => id,
        };

        let (parent, child, color) = {
            let node = &self.arena[target];
            (node.parent, node.as_only_child(), node.color)
        };

        self.replace_child(parent, target, child);
        if let Some(child) = child {
            self.arena[child].parent = parent;
        }
        let node = self.arena.take(target);

        match (color, child) {
            // red node with at most one child has no child.
            (Color::Red, _) => (),
            (Color::Black, Some(child)) => self.arena[child].set_black(),
            (Color::Black, None) => self.erase_fixup(parent),
        }

        node.payload
    }

    // Restore black height after a black leaf was detached below `parent`.
    // Only parent, sibling and nephews are visited, never the detached
    // node itself.
    fn erase_fixup(&mut self, parent: Option<NodeId>) {
        let (mut id, mut parent) = (None, parent);

        while let Some(p) = parent {
            if self.is_red(id) {
                break;
            }

            let vacated_left = self.arena[p].left == id;
            let mut sibling = self.sibling_of(p, vacated_left);

            if self.arena[sibling].is_red() {
                self.arena[p].set_red();
                self.arena[sibling].set_black();
                self.rotate_toward(p, vacated_left);
                sibling = self.sibling_of(p, vacated_left);
            }

            let (near, far) = self.nephews_of(sibling, vacated_left);
            if self.is_black(near) && self.is_black(far) {
                if self.arena[p].is_black() {
                    self.arena[sibling].set_red();
                    id = Some(p);
                    parent = self.arena[p].parent;
                    continue;
                }
                self.arena[p].set_black();
                self.arena[sibling].set_red();
                return;
            }

            if self.is_black(far) {
                if let Some(near) = near {
                    self.arena[near].set_black();
                }
                self.arena[sibling].set_red();
                self.rotate_toward(sibling, !vacated_left);
                sibling = self.sibling_of(p, vacated_left);
            }

            let (_, far) = self.nephews_of(sibling, vacated_left);
            self.arena[sibling].color = self.arena[p].color;
            self.arena[p].set_black();
            if let Some(far) = far {
                self.arena[far].set_black();
            }
            self.rotate_toward(p, vacated_left);
            return;
        }

        if let Some(id) = id {
            self.arena[id].set_black();
        }
    }

    fn sibling_of(&self, parent: NodeId, vacated_left: bool) -> NodeId {
        let node = &self.arena[parent];
        let sibling = if vacated_left { node.right } else { node.left };
        match sibling {
            Some(sibling) => sibling,
            None => panic!("erase_fixup(): black deficit without sibling, call the programmer"),
        }
    }

    // Return (near, far) children of `sibling`, relative to the vacated side.
    fn nephews_of(&self, sibling: NodeId, vacated_left: bool) -> (Option<NodeId>, Option<NodeId>) {
        let node = &self.arena[sibling];
        match vacated_left {
            true => (node.left, node.right),
            false => (node.right, node.left),
        }
    }

    #[inline]
    fn is_red(&self, id: Option<NodeId>) -> bool {
        id.map_or(false, |id| self.arena[id].is_red())
    }

    #[inline]
    fn is_black(&self, id: Option<NodeId>) -> bool {
        id.map_or(true, |id| self.arena[id].is_black())
    }

    // Point `parent`'s link to `old` at `new`, or the root when `old` has
    // no parent.
    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        match parent {
            Some(p) if self.arena[p].left == Some(old) => self.arena[p].left = new,
            Some(p) => self.arena[p].right = new,
            None => self.root = new,
        }
    }

    // Rotate `id` down toward the left when `left` is true, else toward
    // the right.
    #[inline]
    fn rotate_toward(&mut self, id: NodeId, left: bool) {
        if left {
            self.rotate_left(id)
        } else {
            self.rotate_right(id)
        }
    }
}

//--------- rotation routines ----------------

impl<T, A> RbTree<T, A> {
    //              (p)                       (p)
    //               |                         |
    //              node                       x
    //              /  \                      / \
    //             /    \                    /   \
    //            /      \                  /     \
    //          left      x              node      xr
    //                   / \             /  \
    //                 xl   xr       left   xl
    //
    pub(crate) fn rotate_left(&mut self, id: NodeId) {
        let x = match self.arena.get(id).and_then(|node| node.right) {
            Some(x) => x,
            None => return,
        };
        trace!("rotate_left at {:?}", id);

        let parent = self.arena[id].parent;
        let xl = self.arena[x].left;

        self.arena[id].right = xl;
        if let Some(xl) = xl {
            self.arena[xl].parent = Some(id);
        }
        self.arena[x].parent = parent;
        self.replace_child(parent, id, Some(x));
        self.arena[x].left = Some(id);
        self.arena[id].parent = Some(x);
    }

    //              (p)                       (p)
    //               |                         |
    //              node                       x
    //              /  \                      / \
    //             /    \                    /   \
    //            /      \                  /     \
    //           x      right             xl      node
    //          / \                               / \
    //        xl   xr                           xr  right
    //
    pub(crate) fn rotate_right(&mut self, id: NodeId) {
        let x = match self.arena.get(id).and_then(|node| node.left) {
            Some(x) => x,
            None => return,
        };
        trace!("rotate_right at {:?}", id);

        let parent = self.arena[id].parent;
        let xr = self.arena[x].right;

        self.arena[id].left = xr;
        if let Some(xr) = xr {
            self.arena[xr].parent = Some(id);
        }
        self.arena[x].parent = parent;
        self.replace_child(parent, id, Some(x));
        self.arena[x].right = Some(id);
        self.arena[id].parent = Some(x);
    }
}

impl<T, A> Drop for RbTree<T, A> {
    fn drop(&mut self) {
        if !self.tmpl.has_free() && self.arena.len() > 0 {
            debug!("{} dropping {} entries without free", self.tmpl.to_name(), self.len());
        }
        self.root = None;
        for node in self.arena.drain() {
            self.tmpl.release(node.payload);
        }
    }
}

impl<T, A> fmt::Debug for RbTree<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "RbTree<{} len:{}>", self.tmpl.to_name(), self.len())
    }
}

#[cfg(test)]
#[path = "rbtree_test.rs"]
mod rbtree_test;
