//! Module provide the extension contract for [RbTree] by [Template] type.
//!
//! The tree engine never looks inside a node's payload, everything it
//! needs to know about payload is asked through the template:
//!
//! * `alloc`, build a payload from caller defined arguments.
//! * `free`, release a payload removed from the tree. Optional, but
//!   erase, clear and merge refuse to run without it.
//! * `order`, compare two payloads.
//! * `pre_insert`, optional hook run before a payload is linked, can veto
//!   the insert by returning an error.
//! * `pre_delete`, optional hook run before a node is unlinked, can veto
//!   the removal by returning an error.
//!
//! A template is shared by reference between trees, trees constructed
//! with the same template instance can be merged.
//!
//! ```
//! use std::rc::Rc;
//! use rbtmpl::{RbTree, Template};
//!
//! let tmpl = Template::new("ints", |key: i64| Ok(key), |a: &i64, b: &i64| a.cmp(b))
//!     .with_free(|_key: i64| ());
//! let tmpl = Rc::new(tmpl);
//!
//! let mut tree = RbTree::new(&tmpl);
//! tree.insert(10).unwrap();
//! assert!(tree.find(10).unwrap().is_some());
//! ```

use std::{cmp::Ordering, fmt};

use crate::{NodeId, RbTree, Result};

type AllocFn<T, A> = dyn Fn(A) -> Result<T>;
type FreeFn<T> = dyn Fn(T);
type OrderFn<T> = dyn Fn(&T, &T) -> Ordering;
type PreInsertFn<T, A> = dyn Fn(&RbTree<T, A>, &T) -> Result<()>;
type PreDeleteFn<T, A> = dyn Fn(&RbTree<T, A>, NodeId) -> Result<()>;

/// Template carries the caller supplied operations that parametrise
/// [RbTree] over payload type `T`, built from arguments of type `A`.
pub struct Template<T, A> {
    name: String,
    alloc: Box<AllocFn<T, A>>,
    free: Option<Box<FreeFn<T>>>,
    order: Box<OrderFn<T>>,
    pre_insert: Option<Box<PreInsertFn<T, A>>>,
    pre_delete: Option<Box<PreDeleteFn<T, A>>>,
}

impl<T, A> Template<T, A> {
    /// Create a new template with mandatory `alloc` and `order`
    /// operations. `order` must define a strict weak ordering.
    pub fn new<F, O>(name: &str, alloc: F, order: O) -> Template<T, A>
    where
        F: 'static + Fn(A) -> Result<T>,
        O: 'static + Fn(&T, &T) -> Ordering,
    {
        Template {
            name: name.to_string(),
            alloc: Box::new(alloc),
            free: None,
            order: Box::new(order),
            pre_insert: None,
            pre_delete: None,
        }
    }

    /// Configure the operation releasing payloads removed from the tree.
    pub fn with_free<F>(mut self, free: F) -> Self
    where
        F: 'static + Fn(T),
    {
        self.free = Some(Box::new(free));
        self
    }

    /// Configure a hook to run before every insert.
    pub fn with_pre_insert<F>(mut self, hook: F) -> Self
    where
        F: 'static + Fn(&RbTree<T, A>, &T) -> Result<()>,
    {
        self.pre_insert = Some(Box::new(hook));
        self
    }

    /// Configure a hook to run before every erase.
    pub fn with_pre_delete<F>(mut self, hook: F) -> Self
    where
        F: 'static + Fn(&RbTree<T, A>, NodeId) -> Result<()>,
    {
        self.pre_delete = Some(Box::new(hook));
        self
    }

    /// Identify this template.
    #[inline]
    pub fn to_name(&self) -> String {
        self.name.clone()
    }

    /// Return whether this template can release payloads.
    #[inline]
    pub fn has_free(&self) -> bool {
        self.free.is_some()
    }

    /// Build a new payload from `args`.
    #[inline]
    pub fn alloc(&self, args: A) -> Result<T> {
        (self.alloc)(args)
    }

    /// Order two, possibly absent, payloads. Absent orders before any
    /// present payload, and two absent operands are equal.
    pub fn order(&self, a: Option<&T>, b: Option<&T>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => (self.order)(a, b),
        }
    }

    // Hand payload back to the caller's free operation. Without one the
    // payload is simply dropped, used for probes and rejected candidates.
    pub(crate) fn release(&self, payload: T) {
        match &self.free {
            Some(free) => free(payload),
            None => drop(payload),
        }
    }

    pub(crate) fn pre_insert(&self, tree: &RbTree<T, A>, payload: &T) -> Result<()> {
        match &self.pre_insert {
            Some(hook) => hook(tree, payload),
            None => Ok(()),
        }
    }

    pub(crate) fn pre_delete(&self, tree: &RbTree<T, A>, id: NodeId) -> Result<()> {
        match &self.pre_delete {
            Some(hook) => hook(tree, id),
            None => Ok(()),
        }
    }
}

impl<T, A> fmt::Debug for Template<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Template<{} free:{} pre_insert:{} pre_delete:{}>",
            self.name,
            self.free.is_some(),
            self.pre_insert.is_some(),
            self.pre_delete.is_some()
        )
    }
}

#[cfg(test)]
#[path = "tmpl_test.rs"]
mod tmpl_test;
