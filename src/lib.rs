//! Package implement a generic [red-black tree][wiki-rbtree] engine.
//!
//! The engine is meant as a building block for higher level ordered
//! indexes. It knows nothing about the payload it stores, instead each
//! tree is parametrised by a [Template], supplied by the caller at
//! construction time:
//!
//! * [Template] builds payload from caller defined arguments, orders two
//!   payloads, releases removed payloads and optionally hooks into insert
//!   and erase.
//! * [RbTree] implements rotation, insert/erase rebalancing, single step
//!   traversal, clear, merge, find and validation on top of it.
//!
//! Simple ordered index for single threaded use case
//! -------------------------------------------------
//!
//! - Payload type and comparator supplied by the template.
//! - Insert, erase, find in O(log n).
//! - predecessor(), successor(), leftmost(), rightmost() for traversal.
//! - Uses ownership model and borrow semantics to ensure safety.
//! - No Durability guarantee.
//! - Not thread safe.
//!
//! Constructing an integer index and walking it in order:
//!
//! ```
//! use std::rc::Rc;
//! use rbtmpl::{RbTree, Template};
//!
//! let tmpl = Template::new("ints", |key: i32| Ok(key), |a: &i32, b: &i32| a.cmp(b))
//!     .with_free(|_key: i32| ());
//! let tmpl = Rc::new(tmpl);
//!
//! let mut index = RbTree::new(&tmpl);
//! for key in [1, 12, 25, 9, 6].iter() {
//!     index.insert(*key).unwrap();
//! }
//! assert_eq!(index.len(), 5);
//!
//! let mut keys = vec![];
//! let mut node = index.leftmost();
//! while let Some(id) = node {
//!     keys.push(*index.get(id).unwrap());
//!     node = index.successor(id);
//! }
//! assert_eq!(keys, vec![1, 6, 9, 12, 25]);
//!
//! let id = index.find(9).unwrap().unwrap();
//! index.erase(id).unwrap();
//! assert_eq!(index.len(), 4);
//! assert!(index.is_balanced().is_ok());
//! ```
//!
//! [wiki-rbtree]: https://en.wikipedia.org/wiki/Red%E2%80%93black_tree

use std::{error, fmt, result};

// Short form to compose Error values.
//
// Here are few possible ways:
//
// ```ignore
// use crate::Error;
// err_at!(DuplicateKey, msg: "template {}", name);
// ```
//
// ```ignore
// use crate::Error;
// err_at!(AllocFail, u32::try_from(key));
// ```
//
// ```ignore
// use crate::Error;
// err_at!(AllocFail, u32::try_from(key), "key {}", key);
// ```
//
macro_rules! err_at {
    ($v:ident, msg: $($arg:expr),+) => {{
        let prefix = format!("{}:{}", file!(), line!());
        Err(Error::$v(prefix, format!($($arg),+)))
    }};
    ($v:ident, $e:expr) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                Err(Error::$v(prefix, format!("{}", err)))
            }
        }
    }};
    ($v:ident, $e:expr, $($arg:expr),+) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                let msg = format!($($arg),+);
                Err(Error::$v(prefix, format!("{} {}", err, msg)))
            }
        }
    }};
}

mod arena;
mod node;
mod rbtree;
mod tmpl;

pub use node::{Color, NodeId};
pub use rbtree::RbTree;
pub use tmpl::Template;

/// Error variants that are returned by this package's API.
///
/// Each variant carries a prefix, typically identifying the
/// error location.
pub enum Error {
    /// Tree failed validation.
    Fatal(String, String),
    /// Stale node handle, or trees with different templates.
    InvalidArgument(String, String),
    /// Payload orders equal to one already in the tree.
    DuplicateKey(String, String),
    /// Template could not build a payload.
    AllocFail(String, String),
    /// Template lacks an operation needed for the call, like free.
    MissingCapability(String, String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        use Error::*;

        match self {
            Fatal(p, msg) => write!(f, "{} Fatal: {}", p, msg),
            InvalidArgument(p, msg) => write!(f, "{} InvalidArgument: {}", p, msg),
            DuplicateKey(p, msg) => write!(f, "{} DuplicateKey: {}", p, msg),
            AllocFail(p, msg) => write!(f, "{} AllocFail: {}", p, msg),
            MissingCapability(p, msg) => write!(f, "{} MissingCapability: {}", p, msg),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "{}", self)
    }
}

impl error::Error for Error {}

/// Type alias for Result return type, used by this package.
pub type Result<T> = result::Result<T, Error>;
