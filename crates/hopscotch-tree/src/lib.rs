//! Hopscotch navigation tree
//!
//! An arena of page nodes addressed by stable [`NodeId`] handles. Every node
//! keeps a non-owning handle to its parent and an ordered list of child
//! handles, so the forest has no reference cycles while parent and child
//! traversal stay O(1).
//!
//! # Example
//!
//! ```rust
//! use hopscotch_tree::{page, Tree};
//!
//! let mut tree = Tree::new();
//! let root = tree.root();
//! let a = tree.attach_child(root, page("A", "https://a.com"));
//! let b = tree.attach_child(a, page("B", "https://b.com"));
//!
//! assert_eq!(tree.depth(b), Some(2));
//! assert_eq!(tree.find_child_by_url(a, "https://b.com"), Some(b));
//! ```

#![warn(unreachable_pub)]

pub mod node;
pub mod tree;

pub use node::{page, Node, NodeData, NodeId, NAME_KEY, URL_KEY};
pub use tree::Tree;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
