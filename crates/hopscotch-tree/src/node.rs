//! Tree cells
//!
//! A [`Node`] carries an open-ended key/value bag describing the page it
//! stands for (at least `name` and `url`), plus its position in the tree.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Page attributes keyed by name
pub type NodeData = BTreeMap<String, Value>;

/// Key holding the human-readable page title
pub const NAME_KEY: &str = "name";

/// Key holding the page URL
pub const URL_KEY: &str = "url";

/// Stable handle of a node inside a [`Tree`](crate::Tree)
///
/// Handles are allocated monotonically and never reused, so a handle to a
/// removed node simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Arena index of this node
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A single page in the navigation tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    depth: usize,
}

impl Node {
    pub(crate) fn new(data: NodeData, parent: Option<NodeId>, depth: usize) -> Self {
        Self {
            data,
            parent,
            children: Vec::new(),
            depth,
        }
    }

    /// Get a data value by key
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Set a data value
    #[inline]
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    /// Whole data bag
    #[inline]
    #[must_use]
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    /// Page title, if recorded as a string
    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.get(NAME_KEY).and_then(Value::as_str)
    }

    /// Page URL, if recorded as a string
    #[inline]
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.get(URL_KEY).and_then(Value::as_str)
    }

    /// Parent handle (`None` for the root and for detached nodes)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in discovery order
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Distance to the top of this node's tree
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Build the data bag for a page
#[must_use]
pub fn page(name: impl Into<String>, url: impl Into<String>) -> NodeData {
    let mut data = NodeData::new();
    data.insert(NAME_KEY.to_string(), Value::String(name.into()));
    data.insert(URL_KEY.to_string(), Value::String(url.into()));
    data
}
