//! Node arena
//!
//! Provides [`Tree`], which owns every node (attached or detached) and the
//! singleton root.

use crate::node::{Node, NodeData, NodeId, NAME_KEY};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Write as _;

/// Navigation tree
///
/// Nodes are never re-parented: depth is fixed at creation. Detached nodes
/// (no parent, depth 0) share the arena with the main tree until they are
/// removed or copied into it with [`Tree::graft_copy`].
#[derive(Debug, Clone)]
pub struct Tree {
    slots: Vec<Option<Node>>,
    root: NodeId,
    live: usize,
}

impl Tree {
    /// Create a tree holding only the root
    #[must_use]
    pub fn new() -> Self {
        let mut data = NodeData::new();
        data.insert(NAME_KEY.to_string(), Value::from("root"));
        Self {
            slots: vec![Some(Node::new(data, None, 0))],
            root: NodeId(0),
            live: 1,
        }
    }

    /// The root handle
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, detached ones included
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Always false: the root cannot be removed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Check whether a handle still resolves
    #[inline]
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Resolve a handle
    #[inline]
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    /// Resolve a handle mutably
    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Create a node
    ///
    /// With a live `parent` and `attach` set, the node is appended to the
    /// parent's children at `parent.depth + 1`. Otherwise it is created
    /// unattached at depth 0.
    pub fn create_node(&mut self, parent: Option<NodeId>, data: NodeData, attach: bool) -> NodeId {
        let parent = parent.filter(|p| attach && self.contains(*p));
        let depth = parent.and_then(|p| self.depth(p)).map_or(0, |d| d + 1);

        let id = NodeId(self.slots.len());
        self.slots.push(Some(Node::new(data, parent, depth)));
        self.live += 1;

        if let Some(parent) = parent {
            self.append_child(parent, id);
        }
        id
    }

    /// Create a node under `parent`
    #[inline]
    pub fn attach_child(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        self.create_node(Some(parent), data, true)
    }

    /// Create a node with no parent
    #[inline]
    pub fn create_detached(&mut self, data: NodeData) -> NodeId {
        self.create_node(None, data, false)
    }

    /// Link a freshly created child into its parent's child list
    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
    }

    /// Children of a node in discovery order (empty for unknown handles)
    #[inline]
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[] as &[NodeId], Node::children)
    }

    /// Parent of a node
    #[inline]
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    /// Depth of a node
    #[inline]
    #[must_use]
    pub fn depth(&self, id: NodeId) -> Option<usize> {
        self.node(id).map(Node::depth)
    }

    /// URL of a node
    #[inline]
    #[must_use]
    pub fn url(&self, id: NodeId) -> Option<&str> {
        self.node(id).and_then(Node::url)
    }

    /// Check whether a node hangs (transitively) off the root
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == self.root {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// First child of `id` whose URL equals `url`
    #[must_use]
    pub fn find_child_by_url(&self, id: NodeId, url: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|child| self.url(*child) == Some(url))
    }

    /// `id` and all of its descendants, pre-order
    #[must_use]
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Unlink a node from its parent and free it with its descendants
    ///
    /// Returns the freed handles. The root is never removed.
    pub fn remove_subtree(&mut self, id: NodeId) -> Vec<NodeId> {
        if id == self.root {
            return Vec::new();
        }

        let removed = self.subtree(id);
        if let Some(parent) = self.parent(id).and_then(|p| self.node_mut(p)) {
            parent.children.retain(|child| *child != id);
        }
        for freed in &removed {
            if let Some(slot) = self.slots.get_mut(freed.0) {
                if slot.take().is_some() {
                    self.live -= 1;
                }
            }
        }
        removed
    }

    /// Copy the sub-tree under `source` beneath `new_parent`
    ///
    /// The copies get fresh handles and depths consistent with their new
    /// position; the source sub-tree is left untouched. Returns the mapping
    /// from source handles to their copies (empty if either handle is dead).
    pub fn graft_copy(&mut self, source: NodeId, new_parent: NodeId) -> HashMap<NodeId, NodeId> {
        let mut mapping = HashMap::new();
        if !self.contains(source) || !self.contains(new_parent) {
            return mapping;
        }

        for old in self.subtree(source) {
            let parent = if old == source {
                new_parent
            } else {
                self.parent(old)
                    .and_then(|p| mapping.get(&p).copied())
                    .unwrap_or(new_parent)
            };
            let data = self.node(old).map(|n| n.data().clone()).unwrap_or_default();
            let copy = self.attach_child(parent, data);
            mapping.insert(old, copy);
        }
        mapping
    }

    /// Indented text dump of the sub-tree under `id`
    #[must_use]
    pub fn render(&self, id: NodeId) -> String {
        let mut out = String::new();
        let base = self.depth(id).unwrap_or(0);

        for current in self.subtree(id) {
            let Some(node) = self.node(current) else {
                continue;
            };
            let indent = "  ".repeat(node.depth().saturating_sub(base));
            let name = node.name().unwrap_or("(untitled)");
            match node.url() {
                Some(url) => {
                    let _ = writeln!(out, "{indent}{name} <{url}>");
                }
                None => {
                    let _ = writeln!(out, "{indent}{name}");
                }
            }
        }
        out
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
