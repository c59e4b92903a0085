//! Tab registry
//!
//! Maps each tracked tab to its [`TabRecord`]. The registry owns no nodes;
//! records only hold handles into the [`Tree`](hopscotch_tree::Tree).

use crate::config::BrowserNavigation;
use crate::error::RegistryError;
use crate::types::TabId;
use hopscotch_tree::NodeId;
use indexmap::IndexMap;
use serde::Serialize;

/// Transient per-tab markers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TabFlags {
    /// The tab's branch is not grafted onto the main tree yet
    pub lost: bool,
    /// The next top-level commit is already accounted for
    pub stall: bool,
}

impl TabFlags {
    /// Flags of a lost tab
    #[inline]
    #[must_use]
    pub fn lost() -> Self {
        Self {
            lost: true,
            stall: false,
        }
    }
}

/// Per-tab cursor state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabRecord {
    /// Node of the tab's real navigation position
    pub anchor: NodeId,
    /// Node the tab's menu is centred on
    pub watch: NodeId,
    /// Transient markers
    pub flags: TabFlags,
    /// Root of the tab's private sub-tree while lost
    pub detached_root: Option<NodeId>,
}

impl TabRecord {
    /// Record anchored and watching at `node`
    #[must_use]
    pub fn new(node: NodeId) -> Self {
        Self {
            anchor: node,
            watch: node,
            flags: TabFlags::default(),
            detached_root: None,
        }
    }

    /// Whether the tab still needs to be placed by the user
    #[inline]
    #[must_use]
    pub fn is_lost(&self) -> bool {
        self.flags.lost
    }
}

/// Registry of tracked tabs, in registration order
#[derive(Debug, Clone, Default)]
pub struct TabRegistry {
    tabs: IndexMap<TabId, TabRecord>,
}

impl TabRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tab at `node`, replacing any previous record
    ///
    /// Returns the replaced record, if any.
    pub fn create_tab(
        &mut self,
        id: TabId,
        node: NodeId,
        flags: TabFlags,
        detached_root: Option<NodeId>,
    ) -> Option<TabRecord> {
        let record = TabRecord {
            flags,
            detached_root,
            ..TabRecord::new(node)
        };
        self.tabs.insert(id, record)
    }

    /// Move a tab's anchor; `watch` follows only in tracked mode
    ///
    /// # Errors
    /// Returns [`RegistryError::UnknownTab`] if the tab has no record
    pub fn point_tab(
        &mut self,
        id: TabId,
        node: NodeId,
        mode: BrowserNavigation,
    ) -> Result<(), RegistryError> {
        let record = self.get_mut(id)?;
        record.anchor = node;
        if mode == BrowserNavigation::Tracked {
            record.watch = node;
        }
        Ok(())
    }

    /// Drop a tab's record
    ///
    /// # Errors
    /// Returns [`RegistryError::UnknownTab`] if the tab has no record
    pub fn remove_tab(&mut self, id: TabId) -> Result<TabRecord, RegistryError> {
        self.tabs
            .shift_remove(&id)
            .ok_or(RegistryError::UnknownTab(id))
    }

    /// Look up a record
    ///
    /// # Errors
    /// Returns [`RegistryError::UnknownTab`] if the tab has no record
    #[inline]
    pub fn get(&self, id: TabId) -> Result<&TabRecord, RegistryError> {
        self.tabs.get(&id).ok_or(RegistryError::UnknownTab(id))
    }

    /// Look up a record mutably
    ///
    /// # Errors
    /// Returns [`RegistryError::UnknownTab`] if the tab has no record
    #[inline]
    pub fn get_mut(&mut self, id: TabId) -> Result<&mut TabRecord, RegistryError> {
        self.tabs.get_mut(&id).ok_or(RegistryError::UnknownTab(id))
    }

    /// Whether the tab is tracked
    #[inline]
    #[must_use]
    pub fn contains(&self, id: TabId) -> bool {
        self.tabs.contains_key(&id)
    }

    /// Iterate records in registration order
    pub fn iter(&self) -> impl Iterator<Item = (TabId, &TabRecord)> {
        self.tabs.iter().map(|(id, record)| (*id, record))
    }

    /// Iterate records mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (TabId, &mut TabRecord)> {
        self.tabs.iter_mut().map(|(id, record)| (*id, record))
    }

    /// Number of tracked tabs
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    /// Whether no tab is tracked
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopscotch_tree::{page, Tree};

    fn two_nodes() -> (NodeId, NodeId) {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = tree.attach_child(root, page("A", "https://a.com"));
        let b = tree.attach_child(a, page("B", "https://b.com"));
        (a, b)
    }

    #[test]
    fn create_tab_sets_anchor_and_watch() {
        let (a, _) = two_nodes();
        let mut registry = TabRegistry::new();
        registry.create_tab(TabId(1), a, TabFlags::default(), None);

        let record = registry.get(TabId(1)).unwrap();
        assert_eq!(record.anchor, a);
        assert_eq!(record.watch, a);
        assert!(!record.is_lost());
    }

    #[test]
    fn tracked_pointing_moves_watch() {
        let (a, b) = two_nodes();
        let mut registry = TabRegistry::new();
        registry.create_tab(TabId(1), a, TabFlags::default(), None);

        registry.point_tab(TabId(1), b, BrowserNavigation::Tracked).unwrap();

        let record = registry.get(TabId(1)).unwrap();
        assert_eq!(record.anchor, b);
        assert_eq!(record.watch, b);
    }

    #[test]
    fn sticky_pointing_leaves_watch() {
        let (a, b) = two_nodes();
        let mut registry = TabRegistry::new();
        registry.create_tab(TabId(1), a, TabFlags::default(), None);

        registry.point_tab(TabId(1), b, BrowserNavigation::Sticky).unwrap();

        let record = registry.get(TabId(1)).unwrap();
        assert_eq!(record.anchor, b);
        assert_eq!(record.watch, a);
    }

    #[test]
    fn unknown_tab_is_an_error() {
        let (a, _) = two_nodes();
        let mut registry = TabRegistry::new();

        assert_eq!(
            registry.point_tab(TabId(5), a, BrowserNavigation::Tracked),
            Err(RegistryError::UnknownTab(TabId(5)))
        );
        assert!(registry.remove_tab(TabId(5)).is_err());
    }

    #[test]
    fn remove_keeps_registration_order() {
        let (a, b) = two_nodes();
        let mut registry = TabRegistry::new();
        registry.create_tab(TabId(3), a, TabFlags::default(), None);
        registry.create_tab(TabId(1), b, TabFlags::default(), None);
        registry.create_tab(TabId(2), a, TabFlags::lost(), Some(a));

        registry.remove_tab(TabId(1)).unwrap();

        let order: Vec<TabId> = registry.iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![TabId(3), TabId(2)]);
    }
}
