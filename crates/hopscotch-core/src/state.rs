//! Shared engine state
//!
//! [`HistoryState`] is the single value guarded by the engine's lock: the
//! tree, the tab registry, and the tabs that have been closed.

use crate::registry::{TabRecord, TabRegistry};
use crate::types::TabId;
use hopscotch_tree::{NodeId, Tree};
use std::collections::HashSet;

/// Tree plus tab bookkeeping
#[derive(Debug, Clone, Default)]
pub struct HistoryState {
    /// Navigation tree
    pub tree: Tree,
    /// Tracked tabs
    pub tabs: TabRegistry,
    /// Closed tabs; a lookup still in flight must not register them again
    pub retired: HashSet<TabId>,
    /// Retired tabs whose removal the host has confirmed
    pub departed: HashSet<TabId>,
}

impl HistoryState {
    /// Create state with an empty tree
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the tab was closed
    #[inline]
    #[must_use]
    pub fn is_retired(&self, tab: TabId) -> bool {
        self.retired.contains(&tab)
    }

    /// Note that the host has removed a retired tab
    ///
    /// From here on the host itself reports the tab gone, so the id can be
    /// forgotten once no lookup for it is in flight.
    pub fn confirm_departed(&mut self, tab: TabId) {
        if self.retired.contains(&tab) {
            self.departed.insert(tab);
        }
    }

    /// Drop a departed tab from the retired set
    ///
    /// Returns false if the host has not confirmed the removal yet.
    pub fn forget_departed(&mut self, tab: TabId) -> bool {
        if !self.departed.remove(&tab) {
            return false;
        }
        self.retired.remove(&tab);
        true
    }

    /// Free a private sub-tree, if the record carries one
    ///
    /// Returns the number of nodes freed.
    pub fn release_detached(&mut self, record: &TabRecord) -> usize {
        record
            .detached_root
            .map_or(0, |root| self.free_detached(root))
    }

    /// Free a detached sub-tree rooted at `root`
    ///
    /// Main-tree nodes are left alone.
    pub fn free_detached(&mut self, root: NodeId) -> usize {
        if self.tree.is_attached(root) {
            return 0;
        }
        self.tree.remove_subtree(root).len()
    }

    /// Move every `watch` that no longer resolves back to its tab's anchor
    ///
    /// Returns the tabs that were re-centred.
    pub fn recentre_orphaned_watches(&mut self) -> Vec<TabId> {
        let tree = &self.tree;
        self.tabs
            .iter_mut()
            .filter(|(_, record)| !tree.contains(record.watch))
            .map(|(id, record)| {
                record.watch = record.anchor;
                id
            })
            .collect()
    }

    /// Tab ids in registration order
    #[must_use]
    pub fn tab_ids(&self) -> Vec<TabId> {
        self.tabs.iter().map(|(id, _)| id).collect()
    }
}
