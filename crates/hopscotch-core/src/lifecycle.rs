//! Tab lifecycle
//!
//! Registration, removal and renaming of tabs. These are plain state
//! transitions; whichever of them needs a host lookup first (sub-branching
//! from an opener) is sequenced by the engine.

use crate::registry::{TabFlags, TabRecord};
use crate::state::HistoryState;
use crate::types::{TabId, TabMetadata};
use hopscotch_tree::{page, NodeId, NAME_KEY};

/// Register a tab on a fresh node under root
pub fn open_new_branch(state: &mut HistoryState, tab: TabId, meta: &TabMetadata) -> NodeId {
    let root = state.tree.root();
    let node = state.tree.attach_child(root, page(&meta.title, &meta.url));
    install(state, tab, node, TabFlags::default(), None);
    node
}

/// Register a tab on a fresh private node, flagged lost
pub fn open_prompt(state: &mut HistoryState, tab: TabId, meta: &TabMetadata) -> NodeId {
    let node = state.tree.create_detached(page(&meta.title, &meta.url));
    install(state, tab, node, TabFlags::lost(), Some(node));
    node
}

/// Register a tab on an existing node without creating one
pub fn open_at(state: &mut HistoryState, tab: TabId, node: NodeId) {
    install(state, tab, node, TabFlags::default(), None);
}

/// Forget a closed tab
///
/// The id is retired so a lookup that is still in flight cannot register it
/// again. Main-tree nodes stay as history; a private sub-tree is freed.
pub fn close(state: &mut HistoryState, tab: TabId) -> Option<TabRecord> {
    state.retired.insert(tab);
    let record = state.tabs.remove_tab(tab).ok()?;
    state.release_detached(&record);
    Some(record)
}

/// Rename the tab's anchor node
///
/// Returns false if the tab is not tracked.
pub fn rename(state: &mut HistoryState, tab: TabId, title: &str) -> bool {
    let Ok(record) = state.tabs.get(tab) else {
        return false;
    };
    let anchor = record.anchor;
    match state.tree.node_mut(anchor) {
        Some(node) => {
            node.set(NAME_KEY, title);
            true
        }
        None => false,
    }
}

fn install(
    state: &mut HistoryState,
    tab: TabId,
    node: NodeId,
    flags: TabFlags,
    detached_root: Option<NodeId>,
) {
    state.retired.remove(&tab);
    state.departed.remove(&tab);
    if let Some(previous) = state.tabs.create_tab(tab, node, flags, detached_root) {
        if previous.detached_root != detached_root {
            state.release_detached(&previous);
            state.recentre_orphaned_watches();
        }
    }
}
