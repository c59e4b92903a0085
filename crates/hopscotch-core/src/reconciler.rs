//! Navigation reconciler
//!
//! Decides where a committed navigation lands in the tree. The decision is a
//! pure function of the current state, the configuration and the commit;
//! the engine only has to make sure the tab is registered first.
//!
//! Checks run in a fixed order:
//! 1. A pending `stall` swallows the commit.
//! 2. A plain reload of the anchor's URL is ignored.
//! 3. Typed / bookmarked URLs may re-home the tab (`urlTypedAction`).
//! 4. With simplification on, placeholders are collapsed and the parent or
//!    an existing child is reused.
//! 5. Otherwise a new child of the anchor is created.

use crate::config::{Config, UrlTypedAction};
use crate::error::RegistryError;
use crate::registry::TabFlags;
use crate::state::HistoryState;
use crate::types::NavigationCommit;
use hopscotch_tree::{page, NodeId, URL_KEY};
use serde::Serialize;

/// What a commit did to the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "node", rename_all = "camelCase")]
pub enum Reconciliation {
    /// Sub-frame commit; nothing to do
    Ignored,
    /// The commit was expected and has been consumed
    StallConsumed,
    /// Reload of the current page
    ReloadSuppressed,
    /// Tab moved into a fresh private sub-tree
    Detached(NodeId),
    /// Tab moved onto a fresh node under root
    Branched(NodeId),
    /// A new-tab placeholder now carries the committed URL
    PlaceholderRewritten(NodeId),
    /// Tab moved back to its parent
    Receded(NodeId),
    /// Tab moved to an existing child
    Revisited(NodeId),
    /// New child created and pointed at
    Extended(NodeId),
}

impl Reconciliation {
    /// Node created by this outcome, if any
    #[must_use]
    pub fn created(&self) -> Option<NodeId> {
        match self {
            Self::Detached(id) | Self::Branched(id) | Self::Extended(id) => Some(*id),
            _ => None,
        }
    }

    /// Node the outcome concerns, if any
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::Ignored | Self::StallConsumed | Self::ReloadSuppressed => None,
            Self::Detached(id)
            | Self::Branched(id)
            | Self::PlaceholderRewritten(id)
            | Self::Receded(id)
            | Self::Revisited(id)
            | Self::Extended(id) => Some(*id),
        }
    }
}

/// Apply a committed navigation to the state
///
/// # Errors
/// Returns [`RegistryError::UnknownTab`] if the tab has no record
pub fn reconcile(
    state: &mut HistoryState,
    config: &Config,
    commit: &NavigationCommit,
) -> Result<Reconciliation, RegistryError> {
    let tab = commit.tab_id;
    let url = commit.url.as_str();

    if !commit.is_top_level() {
        return Ok(Reconciliation::Ignored);
    }

    let record = state.tabs.get_mut(tab)?;
    if record.flags.stall {
        record.flags.stall = false;
        return Ok(Reconciliation::StallConsumed);
    }
    let anchor = record.anchor;

    if commit.is_plain_reload() && state.tree.url(anchor) == Some(url) {
        return Ok(Reconciliation::ReloadSuppressed);
    }

    if commit.is_direct_entry() {
        match config.url_typed_action {
            UrlTypedAction::SubBranch => {}
            UrlTypedAction::Prompt => {
                let node = state.tree.create_detached(page(url, url));
                rehome(state, commit, node, TabFlags::lost(), Some(node));
                return Ok(Reconciliation::Detached(node));
            }
            UrlTypedAction::NewBranch => {
                let root = state.tree.root();
                let node = state.tree.attach_child(root, page(url, url));
                state.tabs.point_tab(tab, node, config.browser_navigation)?;
                let record = state.tabs.get_mut(tab)?;
                record.flags.lost = false;
                if let Some(detached) = record.detached_root.take() {
                    state.free_detached(detached);
                    state.recentre_orphaned_watches();
                }
                return Ok(Reconciliation::Branched(node));
            }
        }
    }

    // The anchor can vanish under a tab whose close is still in flight
    if !state.tree.contains(anchor) {
        let root = state.tree.root();
        let node = state.tree.attach_child(root, page(url, url));
        state.tabs.point_tab(tab, node, config.browser_navigation)?;
        return Ok(Reconciliation::Extended(node));
    }

    if config.tree_simplification {
        if let Some(outcome) = simplify(state, config, commit, anchor)? {
            return Ok(outcome);
        }
    }

    let node = state.tree.attach_child(anchor, page(url, url));
    state.tabs.point_tab(tab, node, config.browser_navigation)?;
    Ok(Reconciliation::Extended(node))
}

fn simplify(
    state: &mut HistoryState,
    config: &Config,
    commit: &NavigationCommit,
    current: NodeId,
) -> Result<Option<Reconciliation>, RegistryError> {
    let url = commit.url.as_str();
    let is_placeholder =
        |id: NodeId, state: &HistoryState| state.tree.url(id).is_some_and(|u| config.new_tab_pattern.is_match(u));

    if is_placeholder(current, state) {
        rewrite_url(state, current, url);
        return Ok(Some(Reconciliation::PlaceholderRewritten(current)));
    }

    if let Some(parent) = state.tree.parent(current) {
        if is_placeholder(parent, state) {
            rewrite_url(state, parent, url);
            return Ok(Some(Reconciliation::PlaceholderRewritten(parent)));
        }
        if state.tree.url(parent) == Some(url) {
            state.tabs.point_tab(commit.tab_id, parent, config.browser_navigation)?;
            return Ok(Some(Reconciliation::Receded(parent)));
        }
    }

    if let Some(child) = state.tree.find_child_by_url(current, url) {
        state.tabs.point_tab(commit.tab_id, child, config.browser_navigation)?;
        return Ok(Some(Reconciliation::Revisited(child)));
    }

    Ok(None)
}

fn rewrite_url(state: &mut HistoryState, id: NodeId, url: &str) {
    if let Some(node) = state.tree.node_mut(id) {
        node.set(URL_KEY, url);
    }
}

/// Re-register the tab at `node`, dropping any private sub-tree it had
fn rehome(
    state: &mut HistoryState,
    commit: &NavigationCommit,
    node: NodeId,
    flags: TabFlags,
    detached_root: Option<NodeId>,
) {
    let previous = state
        .tabs
        .create_tab(commit.tab_id, node, flags, detached_root);
    if let Some(previous) = previous {
        state.release_detached(&previous);
        state.recentre_orphaned_watches();
    }
}
