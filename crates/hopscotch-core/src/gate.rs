//! Validation gate
//!
//! Every handler makes sure its tab is registered before touching the tree.
//! Registering an unknown tab needs a host lookup, so concurrent handlers for
//! the same tab queue on a per-tab lock and re-check the registry once they
//! hold it; only the first one performs the lookup.

use crate::config::{Config, StitchFallback};
use crate::lifecycle;
use crate::state::HistoryState;
use crate::stitch::StitchStrategy;
use crate::types::{TabId, TabMetadata};
use dashmap::DashMap;
use hopscotch_tree::NodeId;
use std::sync::Arc;
use tokio::sync::Mutex;

/// How an unknown tab was placed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Grafted onto an existing node
    Stitched(NodeId),
    /// Fresh node under root
    NewBranch(NodeId),
    /// Fresh private node, tab flagged lost
    Lost(NodeId),
}

impl Placement {
    /// Node the tab is anchored at
    #[must_use]
    pub fn node(&self) -> NodeId {
        match self {
            Self::Stitched(id) | Self::NewBranch(id) | Self::Lost(id) => *id,
        }
    }
}

/// Register a tab the registry has never seen
///
/// Tries the stitch strategy first (when enabled), then applies the
/// configured fallback.
pub fn place_unknown(
    state: &mut HistoryState,
    config: &Config,
    stitcher: &dyn StitchStrategy,
    tab: TabId,
    meta: &TabMetadata,
) -> Placement {
    if config.attempt_stitching {
        if let Some(node) = stitcher.stitch(&state.tree, meta) {
            lifecycle::open_at(state, tab, node);
            return Placement::Stitched(node);
        }
    }

    match config.stitch_fallback {
        StitchFallback::NewBranch => Placement::NewBranch(lifecycle::open_new_branch(state, tab, meta)),
        StitchFallback::Prompt => Placement::Lost(lifecycle::open_prompt(state, tab, meta)),
    }
}

/// Per-tab locks for in-flight validations
#[derive(Debug, Default)]
pub struct ValidationGate {
    pending: DashMap<TabId, Arc<Mutex<()>>>,
}

impl ValidationGate {
    /// Create an empty gate
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock shared by every validation of `tab` currently in flight
    #[must_use]
    pub fn slot(&self, tab: TabId) -> Arc<Mutex<()>> {
        // Clone out so the shard guard is dropped before anyone awaits
        Arc::clone(self.pending.entry(tab).or_default().value())
    }

    /// Drop the slot once a validation has settled
    ///
    /// A newer slot handed out after `slot` was removed is left in place.
    pub fn release(&self, tab: TabId, slot: &Arc<Mutex<()>>) {
        self.pending.remove_if(&tab, |_, current| Arc::ptr_eq(current, slot));
    }

    /// Whether a validation of `tab` is in flight
    #[must_use]
    pub fn is_pending(&self, tab: TabId) -> bool {
        self.pending.contains_key(&tab)
    }

    /// Number of tabs with a validation in flight
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }
}
