//! Stitching strategies
//!
//! When a tab shows up that the registry does not know, the engine may try
//! to attach it to an existing node before falling back to a fresh one.

use crate::types::TabMetadata;
use hopscotch_tree::{NodeId, Tree};

/// Strategy for placing an unknown tab on an existing node
pub trait StitchStrategy: Send + Sync {
    /// Return the node the tab should be anchored at, if any
    fn stitch(&self, tree: &Tree, tab: &TabMetadata) -> Option<NodeId>;
}

/// Never stitches; every unknown tab takes the fallback path
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStitch;

impl StitchStrategy for NoStitch {
    fn stitch(&self, _tree: &Tree, _tab: &TabMetadata) -> Option<NodeId> {
        None
    }
}

/// Stitches onto the first main-tree node (pre-order) with the same URL
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlMatchStitch;

impl StitchStrategy for UrlMatchStitch {
    fn stitch(&self, tree: &Tree, tab: &TabMetadata) -> Option<NodeId> {
        if tab.url.is_empty() {
            return None;
        }
        tree.subtree(tree.root())
            .into_iter()
            .skip(1)
            .find(|id| tree.url(*id) == Some(tab.url.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopscotch_tree::page;

    fn meta(url: &str) -> TabMetadata {
        TabMetadata {
            title: "t".to_string(),
            url: url.to_string(),
            opener_tab_id: None,
        }
    }

    #[test]
    fn no_stitch_always_fails() {
        let tree = Tree::new();
        assert_eq!(NoStitch.stitch(&tree, &meta("https://a.com")), None);
    }

    #[test]
    fn url_match_prefers_pre_order() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = tree.attach_child(root, page("A", "https://a.com"));
        let deep = tree.attach_child(a, page("X", "https://x.com"));
        tree.attach_child(root, page("X again", "https://x.com"));

        assert_eq!(UrlMatchStitch.stitch(&tree, &meta("https://x.com")), Some(deep));
    }

    #[test]
    fn url_match_ignores_detached_nodes() {
        let mut tree = Tree::new();
        tree.create_detached(page("X", "https://x.com"));

        assert_eq!(UrlMatchStitch.stitch(&tree, &meta("https://x.com")), None);
        assert_eq!(UrlMatchStitch.stitch(&tree, &meta("")), None);
    }
}
