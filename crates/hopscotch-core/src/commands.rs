//! Page UI protocol
//!
//! The injected page UI talks to the engine with small tagged JSON messages.
//! Handles are URLs: every command that takes one looks it up among the
//! children of the requesting tab's `watch` node (or of root, for
//! `resolve`).

use crate::config::Config;
use crate::error::RegistryError;
use crate::host::HostCommand;
use crate::lifecycle;
use crate::state::HistoryState;
use crate::types::TabId;
use hopscotch_tree::NodeId;
use serde::{Deserialize, Serialize};

/// Request from a tab's page UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum UiRequest {
    /// List the children of the watched node
    FetchLinks,
    /// Read the active configuration
    GetConfig,
    /// Move the watched node up one level
    #[serde(rename = "backstep")]
    Backstep,
    /// Move the watched node to a child
    #[serde(rename = "stepinto")]
    StepInto {
        /// URL of the child
        handle: String,
    },
    /// Navigate the tab to a child of the watched node
    Navigate {
        /// URL of the child
        handle: String,
    },
    /// Delete a child of the watched node with its sub-tree
    Remove {
        /// URL of the child
        handle: String,
    },
    /// Graft a lost tab's private branch into the main tree
    Resolve {
        /// URL of the root child to graft under; root itself when absent
        #[serde(default)]
        handle: Option<String>,
    },
}

impl UiRequest {
    /// Wire name of the action
    #[must_use]
    pub fn action(&self) -> &'static str {
        match self {
            Self::FetchLinks => "fetchLinks",
            Self::GetConfig => "getConfig",
            Self::Backstep => "backstep",
            Self::StepInto { .. } => "stepinto",
            Self::Navigate { .. } => "navigate",
            Self::Remove { .. } => "remove",
            Self::Resolve { .. } => "resolve",
        }
    }
}

/// Entry of a link listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Page title
    pub name: String,
    /// Page URL, also the handle for follow-up commands
    pub url: String,
}

/// Answer to a [`UiRequest`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UiResponse {
    /// Children of the watched node
    #[serde(rename_all = "camelCase")]
    Links {
        /// Child links in insertion order
        links: Vec<Link>,
        /// Whether `backstep` can move up
        can_recede: bool,
    },
    /// Active configuration
    Config(Box<Config>),
    /// Outcome of a remove
    Removed {
        /// Whether a matching child was found
        success: bool,
        /// Tabs that were closed by the cascade
        closed: Vec<TabId>,
    },
    /// Outcome of a cursor or navigation command
    Done {
        /// Whether the command took effect
        success: bool,
    },
}

impl UiResponse {
    /// Plain success/failure answer
    #[inline]
    #[must_use]
    pub fn done(success: bool) -> Self {
        Self::Done { success }
    }

    /// Whether the command took effect (listings always do)
    #[must_use]
    pub fn succeeded(&self) -> bool {
        match self {
            Self::Links { .. } | Self::Config(_) => true,
            Self::Removed { success, .. } | Self::Done { success } => *success,
        }
    }
}

/// Serve a UI request against the state
///
/// Returns the response plus the host commands to run once the state lock
/// is released.
///
/// # Errors
/// Returns [`RegistryError::UnknownTab`] if the requesting tab has no record
pub fn handle(
    state: &mut HistoryState,
    config: &Config,
    tab: TabId,
    request: &UiRequest,
) -> Result<(UiResponse, Vec<HostCommand>), RegistryError> {
    let record = state.tabs.get(tab)?;
    let watch = record.watch;
    let lost = record.is_lost();

    let response = match request {
        UiRequest::FetchLinks => {
            let base = if lost { state.tree.root() } else { watch };
            fetch_links(state, base)
        }
        UiRequest::GetConfig => UiResponse::Config(Box::new(config.clone())),
        UiRequest::Backstep => match state.tree.parent(watch) {
            Some(parent) => {
                state.tabs.get_mut(tab)?.watch = parent;
                UiResponse::done(true)
            }
            None => UiResponse::done(false),
        },
        UiRequest::StepInto { handle } => match state.tree.find_child_by_url(watch, handle) {
            Some(child) => {
                state.tabs.get_mut(tab)?.watch = child;
                UiResponse::done(true)
            }
            None => UiResponse::done(false),
        },
        UiRequest::Navigate { handle } => {
            let Some(child) = state.tree.find_child_by_url(watch, handle) else {
                return Ok((UiResponse::done(false), Vec::new()));
            };
            state.tabs.point_tab(tab, child, config.browser_navigation)?;
            state.tabs.get_mut(tab)?.flags.stall = true;
            let command = HostCommand::Navigate {
                tab,
                url: handle.clone(),
            };
            return Ok((UiResponse::done(true), vec![command]));
        }
        UiRequest::Remove { handle } => {
            let Some(child) = state.tree.find_child_by_url(watch, handle) else {
                return Ok((
                    UiResponse::Removed {
                        success: false,
                        closed: Vec::new(),
                    },
                    Vec::new(),
                ));
            };
            let closed = remove_branch(state, child);
            let commands = closed.iter().copied().map(HostCommand::CloseTab).collect();
            return Ok((
                UiResponse::Removed {
                    success: true,
                    closed,
                },
                commands,
            ));
        }
        UiRequest::Resolve { handle } => UiResponse::done(resolve(state, tab, handle.as_deref())?),
    };

    Ok((response, Vec::new()))
}

fn fetch_links(state: &HistoryState, base: NodeId) -> UiResponse {
    let links = state
        .tree
        .children(base)
        .iter()
        .filter_map(|id| state.tree.node(*id))
        .map(|node| Link {
            name: node.name().unwrap_or_default().to_string(),
            url: node.url().unwrap_or_default().to_string(),
        })
        .collect();

    UiResponse::Links {
        links,
        can_recede: state.tree.parent(base).is_some(),
    }
}

/// Delete `target` with its sub-tree and cascade to the tabs it strands
///
/// Every tab anchored at `target`, or anywhere deeper than `target` in the
/// whole tree, is retired and reported for closing. Surviving tabs whose
/// `watch` was freed fall back to their anchor.
fn remove_branch(state: &mut HistoryState, target: NodeId) -> Vec<TabId> {
    let depth = state.tree.depth(target).unwrap_or(0);
    let doomed: Vec<TabId> = state
        .tabs
        .iter()
        .filter(|(_, record)| {
            record.anchor == target
                || state
                    .tree
                    .depth(record.anchor)
                    .is_some_and(|d| d > depth)
        })
        .map(|(id, _)| id)
        .collect();

    for tab in &doomed {
        lifecycle::close(state, *tab);
    }

    state.tree.remove_subtree(target);
    state.recentre_orphaned_watches();
    doomed
}

/// Copy a lost tab's private branch into the main tree
fn resolve(state: &mut HistoryState, tab: TabId, handle: Option<&str>) -> Result<bool, RegistryError> {
    let record = state.tabs.get(tab)?.clone();
    let Some(detached) = record.detached_root.filter(|_| record.is_lost()) else {
        return Ok(false);
    };

    let root = state.tree.root();
    let parent = match handle {
        Some(url) => match state.tree.find_child_by_url(root, url) {
            Some(child) => child,
            None => return Ok(false),
        },
        None => root,
    };

    let copies = state.tree.graft_copy(detached, parent);
    let Some(anchor) = copies.get(&record.anchor).copied() else {
        return Ok(false);
    };
    let watch = copies
        .get(&record.watch)
        .copied()
        .or_else(|| state.tree.is_attached(record.watch).then_some(record.watch))
        .unwrap_or(anchor);

    let entry = state.tabs.get_mut(tab)?;
    entry.anchor = anchor;
    entry.watch = watch;
    entry.flags.lost = false;
    entry.detached_root = None;

    state.free_detached(detached);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TabMetadata;
    use hopscotch_tree::page;
    use pretty_assertions::assert_eq;

    fn meta(url: &str) -> TabMetadata {
        TabMetadata {
            title: url.to_string(),
            url: url.to_string(),
            opener_tab_id: None,
        }
    }

    #[test]
    fn requests_parse_wire_actions() {
        let step: UiRequest = serde_json::from_str(r#"{"action":"stepinto","handle":"https://a.com"}"#).unwrap();
        assert_eq!(
            step,
            UiRequest::StepInto {
                handle: "https://a.com".to_string()
            }
        );

        let fetch: UiRequest = serde_json::from_str(r#"{"action":"fetchLinks"}"#).unwrap();
        assert_eq!(fetch, UiRequest::FetchLinks);
        assert_eq!(fetch.action(), "fetchLinks");

        let resolve: UiRequest = serde_json::from_str(r#"{"action":"resolve"}"#).unwrap();
        assert_eq!(resolve, UiRequest::Resolve { handle: None });
    }

    #[test]
    fn links_serialize_with_can_recede() {
        let response = UiResponse::Links {
            links: vec![Link {
                name: "A".to_string(),
                url: "https://a.com".to_string(),
            }],
            can_recede: false,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"links": [{"name": "A", "url": "https://a.com"}], "canRecede": false})
        );
    }

    #[test]
    fn backstep_and_stepinto_move_watch_only() {
        let mut state = HistoryState::new();
        let a = lifecycle::open_new_branch(&mut state, TabId(1), &meta("https://a.com"));
        let b = state.tree.attach_child(a, page("B", "https://b.com"));
        let config = Config::default();

        let (response, _) = handle(&mut state, &config, TabId(1), &UiRequest::Backstep).unwrap();
        assert!(response.succeeded());
        assert_eq!(state.tabs.get(TabId(1)).unwrap().watch, state.tree.root());

        let (response, _) = handle(&mut state, &config, TabId(1), &UiRequest::Backstep).unwrap();
        assert!(!response.succeeded());

        let step = |h: &str| UiRequest::StepInto { handle: h.to_string() };
        handle(&mut state, &config, TabId(1), &step("https://a.com")).unwrap();
        handle(&mut state, &config, TabId(1), &step("https://b.com")).unwrap();

        let record = state.tabs.get(TabId(1)).unwrap();
        assert_eq!(record.watch, b);
        assert_eq!(record.anchor, a);
    }

    #[test]
    fn navigate_sets_stall_and_emits_command() {
        let mut state = HistoryState::new();
        let a = lifecycle::open_new_branch(&mut state, TabId(1), &meta("https://a.com"));
        let b = state.tree.attach_child(a, page("B", "https://b.com"));

        let request = UiRequest::Navigate {
            handle: "https://b.com".to_string(),
        };
        let (response, commands) = handle(&mut state, &Config::default(), TabId(1), &request).unwrap();

        assert!(response.succeeded());
        assert_eq!(
            commands,
            vec![HostCommand::Navigate {
                tab: TabId(1),
                url: "https://b.com".to_string()
            }]
        );
        let record = state.tabs.get(TabId(1)).unwrap();
        assert_eq!(record.anchor, b);
        assert!(record.flags.stall);
    }

    #[test]
    fn fetch_links_lists_root_for_lost_tabs() {
        let mut state = HistoryState::new();
        lifecycle::open_new_branch(&mut state, TabId(1), &meta("https://a.com"));
        lifecycle::open_prompt(&mut state, TabId(2), &meta("https://lost.com"));

        let (response, _) = handle(&mut state, &Config::default(), TabId(2), &UiRequest::FetchLinks).unwrap();
        let UiResponse::Links { links, can_recede } = response else {
            panic!("expected links");
        };
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://a.com");
        assert!(!can_recede);
    }

    #[test]
    fn resolve_grafts_under_root_child() {
        let mut state = HistoryState::new();
        let home = lifecycle::open_new_branch(&mut state, TabId(1), &meta("https://home.com"));
        let lost = lifecycle::open_prompt(&mut state, TabId(2), &meta("https://lost.com"));
        let deeper = state.tree.attach_child(lost, page("D", "https://d.com"));
        state.tabs.get_mut(TabId(2)).unwrap().anchor = deeper;

        let request = UiRequest::Resolve {
            handle: Some("https://home.com".to_string()),
        };
        let (response, _) = handle(&mut state, &Config::default(), TabId(2), &request).unwrap();
        assert!(response.succeeded());

        let record = state.tabs.get(TabId(2)).unwrap().clone();
        assert!(!record.is_lost());
        assert_eq!(record.detached_root, None);
        assert_eq!(state.tree.depth(record.anchor), Some(3));
        assert_eq!(state.tree.url(record.anchor), Some("https://d.com"));
        assert_eq!(state.tree.depth(record.watch), Some(2));
        assert_eq!(state.tree.parent(record.watch), Some(home));
        assert!(!state.tree.contains(lost));
    }

    #[test]
    fn resolve_requires_a_lost_tab() {
        let mut state = HistoryState::new();
        lifecycle::open_new_branch(&mut state, TabId(1), &meta("https://a.com"));

        let request = UiRequest::Resolve { handle: None };
        let (response, _) = handle(&mut state, &Config::default(), TabId(1), &request).unwrap();
        assert!(!response.succeeded());
    }

    #[test]
    fn remove_without_match_changes_nothing() {
        let mut state = HistoryState::new();
        lifecycle::open_new_branch(&mut state, TabId(1), &meta("https://a.com"));
        state.tabs.get_mut(TabId(1)).unwrap().watch = state.tree.root();

        let request = UiRequest::Remove {
            handle: "https://nope.com".to_string(),
        };
        let (response, commands) = handle(&mut state, &Config::default(), TabId(1), &request).unwrap();
        assert!(!response.succeeded());
        assert!(commands.is_empty());
        assert_eq!(state.tree.len(), 2);
    }
}
