//! Script replay
//!
//! A script is a JSON array of steps, each either a browser event or a page
//! UI request:
//!
//! ```json
//! [
//!   {"event": {"type": "tabCreated", "id": 1, "title": "Start", "url": "https://a.com"}},
//!   {"event": {"type": "navigationCommitted", "tabId": 1, "url": "https://b.com", "transitionType": "link"}},
//!   {"request": {"tabId": 1, "message": {"action": "fetchLinks"}}}
//! ]
//! ```
//!
//! The host answering the engine only knows what the script has shown it.

use anyhow::{Context, Result};
use hopscotch_core::{
    BrowserEvent, BrowserHost, Config, Engine, HostCommand, HostError, PageSignal, TabId,
    TabMetadata, UiRequest, UiResponse,
};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

/// One scripted step
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum Step {
    /// Browser event
    Event(BrowserEvent),
    /// Page UI request
    Request(ScriptedRequest),
}

/// UI request issued from a tab
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScriptedRequest {
    pub(crate) tab_id: TabId,
    pub(crate) message: UiRequest,
}

/// Read a script file
pub(crate) fn load_script(path: &Path) -> Result<Vec<Step>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid script {}", path.display()))
}

/// Browser stand-in fed by the script itself
#[derive(Debug, Default)]
pub(crate) struct ScriptedHost {
    tabs: Mutex<HashMap<TabId, TabMetadata>>,
    closed: Mutex<HashSet<TabId>>,
    log: Mutex<Vec<HostCommand>>,
}

impl ScriptedHost {
    /// Host that already knows every tab the script creates
    pub(crate) fn from_steps(steps: &[Step]) -> Self {
        let host = Self::default();
        for step in steps {
            if let Step::Event(BrowserEvent::TabCreated(info)) = step {
                host.tabs.lock().insert(info.id, info.metadata());
            }
        }
        host
    }

    /// Keep tab metadata in line with the event about to be delivered
    pub(crate) fn observe(&self, event: &BrowserEvent) {
        let mut tabs = self.tabs.lock();
        let mut closed = self.closed.lock();
        match event {
            BrowserEvent::TabCreated(info) => {
                closed.remove(&info.id);
                tabs.insert(info.id, info.metadata());
            }
            BrowserEvent::TabRemoved(removal) => {
                closed.insert(removal.tab_id);
                tabs.remove(&removal.tab_id);
            }
            BrowserEvent::TabUpdated(update) => {
                if let (Some(meta), Some(title)) = (tabs.get_mut(&update.tab_id), &update.title) {
                    meta.title.clone_from(title);
                }
            }
            // A closed tab stays closed; late commits for it are stale
            BrowserEvent::NavigationCommitted(commit)
                if commit.is_top_level() && !closed.contains(&commit.tab_id) =>
            {
                tabs.entry(commit.tab_id).or_default().url.clone_from(&commit.url);
            }
            BrowserEvent::NavigationCommitted(_) | BrowserEvent::DomContentLoaded(_) => {}
        }
    }

    /// Commands received so far
    pub(crate) fn commands(&self) -> Vec<HostCommand> {
        self.log.lock().clone()
    }

    fn record(&self, command: HostCommand) {
        tracing::info!("Host command: {:?}", command);
        self.log.lock().push(command);
    }
}

#[async_trait::async_trait]
impl BrowserHost for ScriptedHost {
    async fn tab_metadata(&self, tab: TabId) -> Result<TabMetadata, HostError> {
        self.tabs
            .lock()
            .get(&tab)
            .cloned()
            .ok_or(HostError::TabNotFound(tab))
    }

    async fn close_tab(&self, tab: TabId) -> Result<(), HostError> {
        self.record(HostCommand::CloseTab(tab));
        self.tabs.lock().remove(&tab);
        self.closed.lock().insert(tab);
        Ok(())
    }

    async fn navigate_tab(&self, tab: TabId, url: &str) -> Result<(), HostError> {
        self.record(HostCommand::Navigate {
            tab,
            url: url.to_string(),
        });
        Ok(())
    }

    async fn signal(&self, tab: TabId, signal: PageSignal) -> Result<(), HostError> {
        self.record(HostCommand::Signal { tab, signal });
        Ok(())
    }
}

/// Outcome of a replay
#[derive(Debug)]
pub(crate) struct Replay {
    pub(crate) engine: Engine,
    pub(crate) host: Arc<ScriptedHost>,
    pub(crate) responses: Vec<(TabId, UiResponse)>,
    pub(crate) failures: usize,
}

/// Drive an engine through the steps
pub(crate) async fn run(steps: &[Step], config: Config) -> Replay {
    let host = Arc::new(ScriptedHost::from_steps(steps));
    let engine = Engine::new(config, Arc::clone(&host) as Arc<dyn BrowserHost>);
    let mut responses = Vec::new();
    let mut failures = 0;

    for (index, step) in steps.iter().enumerate() {
        let result = match step {
            Step::Event(event) => {
                host.observe(event);
                engine.dispatch(event).await
            }
            Step::Request(request) => engine
                .handle_request(request.tab_id, &request.message)
                .await
                .map(|response| responses.push((request.tab_id, response))),
        };

        if let Err(err) = result {
            failures += 1;
            tracing::warn!("Step {} failed: {}", index, err);
        }
    }

    Replay {
        engine,
        host,
        responses,
        failures,
    }
}

impl Replay {
    /// Indented tree dump, followed by lost branches and tab positions
    pub(crate) fn render_text(&self) -> String {
        self.engine.read(|state| {
            let tree = &state.tree;
            let mut out = tree.render(tree.root());

            for (id, record) in state.tabs.iter() {
                let place = tree
                    .node(record.anchor)
                    .and_then(|node| node.url().or(node.name()))
                    .unwrap_or("?");
                let _ = write!(out, "\ntab {id} at {} <{place}>", record.anchor);
                if record.is_lost() {
                    out.push_str(" (lost)");
                }
                if let Some(detached) = record.detached_root {
                    for line in tree.render(detached).lines() {
                        let _ = write!(out, "\n  | {line}");
                    }
                }
            }
            out.push('\n');
            out
        })
    }

    /// Machine-readable summary
    pub(crate) fn summary(&self) -> Value {
        let (nodes, tabs) = self.engine.read(|state| {
            let tree = &state.tree;
            let mut starts = vec![tree.root()];
            starts.extend(state.tabs.iter().filter_map(|(_, record)| record.detached_root));

            let nodes: Vec<Value> = starts
                .into_iter()
                .flat_map(|start| tree.subtree(start))
                .filter_map(|id| {
                    tree.node(id).map(|node| {
                        json!({
                            "id": id.index(),
                            "parent": node.parent().map(|p| p.index()),
                            "depth": node.depth(),
                            "data": node.data(),
                        })
                    })
                })
                .collect();

            let tabs: Vec<Value> = state
                .tabs
                .iter()
                .map(|(id, record)| {
                    json!({
                        "tabId": id,
                        "anchor": record.anchor.index(),
                        "watch": record.watch.index(),
                        "lost": record.flags.lost,
                        "stall": record.flags.stall,
                    })
                })
                .collect();
            (nodes, tabs)
        });

        let responses: Vec<Value> = self
            .responses
            .iter()
            .map(|(tab, response)| json!({ "tabId": tab, "response": response }))
            .collect();

        json!({
            "nodes": nodes,
            "tabs": tabs,
            "responses": responses,
            "commands": self.host.commands(),
            "failures": self.failures,
        })
    }
}
