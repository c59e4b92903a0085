//! Testing utilities for hopscotch workspace
//!
//! Shared fake browser host and engine fixtures.

#![allow(missing_docs)]

use hopscotch_core::{
    BrowserHost, Config, Engine, HostCommand, HostError, PageSignal, TabId, TabInfo, TabMetadata,
};
use hopscotch_tree::NodeId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// In-memory browser that records every command it receives
///
/// A gated host holds every metadata lookup until [`RecordingHost::release`]
/// is called, which lets tests interleave events with a pending lookup.
#[derive(Debug)]
pub struct RecordingHost {
    tabs: Mutex<HashMap<TabId, TabMetadata>>,
    failures: Mutex<HashMap<TabId, HostError>>,
    commands: Mutex<Vec<HostCommand>>,
    lookups: AtomicUsize,
    gate: Option<watch::Sender<bool>>,
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingHost {
    pub fn new() -> Self {
        Self {
            tabs: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            commands: Mutex::new(Vec::new()),
            lookups: AtomicUsize::new(0),
            gate: None,
        }
    }

    /// Host whose lookups block until released
    pub fn gated() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            gate: Some(sender),
            ..Self::new()
        }
    }

    /// Let every pending and future lookup through
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.send_replace(true);
        }
    }

    /// Make a tab known to the browser
    pub fn open(&self, id: TabId, title: &str, url: &str) -> TabInfo {
        let info = TabInfo::new(id, title, url);
        self.tabs.lock().insert(id, info.metadata());
        info
    }

    /// Make a tab known to the browser with an opener
    pub fn open_from(&self, id: TabId, opener: TabId, title: &str, url: &str) -> TabInfo {
        let info = TabInfo::new(id, title, url).with_opener(opener);
        self.tabs.lock().insert(id, info.metadata());
        info
    }

    /// Forget a tab, as if the user closed it
    pub fn forget(&self, id: TabId) {
        self.tabs.lock().remove(&id);
    }

    /// Answer lookups for `id` with an error
    pub fn fail_lookup(&self, id: TabId, error: HostError) {
        self.failures.lock().insert(id, error);
    }

    /// Number of metadata lookups performed (or started)
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Yield until at least `count` lookups have started
    pub async fn wait_for_lookups(&self, count: usize) {
        while self.lookups() < count {
            tokio::task::yield_now().await;
        }
    }

    /// Every command received, in order
    pub fn commands(&self) -> Vec<HostCommand> {
        self.commands.lock().clone()
    }

    /// Tabs the engine asked to close, in order
    pub fn closed_tabs(&self) -> Vec<TabId> {
        self.commands
            .lock()
            .iter()
            .filter_map(|command| match command {
                HostCommand::CloseTab(tab) => Some(*tab),
                _ => None,
            })
            .collect()
    }

    /// Signals delivered to page UIs, in order
    pub fn signals(&self) -> Vec<(TabId, PageSignal)> {
        self.commands
            .lock()
            .iter()
            .filter_map(|command| match command {
                HostCommand::Signal { tab, signal } => Some((*tab, *signal)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl BrowserHost for RecordingHost {
    async fn tab_metadata(&self, tab: TabId) -> Result<TabMetadata, HostError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            let mut open = gate.subscribe();
            // The sender lives in `self`, so the channel cannot close here
            let _ = open.wait_for(|released| *released).await;
        }

        if let Some(error) = self.failures.lock().get(&tab).cloned() {
            return Err(error);
        }
        self.tabs
            .lock()
            .get(&tab)
            .cloned()
            .ok_or(HostError::TabNotFound(tab))
    }

    async fn close_tab(&self, tab: TabId) -> Result<(), HostError> {
        self.commands.lock().push(HostCommand::CloseTab(tab));
        self.tabs.lock().remove(&tab);
        Ok(())
    }

    async fn navigate_tab(&self, tab: TabId, url: &str) -> Result<(), HostError> {
        self.commands.lock().push(HostCommand::Navigate {
            tab,
            url: url.to_string(),
        });
        if let Some(meta) = self.tabs.lock().get_mut(&tab) {
            meta.url = url.to_string();
        }
        Ok(())
    }

    async fn signal(&self, tab: TabId, signal: PageSignal) -> Result<(), HostError> {
        self.commands.lock().push(HostCommand::Signal { tab, signal });
        Ok(())
    }
}

/// Engine wired to a fresh recording host
pub fn engine_with(config: Config) -> (Engine, Arc<RecordingHost>) {
    engine_on(config, RecordingHost::new())
}

/// Engine wired to the given host
pub fn engine_on(config: Config, host: RecordingHost) -> (Engine, Arc<RecordingHost>) {
    let host = Arc::new(host);
    let engine = Engine::new(config, Arc::clone(&host) as Arc<dyn BrowserHost>);
    (engine, host)
}

/// Engine with default configuration
pub fn setup_test_engine() -> (Engine, Arc<RecordingHost>) {
    engine_with(Config::default())
}

/// Current anchor of a tab
pub fn anchor(engine: &Engine, tab: TabId) -> NodeId {
    engine.read(|state| state.tabs.get(tab).unwrap().anchor)
}

/// Current watch of a tab
pub fn watch(engine: &Engine, tab: TabId) -> NodeId {
    engine.read(|state| state.tabs.get(tab).unwrap().watch)
}

/// URL of a node
pub fn url_of(engine: &Engine, node: NodeId) -> Option<String> {
    engine.read(|state| state.tree.url(node).map(str::to_string))
}

/// Number of live nodes, root included
pub fn node_count(engine: &Engine) -> usize {
    engine.read(|state| state.tree.len())
}
