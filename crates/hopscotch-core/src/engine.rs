//! History engine
//!
//! The engine owns the navigation tree and the tab registry and turns
//! browser events and page-UI requests into changes on them:
//! - Unknown tabs pass through the validation gate first
//! - Lifecycle events register, forget and rename tabs
//! - Navigation commits go through the reconciler
//! - UI requests move cursors, navigate, prune and resolve
//!
//! State lives behind a synchronous lock that is never held across an
//! `.await`. Host side effects are collected while it is held and run once
//! it is released.

use crate::commands::{self, UiRequest, UiResponse};
use crate::config::{Config, NewTabAction};
use crate::error::{EngineError, HostError};
use crate::gate::{self, ValidationGate};
use crate::host::{BrowserHost, HostCommand};
use crate::lifecycle;
use crate::reconciler::{self, Reconciliation};
use crate::state::HistoryState;
use crate::stitch::{NoStitch, StitchStrategy};
use crate::types::{
    BrowserEvent, FrameEvent, NavigationCommit, PageSignal, TabId, TabInfo, TabMetadata,
    TabUpdate, TOP_LEVEL_FRAME,
};
use hopscotch_tree::NodeId;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Browsing-history engine
pub struct Engine {
    /// Active configuration
    config: Config,
    /// Tree, registry and retired tabs
    state: Mutex<HistoryState>,
    /// Browser access
    host: Arc<dyn BrowserHost>,
    /// Placement of unknown tabs onto existing nodes
    stitcher: Arc<dyn StitchStrategy>,
    /// In-flight validations
    gate: ValidationGate,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create an engine with an empty tree
    #[must_use]
    pub fn new(config: Config, host: Arc<dyn BrowserHost>) -> Self {
        Self {
            config,
            state: Mutex::new(HistoryState::new()),
            host,
            stitcher: Arc::new(NoStitch),
            gate: ValidationGate::new(),
        }
    }

    /// Create with custom stitch strategy
    #[must_use]
    pub fn with_stitcher(mut self, stitcher: Arc<dyn StitchStrategy>) -> Self {
        self.stitcher = stitcher;
        self
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Inspect the state under the lock
    pub fn read<R>(&self, f: impl FnOnce(&HistoryState) -> R) -> R {
        f(&self.state.lock())
    }

    /// Copy of the current state
    #[must_use]
    pub fn snapshot(&self) -> HistoryState {
        self.state.lock().clone()
    }

    /// Route a browser event to its handler
    ///
    /// # Errors
    /// Returns the handler's error
    pub async fn dispatch(&self, event: &BrowserEvent) -> Result<(), EngineError> {
        match event {
            BrowserEvent::TabCreated(info) => {
                self.on_tab_created(info).await?;
            }
            BrowserEvent::TabRemoved(removal) => {
                self.on_tab_removed(removal.tab_id);
            }
            BrowserEvent::TabUpdated(update) => {
                self.on_tab_updated(update);
            }
            BrowserEvent::NavigationCommitted(commit) => {
                self.on_navigation_committed(commit).await?;
            }
            BrowserEvent::DomContentLoaded(frame) => {
                self.on_frame_content_loaded(*frame).await?;
            }
        }
        Ok(())
    }

    /// Make sure the tab has a record, looking it up on the host if needed
    ///
    /// Concurrent calls for the same tab share one lookup.
    ///
    /// # Errors
    /// Returns [`EngineError::TabClosed`] if the tab is gone
    pub async fn validate(&self, tab: TabId) -> Result<(), EngineError> {
        if self.is_registered(tab)? {
            return Ok(());
        }

        let slot = self.gate.slot(tab);
        let turn = slot.lock().await;
        let result = self.validate_exclusive(tab).await;
        drop(turn);
        self.gate.release(tab, &slot);

        // Last one out forgets a tab the host has since removed
        if !self.gate.is_pending(tab) {
            self.state.lock().forget_departed(tab);
        }
        result
    }

    async fn validate_exclusive(&self, tab: TabId) -> Result<(), EngineError> {
        // Someone else may have finished while we queued
        if self.is_registered(tab)? {
            return Ok(());
        }

        let meta = match self.host.tab_metadata(tab).await {
            Ok(meta) => meta,
            Err(HostError::TabNotFound(_)) => {
                tracing::debug!("Tab {} vanished before it could be placed", tab);
                return Err(EngineError::TabClosed(tab));
            }
            Err(err) => {
                tracing::warn!("Metadata lookup for tab {} failed, placing it blind: {}", tab, err);
                TabMetadata::default()
            }
        };

        let mut state = self.state.lock();
        if state.is_retired(tab) {
            tracing::debug!("Tab {} closed during lookup, not registering", tab);
            return Err(EngineError::TabClosed(tab));
        }
        if state.tabs.contains(tab) {
            return Ok(());
        }

        let placement = gate::place_unknown(&mut state, &self.config, self.stitcher.as_ref(), tab, &meta);
        tracing::info!(tab = %tab, url = %meta.url, "Registered unknown tab: {:?}", placement);
        Ok(())
    }

    fn is_registered(&self, tab: TabId) -> Result<bool, EngineError> {
        let state = self.state.lock();
        if state.is_retired(tab) {
            return Err(EngineError::TabClosed(tab));
        }
        Ok(state.tabs.contains(tab))
    }

    /// Register a newly opened tab according to `newTabAction`
    ///
    /// Returns the node the tab is anchored at.
    ///
    /// # Errors
    /// Returns [`EngineError::TabClosed`] if the tab closed while its opener
    /// was being looked up
    pub async fn on_tab_created(&self, info: &TabInfo) -> Result<NodeId, EngineError> {
        let tab = info.id;
        let meta = info.metadata();

        let node = match self.config.new_tab_action {
            NewTabAction::SubBranch => self.open_sub_branch(info).await?,
            action => {
                let mut state = self.state.lock();
                if action == NewTabAction::Prompt {
                    lifecycle::open_prompt(&mut state, tab, &meta)
                } else {
                    lifecycle::open_new_branch(&mut state, tab, &meta)
                }
            }
        };

        tracing::info!("Tab {} created at {}", tab, node);
        Ok(node)
    }

    async fn open_sub_branch(&self, info: &TabInfo) -> Result<NodeId, EngineError> {
        let tab = info.id;
        let Some(opener) = info.opener_tab_id.filter(|opener| *opener != tab) else {
            self.validate(tab).await?;
            return self.anchor_of(tab);
        };

        let validated = self.validate(opener).await;
        if let Err(err) = &validated {
            tracing::warn!("Opener {} of tab {} unavailable, opening new branch: {}", opener, tab, err);
        }

        let mut state = self.state.lock();
        if state.is_retired(tab) {
            return Err(EngineError::TabClosed(tab));
        }
        // Registered by one of its own events while the opener was looked up
        if let Ok(record) = state.tabs.get(tab) {
            tracing::debug!("Tab {} placed while its opener was looked up, keeping {}", tab, record.anchor);
            return Ok(record.anchor);
        }

        let anchor = state
            .tabs
            .get(opener)
            .ok()
            .filter(|record| !record.is_lost() && state.tree.contains(record.anchor))
            .map(|record| record.anchor);

        Ok(match anchor {
            Some(node) => {
                lifecycle::open_at(&mut state, tab, node);
                node
            }
            None => lifecycle::open_new_branch(&mut state, tab, &info.metadata()),
        })
    }

    fn anchor_of(&self, tab: TabId) -> Result<NodeId, EngineError> {
        Ok(self.state.lock().tabs.get(tab)?.anchor)
    }

    /// Forget a closed tab
    ///
    /// Returns false if the tab was not tracked.
    pub fn on_tab_removed(&self, tab: TabId) -> bool {
        let mut state = self.state.lock();
        let removed = lifecycle::close(&mut state, tab);
        state.confirm_departed(tab);
        if !self.gate.is_pending(tab) {
            state.forget_departed(tab);
        }
        drop(state);

        if removed.is_some() {
            tracing::info!("Tab {} removed", tab);
        }
        removed.is_some()
    }

    /// Apply a title change to the tab's anchor
    ///
    /// Returns false if nothing was renamed.
    pub fn on_tab_updated(&self, update: &TabUpdate) -> bool {
        let Some(title) = update.title.as_deref() else {
            return false;
        };
        lifecycle::rename(&mut self.state.lock(), update.tab_id, title)
    }

    /// Reconcile a committed navigation
    ///
    /// # Errors
    /// Returns error if the tab cannot be validated
    pub async fn on_navigation_committed(
        &self,
        commit: &NavigationCommit,
    ) -> Result<Reconciliation, EngineError> {
        self.validate(commit.tab_id).await?;

        let outcome = {
            let mut state = self.state.lock();
            reconciler::reconcile(&mut state, &self.config, commit)?
        };

        tracing::debug!(tab = %commit.tab_id, url = %commit.url, "Navigation reconciled: {:?}", outcome);
        Ok(outcome)
    }

    /// Ask a lost tab's page to resolve its location once it has loaded
    ///
    /// Returns whether a signal was sent.
    ///
    /// # Errors
    /// Returns error if the tab cannot be validated
    pub async fn on_frame_content_loaded(&self, frame: FrameEvent) -> Result<bool, EngineError> {
        self.validate(frame.tab_id).await?;
        if frame.frame_id != TOP_LEVEL_FRAME {
            return Ok(false);
        }

        let lost = self.state.lock().tabs.get(frame.tab_id)?.is_lost();
        if lost {
            self.execute(vec![HostCommand::Signal {
                tab: frame.tab_id,
                signal: PageSignal::ResolveLocation,
            }])
            .await;
        }
        Ok(lost)
    }

    /// Serve a request from a tab's page UI
    ///
    /// # Errors
    /// Returns error if the tab cannot be validated
    pub async fn handle_request(
        &self,
        tab: TabId,
        request: &UiRequest,
    ) -> Result<UiResponse, EngineError> {
        self.validate(tab).await?;

        let (response, host_commands) = {
            let mut state = self.state.lock();
            commands::handle(&mut state, &self.config, tab, request)?
        };

        tracing::debug!("Request {} from tab {} handled", request.action(), tab);
        self.execute(host_commands).await;
        Ok(response)
    }

    async fn execute(&self, host_commands: Vec<HostCommand>) {
        for command in host_commands {
            if let Err(err) = command.execute(self.host.as_ref()).await {
                tracing::warn!("Host command {:?} failed: {}", command, err);
            }
        }
    }
}
