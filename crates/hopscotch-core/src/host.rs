//! Browser host boundary
//!
//! The engine never talks to a browser directly. Everything it needs from
//! outside goes through [`BrowserHost`]; everything it wants done is first
//! collected as a [`HostCommand`] while the state lock is held and executed
//! after the lock is released.

use crate::error::HostError;
use crate::types::{PageSignal, TabId, TabMetadata};
use serde::Serialize;

/// Browser capabilities the engine depends on
///
/// Implement this trait to wire the engine to a real browser (or a fake).
#[async_trait::async_trait]
pub trait BrowserHost: Send + Sync {
    /// Look up title, URL and opener of a live tab
    async fn tab_metadata(&self, tab: TabId) -> Result<TabMetadata, HostError>;

    /// Close a tab
    async fn close_tab(&self, tab: TabId) -> Result<(), HostError>;

    /// Point a tab at a URL
    async fn navigate_tab(&self, tab: TabId, url: &str) -> Result<(), HostError>;

    /// Deliver a one-way signal to a tab's page UI
    async fn signal(&self, tab: TabId, signal: PageSignal) -> Result<(), HostError>;
}

/// Deferred host side effect
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", content = "args", rename_all = "camelCase")]
pub enum HostCommand {
    /// Close the tab
    CloseTab(TabId),
    /// Navigate the tab to a URL
    Navigate {
        /// Target tab
        tab: TabId,
        /// Destination
        url: String,
    },
    /// Signal the tab's page UI
    Signal {
        /// Target tab
        tab: TabId,
        /// Signal to deliver
        signal: PageSignal,
    },
}

impl HostCommand {
    /// Tab the command acts on
    #[must_use]
    pub fn tab(&self) -> TabId {
        match self {
            Self::CloseTab(tab) | Self::Navigate { tab, .. } | Self::Signal { tab, .. } => *tab,
        }
    }

    /// Run the command against a host
    ///
    /// # Errors
    /// Propagates the host's error
    pub async fn execute(&self, host: &dyn BrowserHost) -> Result<(), HostError> {
        match self {
            Self::CloseTab(tab) => host.close_tab(*tab).await,
            Self::Navigate { tab, url } => host.navigate_tab(*tab, url).await,
            Self::Signal { tab, signal } => host.signal(*tab, *signal).await,
        }
    }
}
