//! Error types for hopscotch
//!
//! Failures are split by concern:
//! - Host lookups and commands
//! - Registry misuse (operating on a tab with no record)
//! - Configuration loading
//!
//! None of them is fatal to the engine: an unresolvable tab degrades to the
//! configured fallback and a misread event degrades to a new node.

use crate::types::TabId;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Host lookup or command failed
    #[error("host error: {0}")]
    Host(#[from] HostError),

    /// Registry was asked about a tab it does not track
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// The tab closed before its event could be handled
    #[error("tab {0} closed")]
    TabClosed(TabId),
}

impl EngineError {
    /// Whether later events for the same tab can still succeed
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Host(HostError::TabNotFound(_)) | Self::TabClosed(_) => false,
            Self::Host(_) | Self::Registry(_) => true,
        }
    }
}

/// Errors reported by the browser host
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The tab does not exist (anymore)
    #[error("tab {0} not found")]
    TabNotFound(TabId),

    /// The host could not answer
    #[error("host unavailable: {0}")]
    Unavailable(String),
}

/// Tab registry errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No record for this tab
    #[error("unknown tab: {0}")]
    UnknownTab(TabId),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config is not valid JSON
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Config JSON is not an object
    #[error("config must be a JSON object")]
    NotAnObject,

    /// New-tab pattern does not compile
    #[error("invalid new-tab pattern: {0}")]
    Pattern(#[from] regex::Error),
}
