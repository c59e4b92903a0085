//! Hopscotch Core - browsing-history tree engine
//!
//! Keeps a tree of the pages a user has visited and the position of every
//! open tab in it:
//! - Registers tabs as they open, stitching unknown ones onto the tree
//! - Reconciles navigation commits into new, reused or rewritten nodes
//! - Serves the page UI's cursor, navigation, pruning and resolve requests
//!
//! # Example
//!
//! ```rust,ignore
//! use hopscotch_core::prelude::*;
//!
//! # async fn example(host: std::sync::Arc<dyn BrowserHost>) -> Result<(), EngineError> {
//! let engine = Engine::new(Config::default(), host);
//!
//! engine.on_tab_created(&TabInfo::new(TabId(1), "Start", "https://a.com")).await?;
//! engine
//!     .on_navigation_committed(&NavigationCommit::link(TabId(1), "https://b.com"))
//!     .await?;
//!
//! let links = engine.handle_request(TabId(1), &UiRequest::FetchLinks).await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod host;
pub mod lifecycle;
pub mod reconciler;
pub mod registry;
pub mod state;
pub mod stitch;
pub mod types;

// Re-exports for convenience
pub use commands::{Link, UiRequest, UiResponse};
pub use config::{
    BrowserNavigation, Config, NewTabAction, PlaceholderPattern, StitchFallback, UrlTypedAction,
    DEFAULT_NEW_TAB_PATTERN,
};
pub use engine::Engine;
pub use error::{ConfigError, EngineError, HostError, RegistryError};
pub use gate::{Placement, ValidationGate};
pub use host::{BrowserHost, HostCommand};
pub use reconciler::{reconcile, Reconciliation};
pub use registry::{TabFlags, TabRecord, TabRegistry};
pub use state::HistoryState;
pub use stitch::{NoStitch, StitchStrategy, UrlMatchStitch};
pub use types::{
    BrowserEvent, FrameEvent, FrameId, NavigationCommit, PageSignal, TabId, TabInfo, TabMetadata,
    TabRemoval, TabUpdate, TransitionQualifier, TransitionType, TOP_LEVEL_FRAME,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Hopscotch Core
    pub use crate::{
        BrowserEvent, BrowserHost, Config, Engine, EngineError, HostCommand, HostError,
        NavigationCommit, Reconciliation, TabId, TabInfo, TabMetadata, UiRequest, UiResponse,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
