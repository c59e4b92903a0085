//! Core types for hopscotch
//!
//! Defines the vocabulary shared between the engine and the browser host:
//! - Tab identifiers and metadata
//! - Navigation transitions and their qualifiers
//! - Browser events delivered to the engine
//! - Signals sent back to the page UI

use serde::{Deserialize, Serialize};
use std::fmt;

/// Browser tab identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TabId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Frame identifier inside a tab
pub type FrameId = i64;

/// Frame id of a tab's top-level document
pub const TOP_LEVEL_FRAME: FrameId = 0;

/// Metadata the host reports for a live tab
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TabMetadata {
    /// Current title
    pub title: String,
    /// Current URL
    pub url: String,
    /// Tab that spawned this one
    pub opener_tab_id: Option<TabId>,
}

/// A newly created tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    /// Tab identifier
    pub id: TabId,
    /// Initial title
    #[serde(default)]
    pub title: String,
    /// Initial URL
    #[serde(default)]
    pub url: String,
    /// Tab that spawned this one
    #[serde(default)]
    pub opener_tab_id: Option<TabId>,
}

impl TabInfo {
    /// Create tab info with no opener
    #[inline]
    #[must_use]
    pub fn new(id: TabId, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            url: url.into(),
            opener_tab_id: None,
        }
    }

    /// With opener tab
    #[inline]
    #[must_use]
    pub fn with_opener(mut self, opener: TabId) -> Self {
        self.opener_tab_id = Some(opener);
        self
    }

    /// Metadata view of this tab
    #[must_use]
    pub fn metadata(&self) -> TabMetadata {
        TabMetadata {
            title: self.title.clone(),
            url: self.url.clone(),
            opener_tab_id: self.opener_tab_id,
        }
    }
}

/// How a navigation was initiated
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransitionType {
    /// Followed a link
    Link,
    /// URL typed into the address bar
    Typed,
    /// Opened from a bookmark
    AutoBookmark,
    /// Page reload (also reported for some forward/back moves)
    Reload,
    /// Form submission
    FormSubmit,
    /// Address-bar suggestion
    Generated,
    /// Startup page
    StartPage,
    /// Search keyword
    Keyword,
    /// Anything else the host reports
    Other(String),
}

impl TransitionType {
    /// Host wire name
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Link => "link",
            Self::Typed => "typed",
            Self::AutoBookmark => "auto_bookmark",
            Self::Reload => "reload",
            Self::FormSubmit => "form_submit",
            Self::Generated => "generated",
            Self::StartPage => "start_page",
            Self::Keyword => "keyword",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for TransitionType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "link" => Self::Link,
            "typed" => Self::Typed,
            "auto_bookmark" => Self::AutoBookmark,
            "reload" => Self::Reload,
            "form_submit" => Self::FormSubmit,
            "generated" => Self::Generated,
            "start_page" => Self::StartPage,
            "keyword" => Self::Keyword,
            _ => Self::Other(value),
        }
    }
}

impl From<TransitionType> for String {
    fn from(value: TransitionType) -> Self {
        value.as_str().to_string()
    }
}

/// Extra detail attached to a transition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransitionQualifier {
    /// Redirect issued by the page
    ClientRedirect,
    /// Redirect issued by the server
    ServerRedirect,
    /// Back/forward button
    ForwardBack,
    /// Entered through the address bar
    FromAddressBar,
    /// Anything else the host reports
    Other(String),
}

impl TransitionQualifier {
    /// Host wire name
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::ClientRedirect => "client_redirect",
            Self::ServerRedirect => "server_redirect",
            Self::ForwardBack => "forward_back",
            Self::FromAddressBar => "from_address_bar",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for TransitionQualifier {
    fn from(value: String) -> Self {
        match value.as_str() {
            "client_redirect" => Self::ClientRedirect,
            "server_redirect" => Self::ServerRedirect,
            "forward_back" => Self::ForwardBack,
            "from_address_bar" => Self::FromAddressBar,
            _ => Self::Other(value),
        }
    }
}

impl From<TransitionQualifier> for String {
    fn from(value: TransitionQualifier) -> Self {
        value.as_str().to_string()
    }
}

/// A committed navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationCommit {
    /// Navigating tab
    pub tab_id: TabId,
    /// Frame that navigated
    #[serde(default)]
    pub frame_id: FrameId,
    /// Committed URL
    pub url: String,
    /// Transition kind
    pub transition_type: TransitionType,
    /// Transition qualifiers
    #[serde(default)]
    pub transition_qualifiers: Vec<TransitionQualifier>,
}

impl NavigationCommit {
    /// Top-level navigation with no qualifiers
    #[must_use]
    pub fn new(tab_id: TabId, url: impl Into<String>, transition_type: TransitionType) -> Self {
        Self {
            tab_id,
            frame_id: TOP_LEVEL_FRAME,
            url: url.into(),
            transition_type,
            transition_qualifiers: Vec::new(),
        }
    }

    /// Link navigation
    #[inline]
    #[must_use]
    pub fn link(tab_id: TabId, url: impl Into<String>) -> Self {
        Self::new(tab_id, url, TransitionType::Link)
    }

    /// Add a qualifier
    #[inline]
    #[must_use]
    pub fn with_qualifier(mut self, qualifier: TransitionQualifier) -> Self {
        self.transition_qualifiers.push(qualifier);
        self
    }

    /// Move to a sub-frame
    #[inline]
    #[must_use]
    pub fn in_frame(mut self, frame_id: FrameId) -> Self {
        self.frame_id = frame_id;
        self
    }

    /// Whether the top-level document navigated
    #[inline]
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.frame_id == TOP_LEVEL_FRAME
    }

    /// Whether the back/forward qualifier is present
    #[inline]
    #[must_use]
    pub fn is_forward_back(&self) -> bool {
        self.transition_qualifiers.contains(&TransitionQualifier::ForwardBack)
    }

    /// Plain reload (back/forward moves that claim to be reloads excluded)
    #[inline]
    #[must_use]
    pub fn is_plain_reload(&self) -> bool {
        self.transition_type == TransitionType::Reload && !self.is_forward_back()
    }

    /// User entered the URL directly
    #[inline]
    #[must_use]
    pub fn is_direct_entry(&self) -> bool {
        matches!(
            self.transition_type,
            TransitionType::Typed | TransitionType::AutoBookmark
        )
    }
}

/// Title (or other attribute) change of a tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabUpdate {
    /// Updated tab
    pub tab_id: TabId,
    /// New title, if it changed
    #[serde(default)]
    pub title: Option<String>,
}

/// Tab closure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabRemoval {
    /// Closed tab
    pub tab_id: TabId,
}

/// Frame-scoped page event (DOM content loaded)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameEvent {
    /// Owning tab
    pub tab_id: TabId,
    /// Frame that loaded
    #[serde(default)]
    pub frame_id: FrameId,
}

/// Events raised by the browser host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BrowserEvent {
    /// A tab was opened
    TabCreated(TabInfo),
    /// A tab was closed
    TabRemoved(TabRemoval),
    /// A tab's attributes changed
    TabUpdated(TabUpdate),
    /// A navigation committed
    NavigationCommitted(NavigationCommit),
    /// A frame finished parsing its document
    DomContentLoaded(FrameEvent),
}

impl BrowserEvent {
    /// Tab the event concerns
    #[must_use]
    pub fn tab_id(&self) -> TabId {
        match self {
            Self::TabCreated(tab) => tab.id,
            Self::TabRemoved(removal) => removal.tab_id,
            Self::TabUpdated(update) => update.tab_id,
            Self::NavigationCommitted(commit) => commit.tab_id,
            Self::DomContentLoaded(frame) => frame.tab_id,
        }
    }
}

/// One-way notifications to the page UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageSignal {
    /// Ask the user where a lost tab belongs
    ResolveLocation,
}
