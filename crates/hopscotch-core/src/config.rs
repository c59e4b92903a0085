//! Engine configuration
//!
//! Every key is optional. Loading is lenient: a key with a malformed value
//! keeps its compiled-in default (with a warning) instead of rejecting the
//! whole file.

use crate::error::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::path::Path;

/// Default pattern for browser new-tab pages
///
/// Matches `chrome://newtab/` and Google's hosted new-tab page, but not URLs
/// that merely contain `newtab` further along.
pub const DEFAULT_NEW_TAB_PATTERN: &str = r"^([a-z]+://www\.google\.\w+/_/)?chrome(://)?(/)?newtab";

static DEFAULT_PLACEHOLDER: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(DEFAULT_NEW_TAB_PATTERN)
        .map_err(|err| tracing::error!("Default new-tab pattern rejected: {}", err))
        .ok()
});

/// Where a new tab's first node goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NewTabAction {
    /// Fresh branch under root
    #[default]
    NewBranch,
    /// Continue from the opener's current node
    SubBranch,
    /// Detach and let the user decide
    Prompt,
}

/// What to do with a tab that could not be stitched onto the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StitchFallback {
    /// Fresh branch under root
    #[default]
    NewBranch,
    /// Detach and let the user decide
    Prompt,
}

/// Handling of URLs the user typed or opened from a bookmark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UrlTypedAction {
    /// Treat like any other navigation
    #[default]
    SubBranch,
    /// Start a fresh branch under root
    NewBranch,
    /// Detach and let the user decide
    Prompt,
}

/// Whether the menu cursor follows real navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BrowserNavigation {
    /// `watch` moves with `anchor`
    #[default]
    Tracked,
    /// `watch` stays where the user left it
    Sticky,
}

/// Compiled new-tab page matcher
///
/// Serializes as its source pattern. An empty matcher never matches.
#[derive(Debug, Clone)]
pub struct PlaceholderPattern(Option<Regex>);

impl PlaceholderPattern {
    /// Compile a pattern
    ///
    /// # Errors
    /// Returns [`ConfigError::Pattern`] if the regex is invalid
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        Ok(Self(Some(Regex::new(pattern)?)))
    }

    /// Whether `url` looks like a fresh new-tab page
    #[inline]
    #[must_use]
    pub fn is_match(&self, url: &str) -> bool {
        self.0.as_ref().is_some_and(|regex| regex.is_match(url))
    }

    /// Source pattern
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_ref().map_or(DEFAULT_NEW_TAB_PATTERN, Regex::as_str)
    }
}

impl Default for PlaceholderPattern {
    fn default() -> Self {
        Self(DEFAULT_PLACEHOLDER.clone())
    }
}

impl PartialEq for PlaceholderPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for PlaceholderPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PlaceholderPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(&raw).map_err(D::Error::custom)
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Page UI hint, passed through untouched
    pub scrollbar_hiding: bool,
    /// Placement of newly created tabs
    pub new_tab_action: NewTabAction,
    /// Try to graft unknown tabs onto existing nodes
    pub attempt_stitching: bool,
    /// Placement of unknown tabs that could not be stitched
    pub stitch_fallback: StitchFallback,
    /// Collapse placeholders and reuse parent/child nodes
    pub tree_simplification: bool,
    /// Handling of typed / bookmarked URLs
    pub url_typed_action: UrlTypedAction,
    /// Whether `watch` follows `anchor`
    pub browser_navigation: BrowserNavigation,
    /// New-tab page matcher used by simplification
    pub new_tab_pattern: PlaceholderPattern,
}

impl Config {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration JSON
    ///
    /// # Errors
    /// Returns error if the text is not JSON or not an object. Malformed
    /// individual values fall back to their defaults.
    pub fn parse(json: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Build configuration from a JSON value, key by key
    ///
    /// # Errors
    /// Returns [`ConfigError::NotAnObject`] if `value` is not an object
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let map = value.as_object().ok_or(ConfigError::NotAnObject)?;
        let mut config = Self::default();

        read_key(map, "scrollbarHiding", &mut config.scrollbar_hiding);
        read_key(map, "newTabAction", &mut config.new_tab_action);
        read_key(map, "attemptStitching", &mut config.attempt_stitching);
        read_key(map, "stitchFallback", &mut config.stitch_fallback);
        read_key(map, "treeSimplification", &mut config.tree_simplification);
        read_key(map, "urlTypedAction", &mut config.url_typed_action);
        read_key(map, "browserNavigation", &mut config.browser_navigation);
        read_key(map, "newTabPattern", &mut config.new_tab_pattern);

        for key in map.keys().filter(|k| !KNOWN_KEYS.contains(&k.as_str())) {
            tracing::debug!(key = %key, "ignoring unknown config key");
        }

        Ok(config)
    }

    /// Read configuration from a file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is not a JSON object
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Read configuration from a file, falling back to defaults
    #[must_use]
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %path.display(), "config could not be loaded, using defaults: {}", err);
                Self::default()
            }
        }
    }

    /// With new-tab action
    #[inline]
    #[must_use]
    pub fn with_new_tab_action(mut self, action: NewTabAction) -> Self {
        self.new_tab_action = action;
        self
    }

    /// With stitching enabled or disabled
    #[inline]
    #[must_use]
    pub fn with_stitching(mut self, attempt: bool) -> Self {
        self.attempt_stitching = attempt;
        self
    }

    /// With stitch fallback
    #[inline]
    #[must_use]
    pub fn with_stitch_fallback(mut self, fallback: StitchFallback) -> Self {
        self.stitch_fallback = fallback;
        self
    }

    /// With tree simplification enabled or disabled
    #[inline]
    #[must_use]
    pub fn with_tree_simplification(mut self, enabled: bool) -> Self {
        self.tree_simplification = enabled;
        self
    }

    /// With typed-URL action
    #[inline]
    #[must_use]
    pub fn with_url_typed_action(mut self, action: UrlTypedAction) -> Self {
        self.url_typed_action = action;
        self
    }

    /// With browser navigation mode
    #[inline]
    #[must_use]
    pub fn with_browser_navigation(mut self, mode: BrowserNavigation) -> Self {
        self.browser_navigation = mode;
        self
    }

    /// With new-tab page matcher
    #[inline]
    #[must_use]
    pub fn with_new_tab_pattern(mut self, pattern: PlaceholderPattern) -> Self {
        self.new_tab_pattern = pattern;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scrollbar_hiding: false,
            new_tab_action: NewTabAction::default(),
            attempt_stitching: true,
            stitch_fallback: StitchFallback::default(),
            tree_simplification: true,
            url_typed_action: UrlTypedAction::default(),
            browser_navigation: BrowserNavigation::default(),
            new_tab_pattern: PlaceholderPattern::default(),
        }
    }
}

const KNOWN_KEYS: &[&str] = &[
    "scrollbarHiding",
    "newTabAction",
    "attemptStitching",
    "stitchFallback",
    "treeSimplification",
    "urlTypedAction",
    "browserNavigation",
    "newTabPattern",
];

fn read_key<T: DeserializeOwned>(map: &Map<String, Value>, key: &str, slot: &mut T) {
    let Some(raw) = map.get(key) else {
        return;
    };
    match T::deserialize(raw) {
        Ok(value) => *slot = value,
        Err(err) => tracing::warn!(key, "malformed config value, keeping default: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.new_tab_action, NewTabAction::NewBranch);
        assert!(config.attempt_stitching);
        assert_eq!(config.stitch_fallback, StitchFallback::NewBranch);
        assert!(config.tree_simplification);
        assert_eq!(config.url_typed_action, UrlTypedAction::SubBranch);
        assert_eq!(config.browser_navigation, BrowserNavigation::Tracked);
        assert!(!config.scrollbar_hiding);
    }

    #[test]
    fn parse_reads_camel_case_keys() {
        let config = Config::parse(
            r#"{"newTabAction": "subBranch", "browserNavigation": "sticky", "treeSimplification": false}"#,
        )
        .unwrap();

        assert_eq!(config.new_tab_action, NewTabAction::SubBranch);
        assert_eq!(config.browser_navigation, BrowserNavigation::Sticky);
        assert!(!config.tree_simplification);
        assert!(config.attempt_stitching);
    }

    #[test]
    fn malformed_value_keeps_default_for_that_key_only() {
        let config = Config::parse(
            r#"{"newTabAction": "sideways", "attemptStitching": "yes", "urlTypedAction": "prompt"}"#,
        )
        .unwrap();

        assert_eq!(config.new_tab_action, NewTabAction::NewBranch);
        assert!(config.attempt_stitching);
        assert_eq!(config.url_typed_action, UrlTypedAction::Prompt);
    }

    #[test]
    fn invalid_pattern_keeps_default_pattern() {
        let config = Config::parse(r#"{"newTabPattern": "("}"#).unwrap();
        assert_eq!(config.new_tab_pattern.as_str(), DEFAULT_NEW_TAB_PATTERN);
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(matches!(Config::parse("[1, 2]"), Err(ConfigError::NotAnObject)));
        assert!(matches!(Config::parse("{oops"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn load_or_default_survives_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("missing.json"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"stitchFallback": "prompt", "scrollbarHiding": true}}"#).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.stitch_fallback, StitchFallback::Prompt);
        assert!(config.scrollbar_hiding);
    }

    #[test]
    fn serializes_with_wire_names() {
        let value = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(value["newTabAction"], "newBranch");
        assert_eq!(value["browserNavigation"], "tracked");
        assert_eq!(value["newTabPattern"], DEFAULT_NEW_TAB_PATTERN);
    }

    #[test]
    fn default_pattern_compiles() {
        assert!(DEFAULT_PLACEHOLDER.is_some());
        assert!(PlaceholderPattern::default().0.is_some());
    }

    #[test]
    fn default_pattern_matches_new_tab_pages_only() {
        let pattern = PlaceholderPattern::default();
        assert!(pattern.is_match("chrome://newtab/"));
        assert!(pattern.is_match("https://www.google.ca/_/chrome/newtab?ie=UTF-8"));
        assert!(!pattern.is_match("https://internet.com/chrome://newtab"));
        assert!(!pattern.is_match("https://a.com"));
    }
}
