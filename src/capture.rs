//! Capture sources and the per-path rule table
//!
//! A capture set names which data sources feed a page's properties. The
//! hosting application supplies a default set plus overrides keyed by path.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};

/// A data origin the engine may read properties from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSource {
    Url,
    Meta,
    Schema,
    /// Union of url, meta and schema
    All,
    /// Suppresses all output for the scope
    None,
}

/// Ordered collection of capture sources active for a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaptureSet(Vec<CaptureSource>);

impl CaptureSet {
    pub fn new(sources: impl IntoIterator<Item = CaptureSource>) -> Self {
        CaptureSet(sources.into_iter().collect())
    }

    pub fn contains(&self, source: CaptureSource) -> bool {
        self.0.contains(&source)
    }

    pub fn iter(&self) -> impl Iterator<Item = CaptureSource> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for CaptureSet {
    fn default() -> Self {
        CaptureSet(vec![CaptureSource::All])
    }
}

impl From<Vec<CaptureSource>> for CaptureSet {
    fn from(sources: Vec<CaptureSource>) -> Self {
        CaptureSet(sources)
    }
}

/// Per-page overrides, keyed by path without its leading slash
pub type CaptureRules = HashMap<String, CaptureSet>;

/// Capture configuration supplied by the host when the coordinator mounts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureConfig {
    #[serde(default)]
    pub default_capture: CaptureSet,
    #[serde(default)]
    pub rules: CaptureRules,
}

impl CaptureConfig {
    pub fn new(default_capture: CaptureSet, rules: CaptureRules) -> Self {
        Self {
            default_capture,
            rules,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::InvalidConfig)
    }

    /// Effective capture set for `path`.
    pub fn resolve(&self, path: &str) -> &CaptureSet {
        resolve_capture(path, &self.default_capture, &self.rules)
    }
}

/// Pick the rule for `path` if one exists, otherwise the default set.
///
/// The lookup key is the path with its leading slash removed; the root path
/// `/` is looked up as-is. A matching rule replaces the default wholesale.
pub fn resolve_capture<'a>(
    path: &str,
    default_capture: &'a CaptureSet,
    rules: &'a CaptureRules,
) -> &'a CaptureSet {
    let key = if path == "/" {
        path
    } else {
        path.strip_prefix('/').unwrap_or(path)
    };

    rules.get(key).unwrap_or(default_capture)
}
