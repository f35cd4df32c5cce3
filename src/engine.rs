//! Property resolution
//!
//! Decides, for one location, which sources feed the page report and how
//! their maps combine:
//! - `none` suppresses everything
//! - `all` merges schema, then url, then meta; earlier sources keep their keys
//! - an explicit set merges its sources in listed order, first listed wins
//! - caller-supplied properties only fill keys nothing else produced

use serde::{Deserialize, Serialize};

use crate::capture::{CaptureConfig, CaptureSource};
use crate::dom::{DomReader, Location};
use crate::error::Result;
use crate::extractors::{extract_meta, extract_query, extract_structured_data, format_path};
use crate::properties::{merge_first_wins, PropertyMap, PropertyValue};

pub const PAGE_NAME_KEY: &str = "pageName";

/// Name and properties supplied by an imperative navigation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationOverride {
    #[serde(default)]
    pub target_path: String,
    #[serde(default)]
    pub page_name: Option<String>,
    #[serde(default)]
    pub properties: Option<PropertyMap>,
}

/// Final `{pageName, properties}` for one navigation
#[derive(Debug, Clone, PartialEq)]
pub struct PageReport {
    pub page_name: String,
    pub properties: PropertyMap,
}

/// Serialized form of a report: `{"type": "page", "properties": {...}}`
#[derive(Debug, Serialize)]
pub struct PagePayload<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub properties: &'a PropertyMap,
}

impl PageReport {
    /// Build a report, copying a non-empty name into the properties unless
    /// they already carry a `pageName`.
    pub fn new(page_name: String, mut properties: PropertyMap) -> Self {
        inject_page_name(&mut properties, &page_name);
        Self {
            page_name,
            properties,
        }
    }

    /// Nothing to report: no name and no properties.
    pub fn is_empty(&self) -> bool {
        self.page_name.is_empty() && self.properties.is_empty()
    }

    pub fn payload(&self) -> PagePayload<'_> {
        PagePayload {
            kind: "page",
            properties: &self.properties,
        }
    }
}

fn inject_page_name(properties: &mut PropertyMap, page_name: &str) {
    if !page_name.is_empty() && !properties.contains_key(PAGE_NAME_KEY) {
        properties.insert(PAGE_NAME_KEY.to_string(), PropertyValue::from(page_name));
    }
}

/// Resolves page names and properties against a capture configuration and
/// a document snapshot
pub struct PropertyEngine<'a> {
    config: &'a CaptureConfig,
    dom: &'a dyn DomReader,
}

impl<'a> PropertyEngine<'a> {
    pub fn new(config: &'a CaptureConfig, dom: &'a dyn DomReader) -> Self {
        Self { config, dom }
    }

    /// Page name for `path`. A non-empty `explicit_name` is returned as is.
    pub fn compute_page_name(&self, path: &str, explicit_name: Option<&str>) -> String {
        if let Some(name) = explicit_name.filter(|n| !n.is_empty()) {
            return name.to_string();
        }

        let capture = self.config.resolve(path);
        if capture.contains(CaptureSource::None) {
            String::new()
        } else if capture.contains(CaptureSource::Meta) {
            self.dom.title()
        } else {
            format_path(path)
        }
    }

    /// Properties for `path` and `search`, with the derived page name injected.
    pub fn compute_properties(
        &self,
        path: &str,
        search: &str,
        explicit: Option<&PropertyMap>,
    ) -> Result<PropertyMap> {
        let page_name = self.compute_page_name(path, None);
        self.properties_named(path, search, &page_name, explicit)
    }

    /// Full report for a location, honouring an optional override.
    pub fn resolve(
        &self,
        location: &Location,
        nav_override: Option<&NavigationOverride>,
    ) -> Result<PageReport> {
        let explicit_name = nav_override.and_then(|o| o.page_name.as_deref());
        let explicit_properties = nav_override.and_then(|o| o.properties.as_ref());

        let page_name = self.compute_page_name(&location.path, explicit_name);
        let properties = self.properties_named(
            &location.path,
            &location.search,
            &page_name,
            explicit_properties,
        )?;

        tracing::debug!(
            "Resolved {} properties for {} (capture {:?}, page name {:?}, override: {})",
            properties.len(),
            location.path,
            self.config.resolve(&location.path),
            page_name,
            nav_override.is_some()
        );

        Ok(PageReport::new(page_name, properties))
    }

    fn properties_named(
        &self,
        path: &str,
        search: &str,
        page_name: &str,
        explicit: Option<&PropertyMap>,
    ) -> Result<PropertyMap> {
        let capture = self.config.resolve(path);
        if capture.contains(CaptureSource::None) {
            return Ok(PropertyMap::new());
        }

        let sources: Vec<CaptureSource> = if capture.contains(CaptureSource::All) {
            vec![CaptureSource::Schema, CaptureSource::Url, CaptureSource::Meta]
        } else {
            capture.iter().collect()
        };

        let mut result = PropertyMap::new();
        for source in sources {
            merge_first_wins(&mut result, self.source_properties(source, search)?);
        }

        if let Some(explicit) = explicit {
            merge_first_wins(&mut result, explicit.clone());
        }

        inject_page_name(&mut result, page_name);
        Ok(result)
    }

    fn source_properties(&self, source: CaptureSource, search: &str) -> Result<PropertyMap> {
        match source {
            CaptureSource::Url => Ok(extract_query(search)),
            CaptureSource::Meta => Ok(extract_meta(&self.dom.meta_elements())),
            CaptureSource::Schema => extract_structured_data(&self.dom.structured_data_blocks()),
            CaptureSource::All | CaptureSource::None => Ok(PropertyMap::new()),
        }
    }
}
