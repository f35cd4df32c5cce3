//! Read-only access to the current document
//!
//! The engine only ever asks four questions of the page; `DomReader` is that
//! capability. `HtmlSnapshot` answers them from an HTML string and its URL.

use scraper::{Html, Selector};
use url::Url;

/// A `<meta>` element's attributes in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetaElement {
    pub attributes: Vec<(String, String)>,
}

impl MetaElement {
    pub fn new(attributes: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            attributes: attributes.into_iter().collect(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Path and query string of the current URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    /// Empty, or starting with `?`
    pub search: String,
}

impl Location {
    pub fn new(path: impl Into<String>, search: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            search: search.into(),
        }
    }

    /// Split a relative reference like `/menu?x=1#top`.
    pub fn from_relative(href: &str) -> Self {
        let without_fragment = href.split('#').next().unwrap_or(href);
        match without_fragment.find('?') {
            Some(pos) => Self::new(&without_fragment[..pos], &without_fragment[pos..]),
            None => Self::new(without_fragment, ""),
        }
    }
}

impl From<&Url> for Location {
    fn from(url: &Url) -> Self {
        let search = match url.query() {
            Some(q) if !q.is_empty() => format!("?{}", q),
            _ => String::new(),
        };
        Location::new(url.path(), search)
    }
}

/// Point-in-time reads of the document. Implementations never mutate it.
pub trait DomReader {
    fn meta_elements(&self) -> Vec<MetaElement>;

    /// Raw text of every `application/ld+json` script, in document order
    fn structured_data_blocks(&self) -> Vec<String>;

    fn title(&self) -> String;

    fn location(&self) -> Location;
}

/// A parsed HTML document plus the URL it was loaded from
pub struct HtmlSnapshot {
    document: Html,
    location: Location,
}

impl HtmlSnapshot {
    /// Parse `html` as loaded from `url`.
    ///
    /// `url` may be absolute or a path with optional query.
    pub fn parse(html: &str, url: &str) -> Self {
        let location = match Url::parse(url) {
            Ok(parsed) => Location::from(&parsed),
            Err(_) => Location::from_relative(url),
        };

        Self {
            document: Html::parse_document(html),
            location,
        }
    }

    /// Move to a new URL without reparsing the document.
    pub fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    fn select_all(&self, selector: &str) -> Vec<scraper::ElementRef<'_>> {
        match Selector::parse(selector) {
            Ok(s) => self.document.select(&s).collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl DomReader for HtmlSnapshot {
    fn meta_elements(&self) -> Vec<MetaElement> {
        self.select_all("meta")
            .into_iter()
            .map(|element| {
                MetaElement::new(
                    element
                        .value()
                        .attrs()
                        .map(|(name, value)| (name.to_string(), value.to_string())),
                )
            })
            .collect()
    }

    fn structured_data_blocks(&self) -> Vec<String> {
        self.select_all(r#"script[type="application/ld+json"]"#)
            .into_iter()
            .map(|element| element.text().collect::<String>())
            .collect()
    }

    fn title(&self) -> String {
        self.select_all("title")
            .first()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .unwrap_or_default()
    }

    fn location(&self) -> Location {
        self.location.clone()
    }
}
