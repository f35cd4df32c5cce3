//! JSON-LD flattening
//!
//! Reads `<script type="application/ld+json">` blocks and flattens each tree
//! into type-prefixed keys:
//!
//! ```text
//! {"@type": "Review", "author": {"@type": "Person", "name": "richlook"}}
//!   -> {"person_name": "richlook"}
//! ```
//!
//! Children without their own `@type` inherit the nearest ancestor's label.
//! Repeated leaves inside one block are joined with `" / "`, primitive
//! array members with `", "`. Across blocks the first block to define a key
//! keeps it.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::properties::{append_value, merge_first_wins, PropertyMap, PropertyValue};

const REPEATED_LEAF_SEPARATOR: &str = " / ";
const ARRAY_ITEM_SEPARATOR: &str = ", ";

/// A structured-data value: a primitive, a nested node, or a list
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredValue {
    Primitive(PropertyValue),
    Node(StructuredNode),
    List(Vec<StructuredValue>),
}

/// One JSON-LD object: its `@type` label plus the remaining fields in
/// document order. `@type` and `@id` are not kept as fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructuredNode {
    pub type_label: Option<String>,
    pub fields: Vec<(String, StructuredValue)>,
}

impl StructuredValue {
    /// Convert parsed JSON. `null` has no representation and yields `None`.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(StructuredValue::Primitive(PropertyValue::Text(b.to_string()))),
            Value::Number(n) => Some(StructuredValue::Primitive(PropertyValue::Number(n))),
            Value::String(s) => Some(StructuredValue::Primitive(PropertyValue::Text(s))),
            Value::Array(items) => Some(StructuredValue::List(
                items.into_iter().filter_map(StructuredValue::from_json).collect(),
            )),
            Value::Object(obj) => Some(StructuredValue::Node(StructuredNode::from_json(obj))),
        }
    }
}

impl StructuredNode {
    pub fn from_json(mut obj: Map<String, Value>) -> Self {
        let type_label = obj.shift_remove("@type").and_then(type_label);
        obj.shift_remove("@id");

        let fields = obj
            .into_iter()
            .filter_map(|(key, value)| StructuredValue::from_json(value).map(|v| (key, v)))
            .collect();

        Self { type_label, fields }
    }
}

/// `"Product"` stays as is, `["Product", "Offer"]` becomes `Product_Offer`.
/// The schema.org URL prefix is dropped from each type name. An empty
/// `@type` is an empty label, not an inherited one.
fn type_label(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(strip_schema_prefix(&s).to_string()),
        Value::Array(types) => Some(
            types
                .iter()
                .filter_map(Value::as_str)
                .map(strip_schema_prefix)
                .collect::<Vec<_>>()
                .join("_"),
        ),
        _ => None,
    }
}

fn strip_schema_prefix(t: &str) -> &str {
    t.strip_prefix("https://schema.org/")
        .or_else(|| t.strip_prefix("http://schema.org/"))
        .unwrap_or(t)
}

/// Lowercased field name with every non-word character removed
fn clean_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn compose_key(label: &str, clean: &str) -> String {
    if label.is_empty() {
        clean.to_string()
    } else {
        format!("{}_{}", label.to_lowercase(), clean)
    }
}

/// Flatten one node into `out`, inheriting `inherited` when the node has no type.
pub fn flatten_node(node: &StructuredNode, inherited: &str, out: &mut PropertyMap) {
    let label = node.type_label.as_deref().unwrap_or(inherited);

    for (key, value) in &node.fields {
        let clean = clean_key(key);
        if clean.is_empty() {
            continue;
        }
        flatten_value(value, label, &compose_key(label, &clean), out);
    }
}

fn flatten_value(value: &StructuredValue, label: &str, key: &str, out: &mut PropertyMap) {
    match value {
        StructuredValue::Primitive(p) => {
            append_value(out, key.to_string(), p.clone(), REPEATED_LEAF_SEPARATOR)
        }
        StructuredValue::Node(node) => flatten_node(node, label, out),
        StructuredValue::List(items) => {
            let mut primitives = Vec::new();
            for item in items {
                match item {
                    StructuredValue::Primitive(p) => primitives.push(p.to_string()),
                    other => flatten_value(other, label, key, out),
                }
            }

            if !primitives.is_empty() {
                append_value(
                    out,
                    key.to_string(),
                    PropertyValue::Text(primitives.join(ARRAY_ITEM_SEPARATOR)),
                    REPEATED_LEAF_SEPARATOR,
                );
            }
        }
    }
}

/// Flatten the top-level value of one block. Bare primitives carry no key
/// and are skipped.
pub fn flatten_block(value: &StructuredValue) -> PropertyMap {
    let mut out = PropertyMap::new();

    match value {
        StructuredValue::Node(node) => flatten_node(node, "", &mut out),
        StructuredValue::List(items) => {
            for item in items {
                if let StructuredValue::Node(node) = item {
                    flatten_node(node, "", &mut out);
                }
            }
        }
        StructuredValue::Primitive(_) => {}
    }

    out
}

/// Replace raw newlines that appear inside quoted JSON strings with spaces.
///
/// Hand-authored blocks often break strings across lines, which strict JSON
/// rejects. Newlines between tokens are left alone.
pub fn repair_newlines(raw: &str) -> String {
    let mut repaired = String::with_capacity(raw.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in raw.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            } else if c == '\n' || c == '\r' {
                repaired.push(' ');
                continue;
            }
        } else if c == '"' {
            in_string = true;
        }
        repaired.push(c);
    }

    repaired
}

/// Parse one block's raw script text. `index` is reported on failure.
pub fn parse_block(raw: &str, index: usize) -> Result<Option<StructuredValue>> {
    let repaired = repair_newlines(raw.trim());
    let json: Value = serde_json::from_str(&repaired)
        .map_err(|source| Error::SchemaParse { block: index, source })?;

    Ok(StructuredValue::from_json(json))
}

/// Flatten every block and merge them, first block winning on collisions.
///
/// Empty blocks are skipped; no blocks at all yields an empty map.
pub fn extract_structured_data<S: AsRef<str>>(blocks: &[S]) -> Result<PropertyMap> {
    let mut result = PropertyMap::new();

    for (index, raw) in blocks.iter().enumerate() {
        let raw = raw.as_ref();
        if raw.trim().is_empty() {
            continue;
        }

        if let Some(value) = parse_block(raw, index)? {
            merge_first_wins(&mut result, flatten_block(&value));
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_flattens_with_type_prefixes() {
        let block = r#"{"@type":"Review","author":{"@type":"Person","name":"richlook"}, "reviewRating":{"@type":"Rating","ratingValue":5,"bestRating":"5"}}"#;

        let result = extract_structured_data(&[block]).unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(result["person_name"].as_str(), Some("richlook"));
        assert_eq!(result["rating_ratingvalue"].as_i64(), Some(5));
        assert_eq!(result["rating_bestrating"].as_str(), Some("5"));
    }

    #[test]
    fn test_first_block_wins() {
        let blocks = [
            r#"{"@context": "https://schema.org", "@type": "WebSite", "name": "Menu"}"#,
            r#"{"@context": "http://example.org", "@type": "WebSite", "url": "https://x.test"}"#,
        ];

        let result = extract_structured_data(&blocks).unwrap();

        assert_eq!(result["website_context"].as_str(), Some("https://schema.org"));
        assert_eq!(result["website_name"].as_str(), Some("Menu"));
        assert_eq!(result["website_url"].as_str(), Some("https://x.test"));
    }

    #[test]
    fn test_untyped_children_inherit_label() {
        let block = r#"{"@type": "Product", "offers": {"price": 10, "seller": {"@type": "Organization", "name": "Shop"}}}"#;

        let result = extract_structured_data(&[block]).unwrap();

        assert_eq!(result["product_price"].as_i64(), Some(10));
        assert_eq!(result["organization_name"].as_str(), Some("Shop"));
    }

    #[test]
    fn test_repeated_entities_concatenate() {
        let block = r#"{
            "@context": "https://schema.org",
            "@type": "BreadcrumbList",
            "itemListElement": [
                {"@type": "ListItem", "position": 1, "name": "Home"},
                {"@type": "ListItem", "position": 2, "name": "Menu"}
            ]
        }"#;

        let result = extract_structured_data(&[block]).unwrap();

        assert_eq!(result["breadcrumblist_context"].as_str(), Some("https://schema.org"));
        assert_eq!(result["listitem_name"].as_str(), Some("Home / Menu"));
        assert_eq!(result["listitem_position"].as_str(), Some("1 / 2"));
    }

    #[test]
    fn test_primitive_arrays_join() {
        let block = r#"{"@type": ["Product", "Thing"], "color": ["red", "blue"], "sizes": [1, 2, 3]}"#;

        let result = extract_structured_data(&[block]).unwrap();

        assert_eq!(result["product_thing_color"].as_str(), Some("red, blue"));
        assert_eq!(result["product_thing_sizes"].as_str(), Some("1, 2, 3"));
    }

    #[test]
    fn test_keys_are_cleaned_and_ids_skipped() {
        let block = r##"{"@type": "https://schema.org/Event", "@id": "#e1", "start-Date": "2024-01-01", "is_free": true, "note": null}"##;

        let result = extract_structured_data(&[block]).unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result["event_startdate"].as_str(), Some("2024-01-01"));
        assert_eq!(result["event_is_free"].as_str(), Some("true"));
    }

    #[test]
    fn test_empty_type_is_an_empty_label() {
        let block = r#"{"@type": "Product", "name": "Burger",
            "offers": {"@type": "", "price": 1},
            "brand": {"@type": [], "logo": "b.png"},
            "seller": {"name": "Shop"}}"#;

        let result = extract_structured_data(&[block]).unwrap();

        assert_eq!(result["price"].as_i64(), Some(1));
        assert_eq!(result["logo"].as_str(), Some("b.png"));
        assert!(result.get("product_price").is_none());
        assert_eq!(result["product_name"].as_str(), Some("Burger / Shop"));
    }

    #[test]
    fn test_graph_members_flatten() {
        let block = r#"{"@context": "https://schema.org", "@graph": [
            {"@type": "Organization", "name": "Org"},
            {"@type": "WebPage", "name": "Page"}
        ]}"#;

        let result = extract_structured_data(&[block]).unwrap();

        assert_eq!(result["context"].as_str(), Some("https://schema.org"));
        assert_eq!(result["organization_name"].as_str(), Some("Org"));
        assert_eq!(result["webpage_name"].as_str(), Some("Page"));
    }

    #[test]
    fn test_newlines_inside_strings_are_repaired() {
        let block = "{\"@type\": \"Article\",\n \"headline\": \"Line one\nline two\r\n\"}";

        let result = extract_structured_data(&[block]).unwrap();

        assert_eq!(result["article_headline"].as_str(), Some("Line one line two  "));
    }

    #[test]
    fn test_repair_respects_escaped_quotes() {
        let raw = "{\"a\": \"say \\\"hi\\\"\n\",\n\"b\": 1}";
        assert_eq!(repair_newlines(raw), "{\"a\": \"say \\\"hi\\\" \",\n\"b\": 1}");
    }

    #[test]
    fn test_malformed_block_fails() {
        let blocks = [r#"{"@type": "Thing"}"#, r#"{"@type": "Thing", "#];

        let err = extract_structured_data(&blocks).unwrap_err();
        assert!(matches!(err, Error::SchemaParse { block: 1, .. }));
    }

    #[test]
    fn test_no_blocks_is_empty() {
        let blocks: [&str; 0] = [];
        assert!(extract_structured_data(&blocks).unwrap().is_empty());
        assert!(extract_structured_data(&["   "]).unwrap().is_empty());
    }

    #[test]
    fn test_flattening_same_tree_twice_does_not_duplicate() {
        let block = r#"{"@type": "Product", "name": "Burger"}"#;
        let value = parse_block(block, 0).unwrap().unwrap();

        assert_eq!(flatten_block(&value), flatten_block(&value));
        assert_eq!(flatten_block(&value)["product_name"].as_str(), Some("Burger"));
    }
}
