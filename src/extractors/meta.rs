//! Meta tag extraction

use crate::dom::MetaElement;
use crate::properties::{PropertyMap, PropertyValue};

/// Build properties from the document's meta elements.
///
/// Each element carrying `content` contributes one entry keyed by its first
/// declared attribute name (`-` replaced with `_`). The first element to
/// claim a key keeps it.
pub fn extract_meta(elements: &[MetaElement]) -> PropertyMap {
    let mut result = PropertyMap::new();

    for element in elements {
        let Some(content) = element.attr("content") else {
            continue;
        };
        let Some((first_attr, _)) = element.attributes.first() else {
            continue;
        };

        result
            .entry(first_attr.replace('-', "_"))
            .or_insert_with(|| PropertyValue::from(content));
    }

    result
}
