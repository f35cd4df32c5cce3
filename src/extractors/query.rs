//! Query string extraction
//!
//! Turns `?a=1&b-c=x` into `{a: 1, b_c: "x"}`.

use crate::properties::{PropertyMap, PropertyValue};

/// Parse a query string (empty or starting with `?`) into properties.
///
/// Later pairs overwrite earlier pairs with the same key. A pair without
/// `=` yields an empty string value.
pub fn extract_query(search: &str) -> PropertyMap {
    let query = search.strip_prefix('?').unwrap_or(search);
    let mut result = PropertyMap::new();

    if query.is_empty() {
        return result;
    }

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = urlencoding::decode(raw_value)
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| raw_value.to_string());

        result.insert(key.replace('-', "_"), coerce_value(value));
    }

    result
}

/// Integer-only numeric coercion.
///
/// Integers and plain decimals become numbers, decimals truncated toward
/// zero (`"12.5"` is `12`). Anything else stays a string.
fn coerce_value(value: String) -> PropertyValue {
    match parse_truncated_integer(&value) {
        Some(n) => PropertyValue::Number(n),
        None => PropertyValue::Text(value),
    }
}

fn parse_truncated_integer(value: &str) -> Option<serde_json::Number> {
    let unsigned = value
        .strip_prefix('-')
        .or_else(|| value.strip_prefix('+'))
        .unwrap_or(value);

    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };

    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Some(frac) = frac_part {
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }

    let digits_end = value.len() - frac_part.map(|f| f.len() + 1).unwrap_or(0);
    let digits = &value[..digits_end];
    match digits.parse::<i64>() {
        Ok(n) => Some(n.into()),
        Err(_) => digits.parse::<u64>().ok().map(Into::into),
    }
}
