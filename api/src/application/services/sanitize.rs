use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde_json::{Map, Value};

// No tags survive; script and style contents are dropped with their element.
static MARKUP_CLEANER: Lazy<ammonia::Builder<'static>> = Lazy::new(|| {
    let mut builder = ammonia::Builder::default();
    builder.tags(HashSet::new());
    builder
});

/// Keys that a document store would read as an operator (`$gt`, `$where`)
/// or as a path into a nested field (`profile.role`).
pub fn is_operator_key(key: &str) -> bool {
    key.starts_with('$') || key.contains('.')
}

/// Removes operator-like keys at every depth. Returns how many were dropped.
pub fn strip_operator_keys(value: &mut Value) -> usize {
    match value {
        Value::Object(map) => strip_operator_keys_map(map),
        Value::Array(items) => items.iter_mut().map(strip_operator_keys).sum(),
        _ => 0,
    }
}

pub fn strip_operator_keys_map(map: &mut Map<String, Value>) -> usize {
    let before = map.len();
    map.retain(|key, _| !is_operator_key(key));
    let mut removed = before - map.len();
    for nested in map.values_mut() {
        removed += strip_operator_keys(nested);
    }
    removed
}

/// Strips script-capable markup from every string value. Strings without a
/// `<` are left byte-for-byte untouched.
pub fn neutralize_markup(value: &mut Value) -> usize {
    match value {
        Value::String(text) => {
            if !text.contains('<') {
                return 0;
            }
            let cleaned = MARKUP_CLEANER.clean(text).to_string();
            if cleaned == *text {
                0
            } else {
                *text = cleaned;
                1
            }
        }
        Value::Array(items) => items.iter_mut().map(neutralize_markup).sum(),
        Value::Object(map) => neutralize_markup_map(map),
        _ => 0,
    }
}

pub fn neutralize_markup_map(map: &mut Map<String, Value>) -> usize {
    map.values_mut().map(neutralize_markup).sum()
}
