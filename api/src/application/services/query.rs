//! Extended `key=value` decoding shared by query strings and URL-encoded
//! bodies, plus the duplicate-parameter policy.
//!
//! Bracketed keys build nested structures: `a[b]=1` gives `{"a":{"b":"1"}}`,
//! `a[]=1&a[]=2` gives `{"a":["1","2"]}`. A repeated plain key turns into an
//! array in arrival order.

use serde_json::{Map, Value};

/// Brackets nested deeper than this are kept as part of the literal key.
const MAX_DEPTH: usize = 5;

#[derive(Debug, PartialEq)]
enum Segment {
    Key(String),
    Push,
}

pub fn parse_pairs<I, K, V>(pairs: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut out = Map::new();
    for (key, value) in pairs {
        let key = key.as_ref();
        if key.is_empty() {
            continue;
        }
        let (root, segments) = split_key(key);
        let slot = out.entry(root).or_insert(Value::Null);
        assign(slot, &segments, Value::String(value.into()));
    }
    out
}

pub fn parse_query(raw: &str) -> Map<String, Value> {
    parse_pairs(url::form_urlencoded::parse(raw.as_bytes()))
}

/// Collapses every top-level array to its last element. Returns the values
/// that were discarded, keyed like the input.
pub fn collapse_duplicates(map: &mut Map<String, Value>) -> Map<String, Value> {
    let mut polluted = Map::new();
    for (key, value) in map.iter_mut() {
        if let Value::Array(items) = value {
            if items.is_empty() {
                continue;
            }
            let mut items = std::mem::take(items);
            let kept = items.pop().unwrap_or(Value::Null);
            if !items.is_empty() {
                polluted.insert(key.clone(), Value::Array(items));
            }
            *value = kept;
        }
    }
    polluted
}

/// Re-encodes a decoded map using bracket notation for nested values.
pub fn encode(map: &Map<String, Value>) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in map {
        append(&mut serializer, key, value);
    }
    serializer.finish()
}

fn append(serializer: &mut url::form_urlencoded::Serializer<'_, String>, key: &str, value: &Value) {
    match value {
        Value::Null => {
            serializer.append_pair(key, "");
        }
        Value::String(s) => {
            serializer.append_pair(key, s);
        }
        Value::Array(items) => {
            for item in items {
                append(serializer, &format!("{key}[]"), item);
            }
        }
        Value::Object(nested) => {
            for (child, item) in nested {
                append(serializer, &format!("{key}[{child}]"), item);
            }
        }
        other => {
            serializer.append_pair(key, &other.to_string());
        }
    }
}

fn split_key(key: &str) -> (String, Vec<Segment>) {
    let Some(open) = key.find('[') else {
        return (key.to_string(), Vec::new());
    };
    if open == 0 {
        return (key.to_string(), Vec::new());
    }

    let root = key[..open].to_string();
    let mut segments = Vec::new();
    let mut rest = &key[open..];
    while segments.len() < MAX_DEPTH {
        let Some(inner) = rest.strip_prefix('[') else {
            break;
        };
        let Some(close) = inner.find(']') else {
            break;
        };
        let name = &inner[..close];
        if name.is_empty() || name.bytes().all(|b| b.is_ascii_digit()) {
            segments.push(Segment::Push);
        } else {
            segments.push(Segment::Key(name.to_string()));
        }
        rest = &inner[close + 1..];
    }

    if segments.is_empty() {
        return (key.to_string(), Vec::new());
    }
    if !rest.is_empty() {
        // Unparsed remainder: keep it attached to the deepest key.
        match segments.last_mut() {
            Some(Segment::Key(name)) => name.push_str(rest),
            _ => segments.push(Segment::Key(rest.to_string())),
        }
    }
    (root, segments)
}

fn assign(slot: &mut Value, segments: &[Segment], value: Value) {
    match segments.split_first() {
        None => match slot {
            Value::Null => *slot = value,
            Value::Array(items) => items.push(value),
            existing => {
                let previous = existing.take();
                *existing = Value::Array(vec![previous, value]);
            }
        },
        Some((Segment::Key(name), rest)) => {
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(map) = slot {
                let child = map.entry(name.clone()).or_insert(Value::Null);
                assign(child, rest, value);
            }
        }
        Some((Segment::Push, rest)) => {
            if slot.is_null() {
                *slot = Value::Array(Vec::new());
            } else if !slot.is_array() {
                let previous = slot.take();
                *slot = Value::Array(vec![previous]);
            }
            if let Value::Array(items) = slot {
                if rest.is_empty() {
                    items.push(value);
                } else {
                    items.push(Value::Null);
                    if let Some(last) = items.last_mut() {
                        assign(last, rest, value);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_pairs() {
        let map = parse_query("q=shoes&page=2");
        assert_eq!(Value::Object(map), json!({"q": "shoes", "page": "2"}));
    }

    #[test]
    fn repeated_keys_become_arrays() {
        let map = parse_query("color=red&color=blue&color=green");
        assert_eq!(map["color"], json!(["red", "blue", "green"]));
    }

    #[test]
    fn bracket_keys_nest() {
        let map = parse_query("price[gte]=10&price[lte]=20&tags[]=a&tags[]=b&a[b][c]=d");
        assert_eq!(
            Value::Object(map),
            json!({
                "price": {"gte": "10", "lte": "20"},
                "tags": ["a", "b"],
                "a": {"b": {"c": "d"}},
            })
        );
    }

    #[test]
    fn push_after_plain_key_extends_it() {
        let map = parse_query("a=1&a[]=2");
        assert_eq!(Value::Object(map), json!({"a": ["1", "2"]}));
    }

    #[test]
    fn push_with_nested_key() {
        let map = parse_query("a[][b]=1");
        assert_eq!(Value::Object(map), json!({"a": [{"b": "1"}]}));
    }

    #[test]
    fn operator_keys_survive_parsing() {
        // Stripping is a separate pipeline stage.
        let map = parse_query("price[$gt]=0");
        assert_eq!(map["price"], json!({"$gt": "0"}));
    }

    #[test]
    fn percent_and_plus_decoding() {
        let map = parse_query("name=red+shoes&note=50%25%20off");
        assert_eq!(map["name"], json!("red shoes"));
        assert_eq!(map["note"], json!("50% off"));
    }

    #[test]
    fn unbalanced_brackets_stay_literal() {
        let map = parse_query("a[b=1&[x]=2");
        assert_eq!(map["a[b"], json!("1"));
        assert_eq!(map["[x]"], json!("2"));
    }

    #[test]
    fn collapse_keeps_last_value() {
        let mut map = parse_query("sort=price&sort=name&q=x");
        let polluted = collapse_duplicates(&mut map);
        assert_eq!(map["sort"], json!("name"));
        assert_eq!(map["q"], json!("x"));
        assert_eq!(polluted["sort"], json!(["price"]));
        assert!(!polluted.contains_key("q"));
    }

    #[test]
    fn collapse_is_deterministic() {
        let raw = "a=1&a=2&b=3&a=4";
        let mut first = parse_query(raw);
        let mut second = parse_query(raw);
        collapse_duplicates(&mut first);
        collapse_duplicates(&mut second);
        assert_eq!(first, second);
        assert_eq!(first["a"], json!("4"));
    }

    #[test]
    fn encode_round_trips_collapsed_map() {
        let mut map = parse_query("sort=price&sort=name&filter[brand]=acme");
        collapse_duplicates(&mut map);
        let encoded = encode(&map);
        assert_eq!(parse_query(&encoded), map);
    }
}
