//! Form-style query string serialization.
//!
//! Nested objects and arrays flatten into bracketed keys (`a[b]=1`,
//! `a[0]=x`); every leaf key and value is encoded independently with the
//! `encodeURIComponent` set. `null` leaves are skipped.

use serde_json::{Map, Value};

use crate::encode::{encode_uri_component, value_to_string};

pub fn serialize_query(params: &Map<String, Value>) -> String {
    let mut pairs = Vec::new();
    for (key, value) in params {
        push_pairs(&mut pairs, key, value);
    }
    pairs.join("&")
}

fn push_pairs(pairs: &mut Vec<String>, key: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (sub, value) in map {
                push_pairs(pairs, &format!("{key}[{sub}]"), value);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                push_pairs(pairs, &format!("{key}[{index}]"), value);
            }
        }
        leaf => pairs.push(format!(
            "{}={}",
            encode_uri_component(key),
            encode_uri_component(&value_to_string(leaf))
        )),
    }
}

/// Append a serialized query to `url`, choosing `?`, `&` or nothing as the
/// joiner depending on what the URL already ends with.
pub fn append_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let joiner = match url.find('?') {
        None => "?",
        Some(_) if url.ends_with('?') => "",
        Some(_) => "&",
    };
    format!("{url}{joiner}{query}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(value: Value) -> String {
        match value {
            Value::Object(map) => serialize_query(&map),
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn flat_params() {
        assert_eq!(query(json!({"dir": "data/", "limit": 15})), "dir=data%2F&limit=15");
    }

    #[test]
    fn nested_params_use_brackets() {
        assert_eq!(
            query(json!({"filter": {"name": "a b", "tags": ["x", "y"]}})),
            "filter%5Bname%5D=a%20b&filter%5Btags%5D%5B0%5D=x&filter%5Btags%5D%5B1%5D=y"
        );
    }

    #[test]
    fn null_values_are_skipped() {
        assert_eq!(query(json!({"a": null, "b": 1})), "b=1");
    }

    #[test]
    fn empty_params_serialize_to_nothing() {
        assert_eq!(query(json!({})), "");
    }

    #[test]
    fn joiner_depends_on_existing_query() {
        assert_eq!(append_query("http://h/p", "a=1"), "http://h/p?a=1");
        assert_eq!(append_query("http://h/p?x=2", "a=1"), "http://h/p?x=2&a=1");
        assert_eq!(append_query("http://h/p?", "a=1"), "http://h/p?a=1");
        assert_eq!(append_query("http://h/p", ""), "http://h/p");
    }
}
