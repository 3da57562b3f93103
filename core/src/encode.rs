//! RFC 3986 aware percent-encoding for path segments and query components.
//!
//! The base set mirrors `encodeURIComponent`: everything except ASCII
//! alphanumerics and `-_.!~*'()` is escaped. On top of that, query
//! components keep `@ : $ ,` literal and path segments additionally keep
//! `& = +` literal, since RFC 3986 allows all of them inside a `pchar`:
//!
//! ```text
//! pchar      = unreserved / pct-encoded / sub-delims / ":" / "@"
//! unreserved = ALPHA / DIGIT / "-" / "." / "_" / "~"
//! sub-delims = "!" / "$" / "&" / "'" / "(" / ")" / "*" / "+" / "," / ";" / "="
//! ```

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

/// Characters escaped by `encodeURIComponent`.
pub const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const QUERY_COMPONENT: &AsciiSet = &URI_COMPONENT
    .remove(b'@')
    .remove(b':')
    .remove(b'$')
    .remove(b',');

const PATH_SEGMENT: &AsciiSet = &QUERY_COMPONENT.remove(b'&').remove(b'=').remove(b'+');

/// Encode a value for use inside a URL path segment. Spaces become `%20`.
pub fn encode_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// Encode the key or value part of a query component.
///
/// Spaces become `%20` when `pct_encode_spaces` is set, `+` otherwise.
pub fn encode_query_component(value: &str, pct_encode_spaces: bool) -> String {
    let encoded = utf8_percent_encode(value, QUERY_COMPONENT).to_string();
    if pct_encode_spaces {
        encoded
    } else {
        encoded.replace("%20", "+")
    }
}

/// Plain `encodeURIComponent`, used for form-style query strings.
pub fn encode_uri_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Coerce a dynamic value to the string placed into a URL.
///
/// Arrays are comma-joined and objects become compact JSON. `null` coerces
/// to the empty string, which only matters inside arrays: a top-level null
/// never reaches the encoder.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_to_string(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}

fn number_to_string(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 => format!("{f:.0}"),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}
