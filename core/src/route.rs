//! URL template binding.
//!
//! A template is a plain URL with `:name` placeholders. Binding substitutes
//! every placeholder with its segment-encoded value or drops it when no value
//! is available, normalizes slashes, and hands back whatever call-site
//! parameters were not consumed by the path so they can go to the query string.
//!
//! A backslash-escaped colon (`\:8080`) is never a placeholder.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};
use tracing::debug;

use crate::encode::{encode_segment, value_to_string};
use crate::error::ResourceError;

static FORMAT_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\.([0-9A-Za-z_]+)($|\?)").expect("a valid regex"));

const RESERVED_NAME: &str = "hasOwnProperty";

/// The result of binding parameters onto a template.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundUrl {
    pub url: String,
    /// Parameters that matched no placeholder, in call order.
    pub leftover: Map<String, Value>,
}

/// A URL template together with its fallback parameter values.
#[derive(Debug, Clone)]
pub struct Route {
    template: String,
    defaults: Map<String, Value>,
    strip_trailing_slashes: bool,
}

impl Route {
    pub fn new(template: &str, defaults: Map<String, Value>, strip_trailing_slashes: bool) -> Self {
        Self {
            template: template.to_string(),
            defaults,
            strip_trailing_slashes,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Bind `params` onto the template (or onto `action_url` when given).
    ///
    /// A placeholder takes its value from `params` when the key is present
    /// there, even if the value is `null`; otherwise from the route defaults.
    /// `strip_trailing_slashes` overrides the route setting for this call.
    pub fn bind(
        &self,
        params: &Map<String, Value>,
        action_url: Option<&str>,
        strip_trailing_slashes: Option<bool>,
    ) -> Result<BoundUrl, ResourceError> {
        let template = action_url.unwrap_or(&self.template);
        let url_params = url_params(template)?;
        let mut url = template.replace("\\:", ":");

        for name in &url_params {
            let value = match params.get(name.as_str()) {
                Some(value) => Some(value),
                None => self.defaults.get(name.as_str()),
            };
            url = match value {
                Some(value) if !value.is_null() => {
                    let encoded = encode_segment(&value_to_string(value));
                    replace_placeholder(&url, name, false, |_, tail| format!("{encoded}{tail}"))
                }
                _ => replace_placeholder(&url, name, true, |leading, tail| {
                    if tail.starts_with('/') {
                        tail.to_string()
                    } else {
                        format!("{leading}{tail}")
                    }
                }),
            };
        }

        if strip_trailing_slashes.unwrap_or(self.strip_trailing_slashes) {
            url = match url.trim_end_matches('/') {
                "" => "/".to_string(),
                trimmed => trimmed.to_string(),
            };
        }

        // `http://host/id./format?q` becomes `http://host/id.format?q`
        url = FORMAT_SUFFIX
            .replacen(&url, 1, |caps: &Captures| format!(".{}{}", &caps[1], &caps[2]))
            .into_owned();
        url = url.replacen("/\\.", "/.", 1);

        let leftover: Map<String, Value> = params
            .iter()
            .filter(|(key, _)| !url_params.iter().any(|name| name == *key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        debug!(template, %url, leftover = leftover.len(), "bound url template");
        Ok(BoundUrl { url, leftover })
    }
}

/// Placeholder names found in `template`, in first-seen order.
pub fn url_params(template: &str) -> Result<Vec<String>, ResourceError> {
    let mut names: Vec<String> = Vec::new();
    for token in template.split(|c: char| !is_word(c)) {
        if token == RESERVED_NAME {
            return Err(ResourceError::InvalidParamName(token.to_string()));
        }
        if token.is_empty() || token.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        if is_placeholder(template, token) && !names.iter().any(|name| name == token) {
            names.push(token.to_string());
        }
    }
    Ok(names)
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_placeholder(template: &str, name: &str) -> bool {
    find_placeholders(template, name)
        .any(|(start, _)| start == 0 || !template[..start].ends_with('\\'))
}

/// Yield `(start, end)` of every `:name` followed by a non-word character or
/// the end of input. `end` excludes the boundary character.
fn find_placeholders<'t>(
    template: &'t str,
    name: &'t str,
) -> impl Iterator<Item = (usize, usize)> + 't {
    let needle_len = name.len() + 1;
    template.match_indices(':').filter_map(move |(start, _)| {
        let end = start + needle_len;
        let rest = template.get(start + 1..)?;
        if !rest.starts_with(name) {
            return None;
        }
        match template[end..].chars().next() {
            Some(c) if is_word(c) => None,
            _ => Some((start, end)),
        }
    })
}

/// Replace every non-overlapping `(/?):name(\W|$)` occurrence.
///
/// `replace` receives the leading slash (empty unless `with_leading_slash`
/// and one was present) and the boundary character (empty at end of input).
/// A boundary character consumed by one match is not available to the next,
/// so `:a:a` only replaces the first `:a`.
fn replace_placeholder(
    url: &str,
    name: &str,
    with_leading_slash: bool,
    replace: impl Fn(&str, &str) -> String,
) -> String {
    let mut out = String::with_capacity(url.len());
    let mut last_end = 0;

    for (start, end) in find_placeholders(url, name) {
        if start < last_end {
            continue;
        }
        let tail_len = url[end..].chars().next().map_or(0, char::len_utf8);
        let tail = &url[end..end + tail_len];
        let lead_start = if with_leading_slash && start > last_end && url[..start].ends_with('/') {
            start - 1
        } else {
            start
        };
        out.push_str(&url[last_end..lead_start]);
        out.push_str(&replace(&url[lead_start..start], tail));
        last_end = end + tail_len;
    }

    out.push_str(&url[last_end..]);
    out
}
