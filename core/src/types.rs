//! Resource definition types.
//!
//! # Design
//! Everything here is captured once, when a resource is defined, and only
//! read afterwards. Literal values and action tables deserialize from JSON so
//! resources can be declared in configuration; computed defaults (`Lazy`)
//! are code-only.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::ResourceError;
use crate::http::HttpMethod;
use crate::path::DottedPath;

/// Default value of one request parameter.
#[derive(Clone)]
pub enum ParamDefault {
    /// A literal. A string starting with `@` is read as an extractor.
    Value(Value),
    /// Produced anew on every call; an `@` string result is an extractor too.
    Lazy(Arc<dyn Fn() -> Value + Send + Sync>),
    /// Looked up in the request body on every call.
    Extract(DottedPath),
}

impl ParamDefault {
    pub fn value(value: impl Into<Value>) -> Self {
        ParamDefault::Value(value.into())
    }

    pub fn lazy(f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        ParamDefault::Lazy(Arc::new(f))
    }

    pub fn extract(path: &str) -> Result<Self, ResourceError> {
        DottedPath::parse(path).map(ParamDefault::Extract)
    }

    /// Produce the value for one call. An absent extraction yields `null`.
    pub fn evaluate(&self, data: Option<&Value>) -> Result<Value, ResourceError> {
        let value = match self {
            ParamDefault::Extract(path) => return Ok(path.resolve(data).cloned().unwrap_or(Value::Null)),
            ParamDefault::Value(value) => value.clone(),
            ParamDefault::Lazy(f) => f(),
        };
        match value.as_str().and_then(|s| s.strip_prefix('@')) {
            Some(path) => Ok(DottedPath::parse(path)?
                .resolve(data)
                .cloned()
                .unwrap_or(Value::Null)),
            None => Ok(value),
        }
    }
}

impl fmt::Debug for ParamDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamDefault::Value(value) => f.debug_tuple("Value").field(value).finish(),
            ParamDefault::Lazy(_) => f.write_str("Lazy(..)"),
            ParamDefault::Extract(path) => f.debug_tuple("Extract").field(path).finish(),
        }
    }
}

impl From<Value> for ParamDefault {
    fn from(value: Value) -> Self {
        ParamDefault::Value(value)
    }
}

/// Ordered parameter defaults. Insertion order is kept because leftover
/// parameters become the query string in that order.
#[derive(Debug, Clone, Default)]
pub struct ParamDefaults {
    entries: Vec<(String, ParamDefault)>,
}

impl ParamDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; a replaced entry keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, default: impl Into<ParamDefault>) {
        let name = name.into();
        let default = default.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => *slot = default,
            None => self.entries.push((name, default)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, default: impl Into<ParamDefault>) -> Self {
        self.insert(name, default);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamDefault> {
        self.entries.iter().find(|(key, _)| key == name).map(|(_, default)| default)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamDefault)> {
        self.entries.iter().map(|(key, default)| (key.as_str(), default))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `other` layered over `self`.
    pub fn merged(&self, other: &ParamDefaults) -> ParamDefaults {
        let mut merged = self.clone();
        for (name, default) in other.iter() {
            merged.insert(name, default.clone());
        }
        merged
    }

    /// Evaluate every default against the request body.
    pub fn evaluate(&self, data: Option<&Value>) -> Result<Map<String, Value>, ResourceError> {
        self.iter()
            .map(|(name, default)| Ok((name.to_string(), default.evaluate(data)?)))
            .collect()
    }
}

impl From<Map<String, Value>> for ParamDefaults {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            entries: map
                .into_iter()
                .map(|(key, value)| (key, ParamDefault::Value(value)))
                .collect(),
        }
    }
}

impl<'de> Deserialize<'de> for ParamDefaults {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::<String, Value>::deserialize(deserializer).map(ParamDefaults::from)
    }
}

/// One named operation of a resource.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActionSpec {
    pub method: HttpMethod,
    /// Action defaults, layered over the resource defaults.
    pub params: ParamDefaults,
    /// Replaces the resource URL template for this action.
    pub url: Option<String>,
    #[serde(alias = "stripTrailingSlashes")]
    pub strip_trailing_slashes: Option<bool>,
    pub headers: Vec<(String, String)>,
    /// Remaining transport options, copied into every request config.
    /// An `interceptor` entry is never copied.
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl ActionSpec {
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, default: impl Into<ParamDefault>) -> Self {
        self.params.insert(name, default);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    pub fn with_strip_trailing_slashes(mut self, strip: bool) -> Self {
        self.strip_trailing_slashes = Some(strip);
        self
    }

    pub fn has_body(&self) -> bool {
        self.method.has_body()
    }
}

pub type Actions = BTreeMap<String, ActionSpec>;

/// The built-in action table every resource starts from.
pub fn default_actions() -> Actions {
    [
        ("get", HttpMethod::Get),
        ("save", HttpMethod::Post),
        ("query", HttpMethod::Get),
        ("remove", HttpMethod::Delete),
        ("delete", HttpMethod::Delete),
    ]
    .into_iter()
    .map(|(name, method)| (name.to_string(), ActionSpec::new(method)))
    .collect()
}

/// Service-wide defaults, applied to every resource a service creates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceDefaults {
    #[serde(alias = "stripTrailingSlashes")]
    pub strip_trailing_slashes: bool,
    pub actions: Actions,
    /// Placeholder fallbacks used when a call supplies no value.
    pub params: Map<String, Value>,
}

impl Default for ServiceDefaults {
    fn default() -> Self {
        Self {
            strip_trailing_slashes: true,
            actions: default_actions(),
            params: Map::new(),
        }
    }
}

/// Per-resource overrides of [`ServiceDefaults`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RouteOptions {
    #[serde(alias = "stripTrailingSlashes")]
    pub strip_trailing_slashes: Option<bool>,
    pub params: Map<String, Value>,
}
