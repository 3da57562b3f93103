//! Validated `@dotted.path` lookups into a request body.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::ResourceError;

static MEMBER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\.[a-zA-Z_$][0-9a-zA-Z_$]*)+$").expect("a valid regex")
});

/// A dotted member path such as `user.profile.name`.
///
/// Every segment is an ASCII identifier (`[A-Za-z_$][A-Za-z0-9_$]*`) and the
/// path as a whole may not be `hasOwnProperty`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DottedPath {
    raw: String,
}

impl DottedPath {
    pub fn parse(path: &str) -> Result<Self, ResourceError> {
        if is_valid_dotted_path(path) {
            Ok(Self {
                raw: path.to_string(),
            })
        } else {
            Err(ResourceError::InvalidPath(path.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.raw.split('.')
    }

    /// Walk `root` segment by segment.
    ///
    /// `None` means the value is absent. Lookup stops at the first absent
    /// step; a `null` (or any non-object) along the way makes the remaining
    /// steps absent instead of failing.
    pub fn resolve<'v>(&self, root: Option<&'v Value>) -> Option<&'v Value> {
        let mut current = root;
        for key in self.segments() {
            current = match current? {
                Value::Object(map) => map.get(key),
                _ => None,
            };
        }
        current
    }
}

impl fmt::Display for DottedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.raw)
    }
}

fn is_valid_dotted_path(path: &str) -> bool {
    !path.is_empty() && path != "hasOwnProperty" && MEMBER_NAME.is_match(&format!(".{path}"))
}

/// Parse and resolve in one step.
pub fn lookup_dotted_path<'v>(
    root: Option<&'v Value>,
    path: &str,
) -> Result<Option<&'v Value>, ResourceError> {
    Ok(DottedPath::parse(path)?.resolve(root))
}
