//! Error types for resource definition, invocation and transport.
//!
//! # Design
//! `ResourceError` covers usage bugs: a bad extractor path, a forbidden
//! placeholder name, too many call arguments. They are returned synchronously
//! from the call that hit them and are never routed into a callback.
//! `TransportError` is what a transport hands to an error callback; the
//! resource layer never inspects it.

use thiserror::Error;

/// Errors raised while building a request configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResourceError {
    /// A `@dotted.path` extractor is empty, forbidden or malformed.
    #[error("dotted member path \"@{0}\" is invalid")]
    InvalidPath(String),

    /// A URL template placeholder uses a reserved name.
    #[error("{0} is not a valid parameter name")]
    InvalidParamName(String),

    /// An action was called with more than four positional arguments.
    #[error("expected up to 4 arguments [params, data, success, error], got {0} arguments")]
    TooManyArguments(usize),

    /// The resource has no action with this name.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// The request body could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Failures reported by a transport through the error callback.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The peer answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The round trip itself failed (connect, read, protocol).
    #[error("transport failed: {0}")]
    Io(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}
