//! Declarative REST resources: URL templates, named actions and per-call
//! request assembly.
//!
//! # Overview
//! A resource is a URL template such as `http://host/posts/:id` plus a table
//! of actions (`get`, `save`, `query`, `remove`, `delete` and any custom
//! ones). Calling an action resolves up to four loosely-typed arguments into
//! params, body and callbacks, evaluates parameter defaults (literals,
//! closures, `@dotted.path` extractors against the body), binds the template
//! and hands a finished [`HttpRequest`] to a [`Transport`].
//!
//! # Design
//! - Request assembly is synchronous and deterministic; only the transport
//!   does I/O, and it reports back through exactly one callback.
//! - Every call builds its own [`ResolvedConfig`]; resources are read-only
//!   after construction.
//! - Usage errors ([`ResourceError`]) are returned immediately, transport
//!   failures ([`TransportError`]) only reach the error callback.

pub mod args;
pub mod encode;
pub mod error;
pub mod http;
pub mod path;
pub mod query;
pub mod resource;
pub mod route;
pub mod transport;
pub mod types;

pub use args::{classify, resolve_args, ArgLayout, CallArg, Invocation};
pub use error::{ResourceError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use path::DottedPath;
pub use resource::{ConfigTarget, ResolvedConfig, Resource, Service};
pub use route::{BoundUrl, Route};
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use transport::{Callback, Outcome, Transport};
pub use types::{default_actions, ActionSpec, Actions, ParamDefault, ParamDefaults, RouteOptions, ServiceDefaults};
