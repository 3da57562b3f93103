//! Resource factory and per-call request assembly.
//!
//! # Design
//! A [`Service`] holds the service-wide defaults and the transport. Each
//! [`Resource`] it creates owns a copy of its route, parameter defaults and
//! merged action table; nothing is shared or mutated across calls. A call
//! resolves its arguments, evaluates defaults against the body, binds the
//! URL template and only then touches the transport. The `config`/`url`
//! methods stop right before dispatch.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::args::{resolve_args, CallArg};
use crate::error::ResourceError;
use crate::http::{HttpMethod, HttpRequest};
use crate::query::{append_query, serialize_query};
use crate::route::Route;
use crate::transport::{Callback, Transport};
use crate::types::{ActionSpec, Actions, ParamDefaults, RouteOptions, ServiceDefaults};

/// A request configuration for one call, built from scratch every time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig {
    pub method: HttpMethod,
    pub url: String,
    /// Parameters that did not bind to the path; they form the query string.
    pub params: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl ResolvedConfig {
    /// The URL with the query string appended.
    pub fn full_url(&self) -> String {
        append_query(&self.url, &serialize_query(&self.params))
    }

    /// Turn the config into a transport request. A body is sent as JSON.
    pub fn to_request(&self) -> Result<HttpRequest, ResourceError> {
        let mut headers = self.headers.clone();
        let body = match &self.data {
            Some(data) => {
                let body = serde_json::to_string(data)
                    .map_err(|e| ResourceError::Serialization(e.to_string()))?;
                if !headers.iter().any(|(name, _)| name.eq_ignore_ascii_case("content-type")) {
                    headers.push(("content-type".to_string(), "application/json".to_string()));
                }
                Some(body)
            }
            None => None,
        };
        Ok(HttpRequest {
            method: self.method,
            url: self.full_url(),
            headers,
            body,
        })
    }
}

/// Which action an introspection call resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigTarget<'a> {
    /// A named action. Unknown names resolve like an empty GET action.
    Action(&'a str),
    /// No action: only resource defaults and the given params apply.
    Bare,
}

/// Creates resources that share service-wide defaults and a transport.
#[derive(Clone)]
pub struct Service {
    defaults: ServiceDefaults,
    transport: Arc<dyn Transport>,
}

impl Service {
    pub fn new(defaults: ServiceDefaults, transport: Arc<dyn Transport>) -> Self {
        Self {
            defaults,
            transport,
        }
    }

    pub fn defaults(&self) -> &ServiceDefaults {
        &self.defaults
    }

    /// Define a resource. `actions` are layered over the service action
    /// table; an action with the same name replaces the built-in one.
    pub fn resource(
        &self,
        url: &str,
        param_defaults: ParamDefaults,
        actions: Actions,
        options: RouteOptions,
    ) -> Resource {
        let mut route_defaults = self.defaults.params.clone();
        route_defaults.extend(options.params);
        let strip = options
            .strip_trailing_slashes
            .unwrap_or(self.defaults.strip_trailing_slashes);

        let mut merged = self.defaults.actions.clone();
        merged.extend(actions);

        Resource {
            route: Route::new(url, route_defaults, strip),
            param_defaults,
            actions: merged,
            transport: Arc::clone(&self.transport),
        }
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

/// A URL template with named actions.
#[derive(Clone)]
pub struct Resource {
    route: Route,
    param_defaults: ParamDefaults,
    actions: Actions,
    transport: Arc<dyn Transport>,
}

impl Resource {
    pub fn template(&self) -> &str {
        self.route.template()
    }

    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn action(&self, name: &str) -> Option<&ActionSpec> {
        self.actions.get(name)
    }

    /// Invoke an action with up to four arguments and dispatch it.
    ///
    /// Usage errors are returned before anything is dispatched; transport
    /// outcomes only ever reach the callbacks.
    #[instrument(skip(self, args), fields(template = %self.route.template()))]
    pub fn call(&self, name: &str, args: Vec<CallArg>) -> Result<(), ResourceError> {
        let result = self.prepare(name, args);
        let (request, on_success, on_error) = result.inspect_err(|err| {
            warn!(action = name, error = %err, "rejected resource call");
        })?;
        debug!(action = name, method = %request.method, url = %request.url, "dispatching action");
        self.transport.dispatch(
            request,
            on_success.unwrap_or_else(Callback::noop),
            on_error.unwrap_or_else(Callback::noop),
        );
        Ok(())
    }

    /// Resolve the request configuration without dispatching.
    ///
    /// Extractors see `data`, but no body is attached.
    pub fn config(
        &self,
        target: ConfigTarget<'_>,
        params: Option<Value>,
        data: Option<Value>,
    ) -> Result<ResolvedConfig, ResourceError> {
        let action = match target {
            ConfigTarget::Action(name) => self
                .actions
                .get(name)
                .map(Cow::Borrowed)
                .unwrap_or_default(),
            ConfigTarget::Bare => Cow::Owned(ActionSpec::default()),
        };
        self.build_config(&action, false, params, data)
    }

    /// Resolve the full request URL, query string included.
    pub fn url(
        &self,
        target: ConfigTarget<'_>,
        params: Option<Value>,
        data: Option<Value>,
    ) -> Result<String, ResourceError> {
        Ok(self.config(target, params, data)?.full_url())
    }

    #[allow(clippy::type_complexity)]
    fn prepare(
        &self,
        name: &str,
        args: Vec<CallArg>,
    ) -> Result<(HttpRequest, Option<Callback>, Option<Callback>), ResourceError> {
        let action = self
            .actions
            .get(name)
            .ok_or_else(|| ResourceError::UnknownAction(name.to_string()))?;
        let has_body = action.has_body();
        let invocation = resolve_args(has_body, args)?;
        let config = self.build_config(action, has_body, invocation.params, invocation.data)?;
        Ok((config.to_request()?, invocation.on_success, invocation.on_error))
    }

    fn build_config(
        &self,
        action: &ActionSpec,
        has_body: bool,
        params: Option<Value>,
        data: Option<Value>,
    ) -> Result<ResolvedConfig, ResourceError> {
        let mut call_params = self
            .param_defaults
            .merged(&action.params)
            .evaluate(data.as_ref())?;
        match params {
            Some(Value::Object(overrides)) => call_params.extend(overrides),
            Some(Value::Null) | None => {}
            Some(other) => warn!(params = %other, "ignoring call params that are not an object"),
        }

        let bound = self
            .route
            .bind(&call_params, action.url.as_deref(), action.strip_trailing_slashes)?;

        let mut options = action.options.clone();
        options.remove("interceptor");

        Ok(ResolvedConfig {
            method: action.method,
            url: bound.url,
            params: bound.leftover,
            data: if has_body { data } else { None },
            headers: action.headers.clone(),
            options,
        })
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("route", &self.route)
            .field("param_defaults", &self.param_defaults)
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}
