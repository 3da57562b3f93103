//! The seam between request assembly and network I/O.
//!
//! A resource call builds an [`HttpRequest`] and hands it to a [`Transport`]
//! with two callbacks. The transport settles the request eventually (or
//! never) and invokes exactly one of them. Retries, timeouts, redirects and
//! TLS are the transport's business.

use std::fmt;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

/// What a callback receives when a request settles.
pub type Outcome = Result<HttpResponse, TransportError>;

/// A one-shot completion handler.
pub struct Callback(Box<dyn FnOnce(Outcome) + Send>);

impl Callback {
    pub fn new(f: impl FnOnce(Outcome) + Send + 'static) -> Self {
        Self(Box::new(f))
    }

    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    pub fn call(self, outcome: Outcome) {
        (self.0)(outcome)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback")
    }
}

/// Executes finished requests.
///
/// Implementations must not block the caller of `dispatch` on the round trip.
pub trait Transport: Send + Sync {
    fn dispatch(&self, request: HttpRequest, on_success: Callback, on_error: Callback);
}

/// Route a settled response to the matching callback: 2xx is a success,
/// anything else an error carrying status and body.
pub fn settle(result: Outcome, on_success: Callback, on_error: Callback) {
    match result {
        Ok(response) if response.is_success() => on_success.call(Ok(response)),
        Ok(response) => on_error.call(Err(TransportError::Status {
            status: response.status,
            body: response.body,
        })),
        Err(err) => on_error.call(Err(err)),
    }
}

#[cfg(feature = "ureq")]
pub use blocking::UreqTransport;

#[cfg(feature = "ureq")]
mod blocking {
    use tracing::{debug, warn};

    use super::{settle, Callback, Transport};
    use crate::error::TransportError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Transport backed by a blocking `ureq` agent, one thread per request.
    ///
    /// Status codes are returned as data, not as agent errors, so 4xx/5xx
    /// responses reach the error callback with their body intact.
    #[derive(Debug, Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl UreqTransport {
        pub fn new() -> Self {
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent();
            Self { agent }
        }

        /// Perform the round trip on the current thread.
        pub fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            let url = request.url.as_str();
            let result = match request.method {
                HttpMethod::Get => with_headers(self.agent.get(url), &request.headers).call(),
                HttpMethod::Delete => with_headers(self.agent.delete(url), &request.headers).call(),
                HttpMethod::Head => with_headers(self.agent.head(url), &request.headers).call(),
                HttpMethod::Options => {
                    with_headers(self.agent.options(url), &request.headers).call()
                }
                HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch => {
                    let builder = match request.method {
                        HttpMethod::Post => self.agent.post(url),
                        HttpMethod::Put => self.agent.put(url),
                        _ => self.agent.patch(url),
                    };
                    let builder = with_headers(builder, &request.headers);
                    match &request.body {
                        Some(body) => builder.send(body.as_bytes()),
                        None => builder.send_empty(),
                    }
                }
            };

            let mut response = result.map_err(|e| TransportError::Io(e.to_string()))?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    Some((name.as_str().to_string(), value.to_str().ok()?.to_string()))
                })
                .collect();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| TransportError::Io(e.to_string()))?;

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }

    impl Transport for UreqTransport {
        fn dispatch(&self, request: HttpRequest, on_success: Callback, on_error: Callback) {
            let transport = self.clone();
            debug!(method = %request.method, url = %request.url, "dispatching request");
            std::thread::spawn(move || {
                let result = transport.execute(&request);
                if let Err(err) = &result {
                    warn!(url = %request.url, error = %err, "request failed");
                }
                settle(result, on_success, on_error);
            });
        }
    }

    fn with_headers<B>(
        mut builder: ureq::RequestBuilder<B>,
        headers: &[(String, String)],
    ) -> ureq::RequestBuilder<B> {
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }
}
