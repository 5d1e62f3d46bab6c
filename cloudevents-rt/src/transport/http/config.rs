//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! HTTP transport configuration.

use crate::codec::{Encoding, EncodingSelector, binary_encoding_selector};
use axum::Router;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default receiver port.
pub const DEFAULT_PORT: u16 = 8080;

pub use crate::transport::DEFAULT_SHUTDOWN_TIMEOUT;

/// Default bound on an inbound request body, in bytes.
pub const DEFAULT_MAX_BODY_SIZE: usize = 4 * 1024 * 1024;

/// Wraps the receiver's router, e.g. to add layers or extra routes.
pub type Middleware = Arc<dyn Fn(Router) -> Router + Send + Sync>;

/// Configuration for [`HttpTransport`](super::HttpTransport).
///
/// # Examples
///
/// ```rust
/// use cloudevents_rt::codec::Encoding;
/// use cloudevents_rt::event::SpecVersion;
/// use cloudevents_rt::transport::http::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig::default()
///     .with_target("http://localhost:8181/")
///     .with_encoding(Encoding::Structured(SpecVersion::V03))
///     .with_port(0)
///     .with_shutdown_timeout(Duration::from_secs(5));
/// assert_eq!(config.method(), "POST");
/// assert_eq!(config.path(), "/");
/// ```
pub struct HttpConfig {
    pub(crate) target: Option<String>,
    pub(crate) method: String,
    pub(crate) port: u16,
    pub(crate) path: String,
    pub(crate) encoding: Encoding,
    pub(crate) encoding_selector: EncodingSelector,
    pub(crate) shutdown_timeout: Duration,
    pub(crate) max_body_size: usize,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) middleware: Vec<Middleware>,
    pub(crate) long_poll_target: Option<String>,
    pub(crate) long_poll_interval: Duration,
    pub(crate) listener: Option<std::net::TcpListener>,
    pub(crate) trace_propagation: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            target: None,
            method: "POST".to_string(),
            port: DEFAULT_PORT,
            path: "/".to_string(),
            encoding: Encoding::Default,
            encoding_selector: binary_encoding_selector(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            headers: Vec::new(),
            middleware: Vec::new(),
            long_poll_target: None,
            long_poll_interval: Duration::from_secs(1),
            listener: None,
            trace_propagation: true,
        }
    }
}

impl fmt::Debug for HttpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpConfig")
            .field("target", &self.target)
            .field("method", &self.method)
            .field("port", &self.port)
            .field("path", &self.path)
            .field("encoding", &self.encoding)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("max_body_size", &self.max_body_size)
            .field("headers", &self.headers)
            .field("middleware", &self.middleware.len())
            .field("long_poll_target", &self.long_poll_target)
            .field("listener", &self.listener)
            .field("trace_propagation", &self.trace_propagation)
            .finish_non_exhaustive()
    }
}

impl HttpConfig {
    /// Sets the outbound target URL.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Sets the outbound request method.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Sets the receiver port. Zero picks an ephemeral port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the receiver path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Fixes the outbound encoding. [`Encoding::Default`] defers to the
    /// selector.
    #[must_use]
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Replaces the encoding selector.
    #[must_use]
    pub fn with_encoding_selector(mut self, selector: EncodingSelector) -> Self {
        self.encoding_selector = selector;
        self
    }

    /// Bounds graceful shutdown.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Bounds the size of an inbound request body. Larger requests are
    /// answered with `413 Payload Too Large`.
    #[must_use]
    pub fn with_max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Adds a header to every outbound request.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Wraps the receiver's router. Middleware applies in insertion order.
    #[must_use]
    pub fn with_middleware(mut self, middleware: Middleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Polls `target` for inbound messages instead of serving.
    #[must_use]
    pub fn with_long_poll_target(mut self, target: impl Into<String>) -> Self {
        self.long_poll_target = Some(target.into());
        self
    }

    /// Sets the pause after a failed or empty long poll.
    #[must_use]
    pub fn with_long_poll_interval(mut self, interval: Duration) -> Self {
        self.long_poll_interval = interval;
        self
    }

    /// Serves on an already bound listener instead of binding `port`.
    #[must_use]
    pub fn with_listener(mut self, listener: std::net::TcpListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Turns `traceparent`/`tracestate` header propagation on or off.
    #[must_use]
    pub fn with_trace_propagation(mut self, enabled: bool) -> Self {
        self.trace_propagation = enabled;
        self
    }

    /// Returns the outbound target URL.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Returns the outbound request method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the configured receiver port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the receiver path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the fixed encoding.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Returns the shutdown bound.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Returns the inbound body bound.
    #[must_use]
    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.method(), "POST");
        assert_eq!(config.port(), 8080);
        assert_eq!(config.path(), "/");
        assert_eq!(config.encoding(), Encoding::Default);
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(60));
        assert_eq!(config.max_body_size(), DEFAULT_MAX_BODY_SIZE);
        assert!(config.target().is_none());
    }

    #[test]
    fn test_debug_hides_closures() {
        let config = HttpConfig::default().with_middleware(Arc::new(|router| router));
        let text = format!("{config:?}");
        assert!(text.contains("middleware: 1"));
    }
}
