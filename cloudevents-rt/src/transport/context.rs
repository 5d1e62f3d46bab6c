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

//! Per-request context passed through send and receive.

use crate::codec::Encoding;
use crate::types::Timestamp;
use tokio_util::sync::CancellationToken;

/// Wire details of an inbound message, exposed to handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportContext {
    /// An HTTP request
    Http {
        /// Request URI
        uri: String,
        /// `Host` header
        host: Option<String>,
        /// Request method
        method: String,
        /// All request headers, names lowercased
        headers: Vec<(String, String)>,
    },
    /// A Kafka record
    Kafka {
        /// Topic the record came from
        topic: String,
        /// Partition
        partition: i32,
        /// Offset within the partition
        offset: i64,
        /// Record key
        key: Option<Vec<u8>>,
    },
    /// A NATS message
    Nats {
        /// Subject the message was published on
        subject: String,
    },
    /// A Pub/Sub message
    PubSub {
        /// Message id assigned by the service
        id: String,
        /// Subscription it was pulled from
        subscription: String,
        /// When the service accepted it
        publish_time: Option<Timestamp>,
    },
}

/// Request-scoped values: cancellation, transport details of an inbound
/// message, and per-request overrides for outbound sends.
///
/// Cloning is cheap and clones share the cancellation token.
///
/// # Examples
///
/// ```rust
/// use cloudevents_rt::codec::Encoding;
/// use cloudevents_rt::transport::RequestContext;
///
/// let ctx = RequestContext::new()
///     .with_target("http://localhost:8181/")
///     .with_header("authorization", "Bearer abc")
///     .with_encoding("structured".parse::<Encoding>().unwrap());
/// assert_eq!(ctx.target(), Some("http://localhost:8181/"));
/// assert!(!ctx.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    transport: Option<TransportContext>,
    target: Option<String>,
    headers: Vec<(String, String)>,
    encoding: Option<Encoding>,
    trace_parent: Option<String>,
    trace_state: Option<String>,
}

impl RequestContext {
    /// Creates an empty context with a fresh cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `token` for cancellation.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Returns a copy whose token is a child of this one.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            ..self.clone()
        }
    }

    /// Returns the cancellation token.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Returns `true` once the context is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Overrides the outbound target URL.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Returns the outbound target override.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Adds an outbound header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the additional outbound headers.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Overrides the outbound encoding.
    #[must_use]
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Returns the encoding override.
    #[must_use]
    pub fn encoding(&self) -> Option<Encoding> {
        self.encoding
    }

    /// Sets the W3C trace parent to propagate.
    #[must_use]
    pub fn with_trace_parent(mut self, trace_parent: impl Into<String>) -> Self {
        self.trace_parent = Some(trace_parent.into());
        self
    }

    /// Returns the trace parent.
    #[must_use]
    pub fn trace_parent(&self) -> Option<&str> {
        self.trace_parent.as_deref()
    }

    /// Sets the W3C trace state to propagate.
    #[must_use]
    pub fn with_trace_state(mut self, trace_state: impl Into<String>) -> Self {
        self.trace_state = Some(trace_state.into());
        self
    }

    /// Returns the trace state.
    #[must_use]
    pub fn trace_state(&self) -> Option<&str> {
        self.trace_state.as_deref()
    }

    /// Attaches inbound wire details.
    #[must_use]
    pub fn with_transport_context(mut self, transport: TransportContext) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Returns the inbound wire details, if this context came from a
    /// receiver.
    #[must_use]
    pub fn transport_context(&self) -> Option<&TransportContext> {
        self.transport.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_cancelled_with_parent() {
        let parent = RequestContext::new();
        let child = parent.child();
        parent.cancellation().cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn test_child_cancel_leaves_parent() {
        let parent = RequestContext::new().with_target("http://a/");
        let child = parent.child();
        child.cancellation().cancel();
        assert!(!parent.is_cancelled());
        assert_eq!(child.target(), Some("http://a/"));
    }

    #[test]
    fn test_transport_context() {
        let ctx = RequestContext::new().with_transport_context(TransportContext::Nats {
            subject: "events".to_string(),
        });
        assert!(matches!(
            ctx.transport_context(),
            Some(TransportContext::Nats { subject }) if subject == "events"
        ));
    }
}
