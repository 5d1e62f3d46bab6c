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

//! HTTP transport.
//!
//! Sends with `reqwest` and receives with an `axum` server (or by long
//! polling a URL). Binary mode carries attributes in `ce-` headers and the
//! data content type in `Content-Type`; structured and batched modes carry
//! the JSON document as the body.
//!
//! Inbound requests get:
//!
//! | Outcome                        | Status                     |
//! |--------------------------------|----------------------------|
//! | handler set a reply event      | 200 (or the status it set) |
//! | handler returned without reply | 202 (or the status it set) |
//! | handler failed                 | 500 (or the status it set) |
//! | message could not be decoded   | 400                        |
//!
//! # Examples
//!
//! ```rust,no_run
//! use cloudevents_rt::transport::http::{HttpConfig, HttpTransport};
//! use cloudevents_rt::transport::Transport;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new(HttpConfig::default().with_port(0))?;
//! let cancel = CancellationToken::new();
//! let stop = cancel.clone();
//! tokio::spawn(async move {
//!     tokio::time::sleep(std::time::Duration::from_secs(1)).await;
//!     stop.cancel();
//! });
//! transport.start_receiver(cancel).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod message;

pub use self::config::{
    DEFAULT_MAX_BODY_SIZE, DEFAULT_PORT, DEFAULT_SHUTDOWN_TIMEOUT, HttpConfig, Middleware,
};
pub use self::message::HttpMessage;

use super::dispatch::Dispatcher;
use super::lifecycle::{Lifecycle, ReceiverState};
use super::message::headers_from_parts;
use super::{Converter, Message, Receiver, RequestContext, Transport, TransportError};
use crate::codec::{Codec, CodecError, EncodedEvent, MessageEncoding, classify, resolve_encoding};
use crate::event::Event;
use crate::observability::{Measure, report};
use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use axum::routing::any;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

const TRANSPORT: &str = "http";
const TRACE_PARENT_HEADER: &str = "traceparent";
const TRACE_STATE_HEADER: &str = "tracestate";

/// State shared between the transport and its server tasks.
struct Shared {
    config: HttpConfig,
    dispatcher: Dispatcher,
    codec: OnceLock<Codec>,
}

impl Shared {
    fn codec(&self) -> &Codec {
        self.codec
            .get_or_init(|| Codec::new(TRANSPORT).with_batched())
    }

    fn inbound_context(&self, message: &HttpMessage, cancel: CancellationToken) -> RequestContext {
        let mut ctx = RequestContext::new().with_cancellation(cancel);
        if let Some(transport) = message.transport_context() {
            ctx = ctx.with_transport_context(transport);
        }
        if self.config.trace_propagation {
            if let Some(parent) = message.header(TRACE_PARENT_HEADER) {
                ctx = ctx.with_trace_parent(parent);
            }
            if let Some(state) = message.header(TRACE_STATE_HEADER) {
                ctx = ctx.with_trace_state(state);
            }
        }
        ctx
    }

    /// Decodes, dispatches and builds the reply for one inbound message.
    async fn process(&self, ctx: &RequestContext, message: &HttpMessage) -> Reply {
        let events = match self.dispatcher.decode(self.codec(), ctx, message).await {
            Ok(events) => events,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    uri = %message.uri,
                    "failed to decode inbound message"
                );
                return Reply::text(StatusCode::BAD_REQUEST, err.to_string());
            }
        };
        let delivery = self.dispatcher.deliver(ctx, events).await;
        let response = delivery.response;
        let status = response.status().and_then(|code| StatusCode::from_u16(code).ok());

        if let Some(err) = delivery.error {
            let reason = response.reason().unwrap_or_else(|| err.to_string());
            return Reply::text(status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR), reason);
        }
        let Some(event) = response.take_event() else {
            return Reply::text(
                status.unwrap_or(StatusCode::ACCEPTED),
                response.reason().unwrap_or_default(),
            );
        };
        let encoding = resolve_encoding(
            ctx,
            self.config.encoding,
            &self.config.encoding_selector,
            &event,
        );
        let mut headers = HeaderMap::new();
        match self
            .codec()
            .encode(encoding, &event)
            .and_then(|encoded| apply_encoded(encoded, &mut headers))
        {
            Ok(body) => Reply {
                status: status.unwrap_or(StatusCode::OK),
                headers,
                body,
            },
            Err(err) => {
                tracing::warn!(error = %err, id = event.id(), "failed to encode reply event");
                Reply::text(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        }
    }
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Reply {
    fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into().into_bytes(),
        }
    }

    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

struct ServerState {
    shared: Arc<Shared>,
    cancel: CancellationToken,
}

async fn handle(State(state): State<Arc<ServerState>>, request: Request) -> Response {
    let reporter = report(Measure::HttpTransport, "receive");
    let span = reporter.span().clone();
    let (parts, body) = request.into_parts();
    let limit = state.shared.config.max_body_size;
    let declared = parts
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());
    if declared.is_some_and(|length| length > limit) {
        tracing::warn!(limit, "request body too large");
        reporter.error();
        let reason = format!("request body exceeds {limit} bytes");
        return Reply::text(StatusCode::PAYLOAD_TOO_LARGE, reason).into_response();
    }
    let body = match axum::body::to_bytes(body, limit).await {
        Ok(body) => body.to_vec(),
        Err(err) => {
            tracing::warn!(error = %err, "failed to read request body");
            reporter.error();
            return Reply::text(StatusCode::BAD_REQUEST, err.to_string()).into_response();
        }
    };
    let message = HttpMessage {
        method: parts.method.to_string(),
        uri: parts.uri.to_string(),
        headers: parts.headers,
        body,
    };
    let ctx = state
        .shared
        .inbound_context(&message, state.cancel.child_token());
    let reply = state
        .shared
        .process(&ctx, &message)
        .instrument(span)
        .await;
    if reply.status.is_success() {
        reporter.ok();
    } else {
        reporter.error();
    }
    reply.into_response()
}

/// Puts an encoded event's content type and attributes into `headers` and
/// returns the body.
fn apply_encoded(encoded: EncodedEvent, headers: &mut HeaderMap) -> Result<Vec<u8>, CodecError> {
    if let Some(content_type) = encoded.content_type() {
        insert_header(headers, CONTENT_TYPE.as_str(), content_type)?;
    }
    match encoded {
        EncodedEvent::Binary(parts) => {
            for (name, value) in headers_from_parts(&parts) {
                insert_header(headers, &name, value)?;
            }
            Ok(parts.body)
        }
        EncodedEvent::Structured(body) | EncodedEvent::Batched(body) => Ok(body),
    }
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), CodecError> {
    let header = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| CodecError::binary(format!("invalid header name {name:?}")))?;
    let value = HeaderValue::from_str(value)
        .map_err(|_| CodecError::binary(format!("invalid value for header {name}")))?;
    headers.insert(header, value);
    Ok(())
}

/// CloudEvents over HTTP.
pub struct HttpTransport {
    shared: Arc<Shared>,
    client: reqwest::Client,
    method: reqwest::Method,
    listener: Mutex<Option<std::net::TcpListener>>,
    lifecycle: Lifecycle,
    port: AtomicU16,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("config", &self.shared.config)
            .field("state", &self.lifecycle.state())
            .field("port", &self.port())
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Creates a transport from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidConfiguration`] for an unparsable
    /// method or target, or a path that does not start with `/`.
    pub fn new(mut config: HttpConfig) -> Result<Self, TransportError> {
        let method = reqwest::Method::from_bytes(config.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| {
                TransportError::invalid_configuration(format!("invalid method {:?}", config.method))
            })?;
        if !config.path.starts_with('/') {
            return Err(TransportError::invalid_configuration(format!(
                "path {:?} must start with '/'",
                config.path
            )));
        }
        for target in config.target.iter().chain(config.long_poll_target.iter()) {
            reqwest::Url::parse(target).map_err(|e| {
                TransportError::invalid_configuration(format!("invalid target {target:?}: {e}"))
            })?;
        }
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::invalid_configuration(e.to_string()))?;
        let listener = config.listener.take();
        let port = config.port;
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                dispatcher: Dispatcher::default(),
                codec: OnceLock::new(),
            }),
            client,
            method,
            listener: Mutex::new(listener),
            lifecycle: Lifecycle::new(TRANSPORT),
            port: AtomicU16::new(port),
        })
    }

    /// Returns the receiver port: the bound port once listening, the
    /// configured one before.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port.load(Ordering::Acquire)
    }

    /// Returns the receiver lifecycle state.
    #[must_use]
    pub fn state(&self) -> ReceiverState {
        self.lifecycle.state()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &HttpConfig {
        &self.shared.config
    }

    #[cfg_attr(
        feature = "observability",
        tracing::instrument(skip(self, ctx, event), fields(id = event.id()))
    )]
    async fn send_event(
        &self,
        ctx: &RequestContext,
        event: Event,
    ) -> Result<Option<Event>, TransportError> {
        if ctx.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        let config = &self.shared.config;
        let url = ctx
            .target()
            .or(config.target.as_deref())
            .ok_or_else(|| TransportError::invalid_configuration("no target configured"))?
            .to_string();

        let encoding = resolve_encoding(ctx, config.encoding, &config.encoding_selector, &event);
        let mut headers = HeaderMap::new();
        for (name, value) in config.headers.iter().chain(ctx.headers()) {
            insert_header(&mut headers, name, value)?;
        }
        if config.trace_propagation {
            if let Some(parent) = ctx.trace_parent() {
                insert_header(&mut headers, TRACE_PARENT_HEADER, parent)?;
            }
            if let Some(state) = ctx.trace_state() {
                insert_header(&mut headers, TRACE_STATE_HEADER, state)?;
            }
        }
        let encoded = self.shared.codec().encode(encoding, &event)?;
        let body = apply_encoded(encoded, &mut headers)?;
        tracing::debug!(%url, %encoding, "sending event");

        let request = self
            .client
            .request(self.method.clone(), &url)
            .headers(headers)
            .body(body);
        let response = tokio::select! {
            () = ctx.cancellation().cancelled() => return Err(TransportError::Cancelled),
            response = request.send() => response,
        }
        .map_err(|source| TransportError::RequestFailed {
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|source| TransportError::RequestFailed {
                url: url.clone(),
                source,
            })?
            .to_vec();
        if !status.is_success() {
            return Err(TransportError::BadStatus {
                code: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        let reply = HttpMessage {
            method: String::new(),
            uri: url,
            headers,
            body,
        };
        let is_event = classify(reply.content_type().as_deref()) != MessageEncoding::Binary
            || reply.headers.contains_key("ce-specversion");
        if !is_event {
            return Ok(None);
        }
        Ok(self.shared.codec().decode(&reply)?.into_iter().next())
    }

    async fn bind(&self) -> Result<tokio::net::TcpListener, TransportError> {
        let provided = self.listener.lock().take();
        if let Some(listener) = provided {
            listener.set_nonblocking(true)?;
            return Ok(tokio::net::TcpListener::from_std(listener)?);
        }
        let address = format!("0.0.0.0:{}", self.shared.config.port);
        tokio::net::TcpListener::bind(&address)
            .await
            .map_err(|source| TransportError::BindFailed { address, source })
    }

    async fn serve(&self, cancel: CancellationToken) -> Result<(), TransportError> {
        let guard = self.lifecycle.start()?;
        let listener = self.bind().await?;
        let addr = listener.local_addr()?;
        self.port.store(addr.port(), Ordering::Release);
        let config = &self.shared.config;
        tracing::info!(%addr, path = %config.path, "http receiver listening");

        let state = Arc::new(ServerState {
            shared: self.shared.clone(),
            cancel: cancel.clone(),
        });
        let mut router = Router::new()
            .route(&config.path, any(handle))
            .with_state(state);
        for middleware in &config.middleware {
            router = middleware(router);
        }
        let server = axum::serve(listener, router)
            .with_graceful_shutdown(cancel.clone().cancelled_owned());
        let mut server = tokio::spawn(async move { server.await });
        guard.running();

        tokio::select! {
            joined = &mut server => return flatten(joined),
            () = cancel.cancelled() => {}
        }
        guard.stopping();
        tracing::info!(%addr, "http receiver shutting down");
        match tokio::time::timeout(config.shutdown_timeout, &mut server).await {
            Ok(joined) => flatten(joined),
            Err(_) => {
                server.abort();
                tracing::warn!(timeout = ?config.shutdown_timeout, "graceful shutdown timed out");
                Err(TransportError::ShutdownTimeout {
                    duration: config.shutdown_timeout,
                })
            }
        }
    }

    async fn long_poll(
        &self,
        target: &str,
        cancel: CancellationToken,
    ) -> Result<(), TransportError> {
        let guard = self.lifecycle.start()?;
        guard.running();
        tracing::info!(%target, "http receiver long polling");
        let interval = self.shared.config.long_poll_interval;
        loop {
            let request = self.client.get(target).send();
            let result = tokio::select! {
                () = cancel.cancelled() => break,
                result = request => result,
            };
            let pause = match result {
                Ok(response) if response.status().is_success() => {
                    let headers = response.headers().clone();
                    match response.bytes().await {
                        Ok(body) if !body.is_empty() => {
                            let message = HttpMessage {
                                method: String::new(),
                                uri: target.to_string(),
                                headers,
                                body: body.to_vec(),
                            };
                            let ctx = self.shared.inbound_context(&message, cancel.child_token());
                            let reply = self.shared.process(&ctx, &message).await;
                            tracing::debug!(
                                status = reply.status.as_u16(),
                                "long poll message handled"
                            );
                            false
                        }
                        Ok(_) => true,
                        Err(err) => {
                            tracing::warn!(error = %err, "long poll body failed");
                            true
                        }
                    }
                }
                Ok(response) => {
                    tracing::warn!(status = response.status().as_u16(), "long poll refused");
                    true
                }
                Err(err) => {
                    tracing::warn!(error = %err, "long poll failed");
                    true
                }
            };
            if pause {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(interval) => {}
                }
            }
        }
        guard.stopping();
        Ok(())
    }
}

fn flatten(
    joined: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), TransportError> {
    match joined {
        Ok(result) => result.map_err(TransportError::from),
        Err(err) => Err(std::io::Error::other(err).into()),
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        ctx: &RequestContext,
        event: Event,
    ) -> Result<Option<Event>, TransportError> {
        let reporter = report(Measure::HttpTransport, "send");
        let span = reporter.span().clone();
        let result = self.send_event(ctx, event).instrument(span).await;
        reporter.result(&result);
        result
    }

    fn set_receiver(&self, receiver: Arc<dyn Receiver>) {
        self.shared.dispatcher.set_receiver(receiver);
    }

    fn set_converter(&self, converter: Arc<dyn Converter>) {
        self.shared.dispatcher.set_converter(converter);
    }

    fn has_converter(&self) -> bool {
        self.shared.dispatcher.has_converter()
    }

    async fn start_receiver(&self, cancel: CancellationToken) -> Result<(), TransportError> {
        match self.shared.config.long_poll_target.clone() {
            Some(target) => self.long_poll(&target, cancel).await,
            None => self.serve(cancel).await,
        }
    }

    fn has_trace_propagation(&self) -> bool {
        self.shared.config.trace_propagation
    }

    fn name(&self) -> &'static str {
        TRANSPORT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SpecVersion;
    use crate::transport::{EventResponse, HandlerError};

    struct Echo;

    #[async_trait::async_trait]
    impl Receiver for Echo {
        async fn receive(
            &self,
            _ctx: RequestContext,
            event: Event,
            response: EventResponse,
        ) -> Result<(), HandlerError> {
            if event.ty() == "fail" {
                return Err("handler refused".into());
            }
            response.respond(event);
            Ok(())
        }
    }

    fn event(ty: &str) -> Event {
        let mut e = Event::new(SpecVersion::V10);
        e.set_id("ABC-123");
        e.set_type(ty);
        e.set_source("/unit/test/client").unwrap();
        e
    }

    fn shared() -> Shared {
        let shared = Shared {
            config: HttpConfig::default(),
            dispatcher: Dispatcher::default(),
            codec: OnceLock::new(),
        };
        shared.dispatcher.set_receiver(Arc::new(Echo));
        shared
    }

    fn message_for(event: &Event) -> HttpMessage {
        let mut headers = HeaderMap::new();
        let encoded = Codec::new(TRANSPORT).encode(Default::default(), event).unwrap();
        let body = apply_encoded(encoded, &mut headers).unwrap();
        HttpMessage {
            method: "POST".to_string(),
            uri: "/".to_string(),
            headers,
            body,
        }
    }

    #[test]
    fn test_new_rejects_bad_config() {
        assert!(HttpTransport::new(HttpConfig::default().with_path("events")).is_err());
        assert!(HttpTransport::new(HttpConfig::default().with_method("NOT A METHOD")).is_err());
        assert!(HttpTransport::new(HttpConfig::default().with_target("::nope")).is_err());
        let transport = HttpTransport::new(HttpConfig::default()).unwrap();
        assert_eq!(transport.port(), DEFAULT_PORT);
        assert_eq!(transport.state(), ReceiverState::Idle);
    }

    #[test]
    fn test_apply_binary_headers() {
        let message = message_for(&event("com.example.test"));
        assert_eq!(message.header("ce-specversion"), Some("1.0"));
        assert_eq!(message.header("ce-id"), Some("ABC-123"));
        assert_eq!(message.header("ce-type"), Some("com.example.test"));
    }

    #[tokio::test]
    async fn test_process_replies_with_event() {
        let shared = shared();
        let message = message_for(&event("com.example.test"));
        let reply = shared.process(&RequestContext::new(), &message).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.headers.get("ce-id").unwrap(), "ABC-123");
    }

    #[tokio::test]
    async fn test_process_handler_error_is_500() {
        let shared = shared();
        let message = message_for(&event("fail"));
        let reply = shared.process(&RequestContext::new(), &message).await;
        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.body, b"handler refused");
    }

    #[tokio::test]
    async fn test_process_undecodable_is_400() {
        let shared = shared();
        let message = HttpMessage {
            body: b"not an event".to_vec(),
            ..Default::default()
        };
        let reply = shared.process(&RequestContext::new(), &message).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_send_without_target() {
        let transport = HttpTransport::new(HttpConfig::default()).unwrap();
        let result = transport
            .send(&RequestContext::new(), event("com.example.test"))
            .await;
        assert!(matches!(
            result,
            Err(TransportError::InvalidConfiguration { .. })
        ));
    }

    #[tokio::test]
    async fn test_send_cancelled() {
        let transport =
            HttpTransport::new(HttpConfig::default().with_target("http://127.0.0.1:9/")).unwrap();
        let ctx = RequestContext::new();
        ctx.cancellation().cancel();
        let result = transport.send(&ctx, event("com.example.test")).await;
        assert!(matches!(result, Err(TransportError::Cancelled)));
    }
}
