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

//! Integration tests for the HTTP transport.
//!
//! Wire-format tests send to a bare axum server that records the raw
//! request. Receiver tests run a full client on a pre-bound ephemeral port.

use axum::Router;
use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::any;
use cloudevents_rt::client::{Client, ClientConfig};
use cloudevents_rt::codec::{CodecError, Encoding, decode_structured};
use cloudevents_rt::event::{Event, SpecVersion};
use cloudevents_rt::transport::http::{HttpConfig, HttpTransport};
use cloudevents_rt::transport::{
    Converter, EventResponse, Message, ReceiverState, RequestContext, Transport, TransportError,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(5);

type Captured = (HeaderMap, Vec<u8>);

/// Starts a server that records every request and answers 202.
async fn capture_server() -> (String, mpsc::UnboundedReceiver<Captured>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = Router::new().route(
        "/",
        any(move |headers: HeaderMap, body: Bytes| {
            let tx = tx.clone();
            async move {
                let _ = tx.send((headers, body.to_vec()));
                StatusCode::ACCEPTED
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (url, rx)
}

fn ephemeral() -> (std::net::TcpListener, u16) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

fn unit_test_event(version: SpecVersion) -> Event {
    let mut event = Event::new(version);
    event.set_id("ABC-123");
    event.set_type("unit.test.client.sent");
    event.set_source("/unit/test/client").unwrap();
    event
        .set_data_with("application/json", &json!({"hello": "unittest"}))
        .unwrap();
    event
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Starts a client receiver on a fresh port that forwards events to a channel.
async fn start_collector(
    config: ClientConfig,
    http: HttpConfig,
) -> (u16, mpsc::UnboundedReceiver<Event>, CancellationToken) {
    let (listener, port) = ephemeral();
    let transport = HttpTransport::new(http.with_listener(listener)).unwrap();
    let client = Arc::new(Client::new(transport, config));
    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        client
            .start_receiver(token, move |event: Event| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(event);
                }
            })
            .await
    });
    (port, rx, cancel)
}

#[tokio::test]
async fn test_binary_v1_wire_format() {
    let (url, mut requests) = capture_server().await;
    let transport = HttpTransport::new(
        HttpConfig::default()
            .with_target(url)
            .with_encoding(Encoding::Binary(SpecVersion::V10)),
    )
    .unwrap();
    let mut event = unit_test_event(SpecVersion::V10);
    event.set_subject(Some("resource"));

    let reply = transport.send(&RequestContext::new(), event).await.unwrap();
    assert!(reply.is_none());

    let (headers, body) = timeout(WAIT, requests.recv()).await.unwrap().unwrap();
    assert_eq!(header(&headers, "ce-specversion"), Some("1.0"));
    assert_eq!(header(&headers, "ce-id"), Some("ABC-123"));
    assert_eq!(header(&headers, "ce-type"), Some("unit.test.client.sent"));
    assert_eq!(header(&headers, "ce-source"), Some("/unit/test/client"));
    assert_eq!(header(&headers, "ce-subject"), Some("resource"));
    assert_eq!(header(&headers, "content-type"), Some("application/json"));
    assert_eq!(body, br#"{"hello":"unittest"}"#);
}

#[tokio::test]
async fn test_binary_v1_round_trip() {
    let (port, mut events, cancel) =
        start_collector(ClientConfig::new(), HttpConfig::default()).await;
    let sender = HttpTransport::new(
        HttpConfig::default()
            .with_target(format!("http://127.0.0.1:{port}/"))
            .with_encoding(Encoding::Binary(SpecVersion::V10)),
    )
    .unwrap();
    let mut event = unit_test_event(SpecVersion::V10);
    event.set_subject(Some("resource"));
    sender.send(&RequestContext::new(), event).await.unwrap();

    let received = timeout(WAIT, events.recv()).await.unwrap().unwrap();
    assert_eq!(received.id(), "ABC-123");
    assert_eq!(received.ty(), "unit.test.client.sent");
    assert_eq!(received.source().as_str(), "/unit/test/client");
    assert_eq!(received.subject(), Some("resource"));
    assert_eq!(received.data_content_type(), Some("application/json"));
    assert_eq!(received.data_bytes(), Some(&br#"{"hello":"unittest"}"#[..]));
    cancel.cancel();
}

#[tokio::test]
async fn test_structured_v03_base64_wire_format() {
    let (url, mut requests) = capture_server().await;
    let transport = HttpTransport::new(
        HttpConfig::default()
            .with_target(url)
            .with_encoding(Encoding::Structured(SpecVersion::V03)),
    )
    .unwrap();
    let mut event = unit_test_event(SpecVersion::V03);
    event.set_data_content_encoding(Some("base64")).unwrap();

    transport.send(&RequestContext::new(), event).await.unwrap();

    let (headers, body) = timeout(WAIT, requests.recv()).await.unwrap().unwrap();
    assert_eq!(
        header(&headers, "content-type"),
        Some("application/cloudevents+json")
    );
    assert_eq!(
        String::from_utf8(body.clone()).unwrap(),
        concat!(
            r#"{"data":"eyJoZWxsbyI6InVuaXR0ZXN0In0=","#,
            r#""datacontentencoding":"base64","#,
            r#""datacontenttype":"application/json","#,
            r#""id":"ABC-123","#,
            r#""source":"/unit/test/client","#,
            r#""specversion":"0.3","#,
            r#""type":"unit.test.client.sent"}"#
        )
    );
    let decoded = decode_structured(&body).unwrap();
    assert_eq!(
        decoded.data_as::<Value>().unwrap(),
        json!({"hello": "unittest"})
    );
}

#[tokio::test]
async fn test_trace_parent_header() {
    let (url, mut requests) = capture_server().await;
    let transport = HttpTransport::new(HttpConfig::default().with_target(url)).unwrap();
    let ctx = RequestContext::new()
        .with_trace_parent("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01")
        .with_header("x-request-id", "42");
    transport
        .send(&ctx, unit_test_event(SpecVersion::V10))
        .await
        .unwrap();
    let (headers, _) = timeout(WAIT, requests.recv()).await.unwrap().unwrap();
    assert_eq!(
        header(&headers, "traceparent"),
        Some("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01")
    );
    assert_eq!(header(&headers, "x-request-id"), Some("42"));
}

struct PostConverter;

#[async_trait::async_trait]
impl Converter for PostConverter {
    async fn convert(
        &self,
        _ctx: &RequestContext,
        message: &dyn Message,
        err: &CodecError,
    ) -> Result<Option<Event>, CodecError> {
        if !err.is_unrecognized() {
            return Err(err.clone());
        }
        let mut event = Event::new(SpecVersion::V10);
        event.set_id("converted");
        event.set_type("io.cloudevents.converter.http.post");
        event.set_source("/converter")?;
        event.set_data_content_type(message.content_type().as_deref());
        event.set_data_bytes(message.body().to_vec());
        Ok(Some(event))
    }
}

#[tokio::test]
async fn test_converter_fallback() {
    let config = ClientConfig::new().with_converter(PostConverter);
    let (port, mut events, cancel) = start_collector(config, HttpConfig::default()).await;

    let response = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{port}/"))
        .header("content-type", "application/json")
        .body(r#"{"id":123,"message":"hi"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 202);

    let event = timeout(WAIT, events.recv()).await.unwrap().unwrap();
    assert_eq!(event.ty(), "io.cloudevents.converter.http.post");
    assert_eq!(
        event.data_as::<Value>().unwrap(),
        json!({"id": 123, "message": "hi"})
    );
    assert!(events.try_recv().is_err());
    cancel.cancel();
}

#[tokio::test]
async fn test_plain_post_without_converter_is_rejected() {
    let (port, mut events, cancel) =
        start_collector(ClientConfig::new(), HttpConfig::default()).await;
    let response = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{port}/"))
        .header("content-type", "application/json")
        .body(r#"{"id":123}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    assert!(events.try_recv().is_err());
    cancel.cancel();
}

#[tokio::test]
async fn test_oversized_body_is_413() {
    let http = HttpConfig::default().with_max_body_size(64);
    let (port, mut events, cancel) = start_collector(ClientConfig::new(), http).await;
    let body = cloudevents_rt::codec::encode_structured(&unit_test_event(SpecVersion::V10))
        .unwrap();
    assert!(body.len() > 64);

    let response = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{port}/"))
        .header("content-type", "application/cloudevents+json")
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 413);

    let response = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{port}/"))
        .header("content-type", "application/json")
        .header("ce-specversion", "1.0")
        .header("ce-id", "small")
        .header("ce-type", "unit.test.client.sent")
        .header("ce-source", "/unit/test/client")
        .body("{}")
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(timeout(WAIT, events.recv()).await.unwrap().unwrap().id(), "small");
    assert!(events.try_recv().is_err());
    cancel.cancel();
}

#[tokio::test]
async fn test_reply_event_returned_to_sender() {
    let (listener, port) = ephemeral();
    let transport = HttpTransport::new(HttpConfig::default().with_listener(listener)).unwrap();
    let receiver = Arc::new(Client::new(transport, ClientConfig::new()));
    let cancel = CancellationToken::new();
    {
        let receiver = receiver.clone();
        let token = cancel.clone();
        tokio::spawn(async move {
            receiver
                .start_receiver(token, |mut event: Event, response: EventResponse| async move {
                    event.set_type("unit.test.client.reply");
                    response.respond(event);
                })
                .await
        });
    }

    let sender = Client::new(
        HttpTransport::new(
            HttpConfig::default()
                .with_target(format!("http://127.0.0.1:{port}/"))
                .with_encoding(Encoding::Structured(SpecVersion::V10)),
        )
        .unwrap(),
        ClientConfig::new().with_uuids(),
    );
    let reply = sender
        .send(&RequestContext::new(), unit_test_event(SpecVersion::V10))
        .await
        .unwrap()
        .expect("reply event");
    assert_eq!(reply.ty(), "unit.test.client.reply");
    assert_eq!(reply.id(), "ABC-123");
    cancel.cancel();
}

#[tokio::test]
async fn test_handler_error_is_500() {
    let (listener, port) = ephemeral();
    let transport = HttpTransport::new(HttpConfig::default().with_listener(listener)).unwrap();
    let receiver = Arc::new(Client::new(transport, ClientConfig::new()));
    let cancel = CancellationToken::new();
    {
        let receiver = receiver.clone();
        let token = cancel.clone();
        tokio::spawn(async move {
            receiver
                .start_receiver(token, |_: Event| async {
                    Err::<(), _>(std::io::Error::other("refused"))
                })
                .await
        });
    }
    let sender = HttpTransport::new(
        HttpConfig::default().with_target(format!("http://127.0.0.1:{port}/")),
    )
    .unwrap();
    let err = sender
        .send(&RequestContext::new(), unit_test_event(SpecVersion::V10))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::BadStatus { code: 500, .. }));
    assert!(err.is_recoverable());
    cancel.cancel();
}

#[tokio::test]
async fn test_batched_body_dispatched_in_order() {
    let (port, mut events, cancel) =
        start_collector(ClientConfig::new(), HttpConfig::default()).await;
    let first = unit_test_event(SpecVersion::V10);
    let mut second = unit_test_event(SpecVersion::V10);
    second.set_id("DEF-456");
    let body = cloudevents_rt::codec::encode_batch(&[first, second]).unwrap();

    let response = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{port}/"))
        .header("content-type", "application/cloudevents-batch+json")
        .body(body)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(timeout(WAIT, events.recv()).await.unwrap().unwrap().id(), "ABC-123");
    assert_eq!(timeout(WAIT, events.recv()).await.unwrap().unwrap().id(), "DEF-456");
    cancel.cancel();
}

#[tokio::test]
async fn test_graceful_shutdown() {
    let (listener, port) = ephemeral();
    let transport = Arc::new(
        HttpTransport::new(
            HttpConfig::default()
                .with_listener(listener)
                .with_shutdown_timeout(Duration::from_secs(2)),
        )
        .unwrap(),
    );
    let cancel = CancellationToken::new();
    let running = {
        let transport = transport.clone();
        let token = cancel.clone();
        tokio::spawn(async move { transport.start_receiver(token).await })
    };
    while transport.state() != ReceiverState::Running {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(transport.port(), port);
    assert!(matches!(
        transport.start_receiver(CancellationToken::new()).await,
        Err(TransportError::AlreadyStarted)
    ));

    cancel.cancel();
    let result = timeout(Duration::from_secs(2), running).await.unwrap().unwrap();
    assert!(result.is_ok());
    assert_eq!(transport.state(), ReceiverState::Stopped);
    assert!(std::net::TcpStream::connect(("127.0.0.1", port)).is_err());
}

#[tokio::test]
async fn test_long_poll_delivers_fetched_events() {
    let served = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let body =
        cloudevents_rt::codec::encode_structured(&unit_test_event(SpecVersion::V10)).unwrap();
    let app = {
        let served = served.clone();
        Router::new().route(
            "/",
            any(move || {
                let body = body.clone();
                let first = served.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0;
                async move {
                    if first {
                        (
                            StatusCode::OK,
                            [("content-type", "application/cloudevents+json")],
                            body,
                        )
                    } else {
                        (StatusCode::NO_CONTENT, [("content-type", "text/plain")], Vec::new())
                    }
                }
            }),
        )
    };
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let transport = HttpTransport::new(
        HttpConfig::default()
            .with_long_poll_target(url)
            .with_long_poll_interval(Duration::from_millis(20)),
    )
    .unwrap();
    let client = Arc::new(Client::new(transport, ClientConfig::new()));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let running = {
        let client = client.clone();
        let token = cancel.clone();
        tokio::spawn(async move {
            client
                .start_receiver(token, move |event: Event| {
                    let tx = tx.clone();
                    async move {
                        let _ = tx.send(event);
                    }
                })
                .await
        })
    };

    let event = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(event.id(), "ABC-123");
    assert_eq!(event.data_as::<Value>().unwrap(), json!({"hello": "unittest"}));
    while served.load(std::sync::atomic::Ordering::SeqCst) < 3 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cancel.cancel();
    timeout(WAIT, running).await.unwrap().unwrap().unwrap();
    assert!(rx.try_recv().is_err());
}
