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

//! Client round trips over the in-memory broker drivers.

use cloudevents_rt::client::{Client, ClientConfig};
use cloudevents_rt::codec::Encoding;
use cloudevents_rt::event::{Event, SpecVersion};
use cloudevents_rt::transport::kafka::{KafkaConfig, KafkaTransport, MemoryKafka};
use cloudevents_rt::transport::nats::{MemoryNats, NatsConfig, NatsMode, NatsTransport};
use cloudevents_rt::transport::pubsub::{MemoryPubSub, PubSubConfig, PubSubTransport};
use cloudevents_rt::transport::{
    HandlerError, ReceiverState, RequestContext, TransportContext, TransportError,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(5);

fn event(id: &str) -> Event {
    let mut event = Event::new(SpecVersion::V10);
    event.set_id(id);
    event.set_type("com.example.test");
    event.set_source("/unit/test/client").unwrap();
    event.set_data(&json!({"hello": "unittest"})).unwrap();
    event
}

/// Starts a receiver that forwards every event with its transport context
/// and fails events whose id starts with `fail`.
fn start_collector(
    client: &Arc<Client>,
    cancel: &CancellationToken,
) -> (
    JoinHandle<Result<(), cloudevents_rt::Error>>,
    mpsc::UnboundedReceiver<(Option<TransportContext>, Event)>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let client = client.clone();
    let cancel = cancel.clone();
    let task = tokio::spawn(async move {
        client
            .start_receiver(cancel, move |ctx: RequestContext, event: Event| {
                let tx = tx.clone();
                async move {
                    let failed = event.id().starts_with("fail");
                    let _ = tx.send((ctx.transport_context().cloned(), event));
                    if failed {
                        return Err::<(), HandlerError>("rejected".into());
                    }
                    Ok(())
                }
            })
            .await
    });
    (task, rx)
}

/// Starts a receiver whose handler reports each event and then never
/// finishes.
fn start_stuck(
    client: &Arc<Client>,
    cancel: &CancellationToken,
) -> (
    JoinHandle<Result<(), cloudevents_rt::Error>>,
    mpsc::UnboundedReceiver<String>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let client = client.clone();
    let cancel = cancel.clone();
    let task = tokio::spawn(async move {
        client
            .start_receiver(cancel, move |event: Event| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(event.id().to_string());
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                }
            })
            .await
    });
    (task, rx)
}

/// Awaits a stopped receiver task and asserts it gave up on its handler.
async fn assert_shutdown_timed_out(
    task: JoinHandle<Result<(), cloudevents_rt::Error>>,
    limit: Duration,
) {
    let result = timeout(WAIT, task).await.unwrap().unwrap();
    assert!(matches!(
        result,
        Err(cloudevents_rt::Error::Transport(TransportError::ShutdownTimeout { duration }))
            if duration == limit
    ));
}

async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    timeout(WAIT, rx.recv()).await.unwrap().unwrap()
}

async fn until(check: impl Fn() -> bool) {
    timeout(WAIT, async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_kafka_round_trip_commits_handled_records() {
    let broker = MemoryKafka::new();
    let transport = KafkaTransport::new(KafkaConfig::new("events"), broker.clone())
        .with_consumer(broker.consumer());
    let client = Arc::new(Client::new(transport, ClientConfig::new()));
    let cancel = CancellationToken::new();
    let (task, mut rx) = start_collector(&client, &cancel);

    let ctx = RequestContext::new();
    client.send(&ctx, event("ABC-1")).await.unwrap();
    client.send(&ctx, event("fail-2")).await.unwrap();

    let (transport_ctx, first) = recv(&mut rx).await;
    assert_eq!(first.id(), "ABC-1");
    assert_eq!(first.data_as::<serde_json::Value>().unwrap(), json!({"hello": "unittest"}));
    assert!(matches!(
        transport_ctx,
        Some(TransportContext::Kafka { ref topic, offset: 0, .. }) if topic == "events"
    ));
    let (_, second) = recv(&mut rx).await;
    assert_eq!(second.id(), "fail-2");

    until(|| broker.committed("events", "cloudevents") == Some(0)).await;
    cancel.cancel();
    task.await.unwrap().unwrap();
    // The failed record stays uncommitted.
    assert_eq!(broker.committed("events", "cloudevents"), Some(0));
}

#[tokio::test]
async fn test_kafka_structured_encoding() {
    let broker = MemoryKafka::new();
    let transport = KafkaTransport::new(
        KafkaConfig::new("events").with_encoding(Encoding::Structured(SpecVersion::V10)),
        broker.clone(),
    )
    .with_consumer(broker.consumer());
    let client = Arc::new(Client::new(transport, ClientConfig::new()));
    let cancel = CancellationToken::new();
    let (task, mut rx) = start_collector(&client, &cancel);

    client.send(&RequestContext::new(), event("ABC-1")).await.unwrap();
    let record = &broker.records("events")[0];
    assert_eq!(
        record.header("content-type"),
        Some(&b"application/cloudevents+json"[..])
    );
    assert!(record.header("ce-id").is_none());

    let (_, received) = recv(&mut rx).await;
    assert_eq!(received.id(), "ABC-1");
    cancel.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_nats_streaming_acks_only_handled_messages() {
    let nats = MemoryNats::new();
    let transport = NatsTransport::new(
        NatsConfig::new("events").with_mode(NatsMode::Streaming),
        nats.clone(),
    )
    .unwrap();
    let client = Arc::new(Client::new(transport, ClientConfig::new()));
    let cancel = CancellationToken::new();
    let (task, mut rx) = start_collector(&client, &cancel);
    until(|| nats.subscriber_count("events") == 1).await;

    let ctx = RequestContext::new();
    client.send(&ctx, event("fail-1")).await.unwrap();
    client.send(&ctx, event("ABC-2")).await.unwrap();

    let (transport_ctx, first) = recv(&mut rx).await;
    assert_eq!(first.id(), "fail-1");
    assert_eq!(
        transport_ctx,
        Some(TransportContext::Nats {
            subject: "events".to_string()
        })
    );
    assert_eq!(recv(&mut rx).await.1.id(), "ABC-2");

    until(|| nats.acked().len() == 1).await;
    cancel.cancel();
    task.await.unwrap().unwrap();
    assert_eq!(nats.acked(), vec![2]);
}

#[tokio::test]
async fn test_nats_core_never_acks() {
    let nats = MemoryNats::new();
    let transport = NatsTransport::new(NatsConfig::new("events"), nats.clone()).unwrap();
    let client = Arc::new(Client::new(transport, ClientConfig::new()));
    let cancel = CancellationToken::new();
    let (task, mut rx) = start_collector(&client, &cancel);
    until(|| nats.subscriber_count("events") == 1).await;

    client.send(&RequestContext::new(), event("ABC-1")).await.unwrap();
    assert_eq!(recv(&mut rx).await.1.id(), "ABC-1");

    cancel.cancel();
    task.await.unwrap().unwrap();
    assert!(nats.acked().is_empty());
    assert_eq!(nats.subscriber_count("events"), 0);
}

#[tokio::test]
async fn test_pubsub_acks_and_nacks() {
    let service = MemoryPubSub::new();
    service.create_subscription("events", "events-sub");
    let transport = Arc::new(
        PubSubTransport::new(
            PubSubConfig::new("events").with_subscription("events-sub"),
            service.clone(),
        )
        .with_subscriber(service.clone()),
    );
    let client = Arc::new(Client::with_shared(transport.clone(), ClientConfig::new()));
    let cancel = CancellationToken::new();
    let (task, mut rx) = start_collector(&client, &cancel);

    let ctx = RequestContext::new();
    client.send(&ctx, event("ABC-1")).await.unwrap();
    client.send(&ctx, event("fail-2")).await.unwrap();

    let (transport_ctx, first) = recv(&mut rx).await;
    assert_eq!(first.id(), "ABC-1");
    match transport_ctx {
        Some(TransportContext::PubSub {
            id,
            subscription,
            publish_time,
        }) => {
            assert_eq!(id, "1");
            assert_eq!(subscription, "events-sub");
            assert!(publish_time.is_some());
        }
        other => panic!("unexpected transport context {other:?}"),
    }
    assert_eq!(recv(&mut rx).await.1.id(), "fail-2");

    until(|| service.acked().len() == 1 && service.nacked().len() == 1).await;
    assert_eq!(transport.state(), ReceiverState::Running);
    cancel.cancel();
    task.await.unwrap().unwrap();
    assert_eq!(service.acked(), vec!["1".to_string()]);
    assert_eq!(service.nacked(), vec!["2".to_string()]);
    assert_eq!(service.pending("events-sub"), 0);
}

const DRAIN: Duration = Duration::from_millis(100);

#[tokio::test]
async fn test_kafka_shutdown_stops_receiver() {
    let broker = MemoryKafka::new();
    let transport = Arc::new(
        KafkaTransport::new(KafkaConfig::new("events"), broker.clone())
            .with_consumer(broker.consumer()),
    );
    let client = Arc::new(Client::with_shared(transport.clone(), ClientConfig::new()));
    let cancel = CancellationToken::new();
    let (task, _rx) = start_collector(&client, &cancel);
    until(|| transport.state() == ReceiverState::Running).await;

    cancel.cancel();
    timeout(WAIT, task).await.unwrap().unwrap().unwrap();
    assert_eq!(transport.state(), ReceiverState::Stopped);
}

#[tokio::test]
async fn test_kafka_shutdown_bounds_stuck_handler() {
    let broker = MemoryKafka::new();
    let transport = Arc::new(
        KafkaTransport::new(
            KafkaConfig::new("events").with_shutdown_timeout(DRAIN),
            broker.clone(),
        )
        .with_consumer(broker.consumer()),
    );
    let client = Arc::new(Client::with_shared(transport.clone(), ClientConfig::new()));
    let cancel = CancellationToken::new();
    let (task, mut rx) = start_stuck(&client, &cancel);

    client.send(&RequestContext::new(), event("ABC-1")).await.unwrap();
    assert_eq!(recv(&mut rx).await, "ABC-1");
    cancel.cancel();

    assert_shutdown_timed_out(task, DRAIN).await;
    assert_eq!(transport.state(), ReceiverState::Stopped);
    assert_eq!(broker.committed("events", "cloudevents"), None);
}

#[tokio::test]
async fn test_nats_shutdown_stops_receiver() {
    let nats = MemoryNats::new();
    let transport = Arc::new(NatsTransport::new(NatsConfig::new("events"), nats.clone()).unwrap());
    let client = Arc::new(Client::with_shared(transport.clone(), ClientConfig::new()));
    let cancel = CancellationToken::new();
    let (task, _rx) = start_collector(&client, &cancel);
    until(|| transport.state() == ReceiverState::Running).await;

    cancel.cancel();
    timeout(WAIT, task).await.unwrap().unwrap().unwrap();
    assert_eq!(transport.state(), ReceiverState::Stopped);
    assert_eq!(nats.subscriber_count("events"), 0);
}

#[tokio::test]
async fn test_nats_shutdown_bounds_stuck_handler() {
    let nats = MemoryNats::new();
    let config = NatsConfig::new("events")
        .with_mode(NatsMode::Streaming)
        .with_shutdown_timeout(DRAIN);
    let transport = Arc::new(NatsTransport::new(config, nats.clone()).unwrap());
    let client = Arc::new(Client::with_shared(transport.clone(), ClientConfig::new()));
    let cancel = CancellationToken::new();
    let (task, mut rx) = start_stuck(&client, &cancel);
    until(|| nats.subscriber_count("events") == 1).await;

    client.send(&RequestContext::new(), event("ABC-1")).await.unwrap();
    assert_eq!(recv(&mut rx).await, "ABC-1");
    cancel.cancel();

    assert_shutdown_timed_out(task, DRAIN).await;
    assert_eq!(transport.state(), ReceiverState::Stopped);
    assert!(nats.acked().is_empty());
    assert_eq!(nats.subscriber_count("events"), 0);
}

#[tokio::test]
async fn test_pubsub_shutdown_stops_receiver() {
    let service = MemoryPubSub::new();
    service.create_subscription("events", "events-sub");
    let transport = Arc::new(
        PubSubTransport::new(
            PubSubConfig::new("events").with_subscription("events-sub"),
            service.clone(),
        )
        .with_subscriber(service.clone()),
    );
    let client = Arc::new(Client::with_shared(transport.clone(), ClientConfig::new()));
    let cancel = CancellationToken::new();
    let (task, _rx) = start_collector(&client, &cancel);
    until(|| transport.state() == ReceiverState::Running).await;

    cancel.cancel();
    timeout(WAIT, task).await.unwrap().unwrap().unwrap();
    assert_eq!(transport.state(), ReceiverState::Stopped);
}

#[tokio::test]
async fn test_pubsub_shutdown_bounds_stuck_handler() {
    let service = MemoryPubSub::new();
    service.create_subscription("events", "events-sub");
    let config = PubSubConfig::new("events")
        .with_subscription("events-sub")
        .with_shutdown_timeout(DRAIN);
    let transport = Arc::new(
        PubSubTransport::new(config, service.clone()).with_subscriber(service.clone()),
    );
    let client = Arc::new(Client::with_shared(transport.clone(), ClientConfig::new()));
    let cancel = CancellationToken::new();
    let (task, mut rx) = start_stuck(&client, &cancel);

    client.send(&RequestContext::new(), event("ABC-1")).await.unwrap();
    assert_eq!(recv(&mut rx).await, "ABC-1");
    cancel.cancel();

    assert_shutdown_timed_out(task, DRAIN).await;
    assert_eq!(transport.state(), ReceiverState::Stopped);
    assert!(service.acked().is_empty());
}
