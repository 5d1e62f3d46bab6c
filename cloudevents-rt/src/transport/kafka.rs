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

//! Kafka transport.
//!
//! Binary mode puts attributes in `ce-` record headers and the data content
//! type in the `content-type` header; structured mode puts the JSON
//! document in the record value. The `key` extension, when present, becomes
//! the record key unless key mapping is turned off.
//!
//! The receiver commits a record's offset only after its handler succeeds.

mod driver;
mod memory;

pub use self::driver::{KafkaConsumer, KafkaProducer, KafkaRecord};
pub use self::memory::{MemoryKafka, MemoryKafkaConsumer};

use super::dispatch::Dispatcher;
use super::lifecycle::{DEFAULT_SHUTDOWN_TIMEOUT, Lifecycle, ReceiverState};
use super::message::headers_from_parts;
use super::{Converter, Receiver, RequestContext, Transport, TransportError};
use crate::codec::{
    Codec, EncodedEvent, Encoding, EncodingSelector, binary_encoding_selector, resolve_encoding,
};
use crate::event::Event;
use crate::observability::{Measure, report};
use crate::types::format_value;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

const TRANSPORT: &str = "kafka";
const KEY_EXTENSION: &str = "key";
const CONTENT_TYPE_HEADER: &str = "content-type";

/// Configuration for [`KafkaTransport`].
pub struct KafkaConfig {
    topic: String,
    group_id: String,
    encoding: Encoding,
    encoding_selector: EncodingSelector,
    key_mapping: bool,
    shutdown_timeout: Duration,
}

impl KafkaConfig {
    /// Creates a configuration for `topic` with group `cloudevents`.
    #[must_use]
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            group_id: "cloudevents".to_string(),
            encoding: Encoding::Default,
            encoding_selector: binary_encoding_selector(),
            key_mapping: true,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Sets the consumer group.
    #[must_use]
    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = group_id.into();
        self
    }

    /// Fixes the outbound encoding.
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

    /// Turns mapping of the `key` extension onto the record key on or off.
    #[must_use]
    pub fn with_key_mapping(mut self, enabled: bool) -> Self {
        self.key_mapping = enabled;
        self
    }

    /// Bounds how long an in-flight record may take after cancellation.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Returns the topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the consumer group.
    #[must_use]
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Returns the shutdown bound.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }
}

impl fmt::Debug for KafkaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KafkaConfig")
            .field("topic", &self.topic)
            .field("group_id", &self.group_id)
            .field("encoding", &self.encoding)
            .field("key_mapping", &self.key_mapping)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish_non_exhaustive()
    }
}

/// CloudEvents over Kafka.
///
/// # Examples
///
/// ```rust
/// use cloudevents_rt::event::{Event, SpecVersion};
/// use cloudevents_rt::transport::kafka::{KafkaConfig, KafkaTransport, MemoryKafka};
/// use cloudevents_rt::transport::{RequestContext, Transport};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let broker = MemoryKafka::new();
/// let transport = KafkaTransport::new(KafkaConfig::new("events"), broker.clone())
///     .with_consumer(broker.consumer());
///
/// let mut event = Event::new(SpecVersion::V10);
/// event.set_id("ABC-123");
/// event.set_type("com.example.test");
/// event.set_source("/unit/test/client").unwrap();
/// event.set_extension("key", "customer-42").unwrap();
/// transport.send(&RequestContext::new(), event).await.unwrap();
///
/// let record = &broker.records("events")[0];
/// assert_eq!(record.key.as_deref(), Some(&b"customer-42"[..]));
/// # }
/// ```
pub struct KafkaTransport {
    config: KafkaConfig,
    producer: Arc<dyn KafkaProducer>,
    consumer: Option<Arc<dyn KafkaConsumer>>,
    dispatcher: Dispatcher,
    codec: OnceLock<Codec>,
    lifecycle: Lifecycle,
}

impl fmt::Debug for KafkaTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KafkaTransport")
            .field("config", &self.config)
            .field("state", &self.lifecycle.state())
            .finish_non_exhaustive()
    }
}

impl KafkaTransport {
    /// Creates a send-only transport over `producer`.
    pub fn new(config: KafkaConfig, producer: impl KafkaProducer) -> Self {
        Self {
            config,
            producer: Arc::new(producer),
            consumer: None,
            dispatcher: Dispatcher::default(),
            codec: OnceLock::new(),
            lifecycle: Lifecycle::new(TRANSPORT),
        }
    }

    /// Adds a consumer so the transport can receive.
    #[must_use]
    pub fn with_consumer(mut self, consumer: impl KafkaConsumer) -> Self {
        self.consumer = Some(Arc::new(consumer));
        self
    }

    /// Returns the receiver lifecycle state.
    #[must_use]
    pub fn state(&self) -> ReceiverState {
        self.lifecycle.state()
    }

    fn codec(&self) -> &Codec {
        self.codec.get_or_init(|| Codec::new(TRANSPORT))
    }

    /// Builds the record for `event`.
    fn to_record(
        &self,
        ctx: &RequestContext,
        event: &Event,
    ) -> Result<KafkaRecord, TransportError> {
        let encoding = resolve_encoding(
            ctx,
            self.config.encoding,
            &self.config.encoding_selector,
            event,
        );
        let encoded = self.codec().encode(encoding, event)?;
        let mut record = KafkaRecord {
            topic: self.config.topic.clone(),
            ..Default::default()
        };
        if let Some(content_type) = encoded.content_type() {
            record
                .headers
                .push((CONTENT_TYPE_HEADER.to_string(), content_type.as_bytes().to_vec()));
        }
        record.value = match encoded {
            EncodedEvent::Binary(parts) => {
                record.headers.extend(
                    headers_from_parts(&parts)
                        .map(|(name, value)| (name, value.as_bytes().to_vec())),
                );
                parts.body
            }
            EncodedEvent::Structured(body) | EncodedEvent::Batched(body) => body,
        };
        if self.config.key_mapping {
            record.key = event
                .extension(KEY_EXTENSION)
                .map(|key| format_value(key).into_bytes());
        }
        Ok(record)
    }

    #[cfg_attr(
        feature = "observability",
        tracing::instrument(
            skip(self, ctx, event),
            fields(id = event.id(), topic = %self.config.topic)
        )
    )]
    async fn send_event(&self, ctx: &RequestContext, event: Event) -> Result<(), TransportError> {
        if ctx.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        let record = self.to_record(ctx, &event)?;
        tokio::select! {
            () = ctx.cancellation().cancelled() => Err(TransportError::Cancelled),
            result = self.producer.produce(record) => result,
        }
    }

    /// Handles one record; commits iff decoding and the handler succeed.
    async fn handle(
        &self,
        consumer: &dyn KafkaConsumer,
        record: KafkaRecord,
        cancel: &CancellationToken,
    ) -> Result<(), TransportError> {
        let reporter = report(Measure::KafkaTransport, "receive");
        let span = reporter.span().clone();
        let ctx = RequestContext::new()
            .with_cancellation(cancel.child_token())
            .with_transport_context(super::TransportContext::Kafka {
                topic: record.topic.clone(),
                partition: record.partition,
                offset: record.offset,
                key: record.key.clone(),
            });
        let outcome = async {
            let events = self.dispatcher.decode(self.codec(), &ctx, &record).await?;
            let delivery = self.dispatcher.deliver(&ctx, events).await;
            Ok::<_, TransportError>(delivery.error)
        }
        .instrument(span)
        .await;
        match outcome {
            Ok(None) => {
                reporter.ok();
                consumer.commit(&record).await
            }
            Ok(Some(err)) => {
                reporter.error();
                tracing::debug!(offset = record.offset, error = %err, "offset not committed");
                Ok(())
            }
            Err(err) => {
                reporter.error();
                tracing::warn!(offset = record.offset, error = %err, "failed to decode record");
                Ok(())
            }
        }
    }
}

#[async_trait::async_trait]
impl Transport for KafkaTransport {
    async fn send(
        &self,
        ctx: &RequestContext,
        event: Event,
    ) -> Result<Option<Event>, TransportError> {
        let reporter = report(Measure::KafkaTransport, "send");
        let span = reporter.span().clone();
        let result = self.send_event(ctx, event).instrument(span).await;
        reporter.result(&result);
        result.map(|()| None)
    }

    fn set_receiver(&self, receiver: Arc<dyn Receiver>) {
        self.dispatcher.set_receiver(receiver);
    }

    fn set_converter(&self, converter: Arc<dyn Converter>) {
        self.dispatcher.set_converter(converter);
    }

    fn has_converter(&self) -> bool {
        self.dispatcher.has_converter()
    }

    async fn start_receiver(&self, cancel: CancellationToken) -> Result<(), TransportError> {
        let consumer = self
            .consumer
            .clone()
            .ok_or_else(|| TransportError::invalid_configuration("no consumer configured"))?;
        let guard = self.lifecycle.start()?;
        consumer
            .subscribe(&self.config.topic, &self.config.group_id)
            .await?;
        tracing::info!(
            topic = %self.config.topic,
            group = %self.config.group_id,
            "kafka receiver subscribed"
        );
        guard.running();
        loop {
            let polled = tokio::select! {
                () = cancel.cancelled() => break,
                polled = consumer.poll() => polled,
            };
            match polled {
                Ok(Some(record)) => {
                    let handled = guard
                        .drain(
                            self.handle(consumer.as_ref(), record, &cancel),
                            &cancel,
                            self.config.shutdown_timeout,
                        )
                        .await?;
                    if let Err(err) = handled {
                        if !err.is_recoverable() {
                            return Err(err);
                        }
                        tracing::warn!(error = %err, "commit failed");
                    }
                }
                Ok(None) => {
                    tracing::info!("kafka consumer closed");
                    break;
                }
                Err(err) if err.is_recoverable() => {
                    tracing::warn!(error = %err, "kafka poll failed");
                }
                Err(err) => return Err(err),
            }
        }
        guard.stopping();
        Ok(())
    }

    fn has_trace_propagation(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        TRANSPORT
    }
}
