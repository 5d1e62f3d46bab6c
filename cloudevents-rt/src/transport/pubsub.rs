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

//! Cloud Pub/Sub transport.
//!
//! Binary mode maps attributes onto `ce-` message attributes and the data
//! content type onto `content-type`; structured mode sends the JSON
//! document as message data. Successful deliveries are acked, failed ones
//! nacked.

mod driver;
mod memory;

pub use self::driver::{CONTENT_TYPE_ATTRIBUTE, PubSubMessage, PubSubPublisher, PubSubSubscriber};
pub use self::memory::MemoryPubSub;

use super::dispatch::Dispatcher;
use super::lifecycle::{DEFAULT_SHUTDOWN_TIMEOUT, Lifecycle, ReceiverState};
use super::message::headers_from_parts;
use super::{Converter, Receiver, RequestContext, Transport, TransportContext, TransportError};
use crate::codec::{
    Codec, EncodedEvent, Encoding, EncodingSelector, binary_encoding_selector, resolve_encoding,
};
use crate::event::Event;
use crate::observability::{Measure, report};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

const TRANSPORT: &str = "pubsub";

/// Configuration for [`PubSubTransport`].
pub struct PubSubConfig {
    topic: String,
    subscription: Option<String>,
    encoding: Encoding,
    encoding_selector: EncodingSelector,
    shutdown_timeout: Duration,
}

impl PubSubConfig {
    /// Creates a configuration publishing to `topic`.
    #[must_use]
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            subscription: None,
            encoding: Encoding::Default,
            encoding_selector: binary_encoding_selector(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Sets the subscription the receiver pulls from.
    #[must_use]
    pub fn with_subscription(mut self, subscription: impl Into<String>) -> Self {
        self.subscription = Some(subscription.into());
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

    /// Bounds how long an in-flight message may take after cancellation.
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

    /// Returns the subscription, if any.
    #[must_use]
    pub fn subscription(&self) -> Option<&str> {
        self.subscription.as_deref()
    }

    /// Returns the shutdown bound.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }
}

impl fmt::Debug for PubSubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PubSubConfig")
            .field("topic", &self.topic)
            .field("subscription", &self.subscription)
            .field("encoding", &self.encoding)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish_non_exhaustive()
    }
}

/// CloudEvents over Pub/Sub.
pub struct PubSubTransport {
    config: PubSubConfig,
    publisher: Arc<dyn PubSubPublisher>,
    subscriber: Option<Arc<dyn PubSubSubscriber>>,
    dispatcher: Dispatcher,
    codec: OnceLock<Codec>,
    lifecycle: Lifecycle,
}

impl fmt::Debug for PubSubTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PubSubTransport")
            .field("config", &self.config)
            .field("state", &self.lifecycle.state())
            .finish_non_exhaustive()
    }
}

impl PubSubTransport {
    /// Creates a publish-only transport.
    pub fn new(config: PubSubConfig, publisher: impl PubSubPublisher) -> Self {
        Self {
            config,
            publisher: Arc::new(publisher),
            subscriber: None,
            dispatcher: Dispatcher::default(),
            codec: OnceLock::new(),
            lifecycle: Lifecycle::new(TRANSPORT),
        }
    }

    /// Adds a subscriber so the transport can receive.
    #[must_use]
    pub fn with_subscriber(mut self, subscriber: impl PubSubSubscriber) -> Self {
        self.subscriber = Some(Arc::new(subscriber));
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

    fn to_message(
        &self,
        ctx: &RequestContext,
        event: &Event,
    ) -> Result<(Vec<u8>, BTreeMap<String, String>), TransportError> {
        let encoding = resolve_encoding(
            ctx,
            self.config.encoding,
            &self.config.encoding_selector,
            event,
        );
        let encoded = self.codec().encode(encoding, event)?;
        let mut attributes = BTreeMap::new();
        if let Some(content_type) = encoded.content_type() {
            attributes.insert(CONTENT_TYPE_ATTRIBUTE.to_string(), content_type.to_string());
        }
        let data = match encoded {
            EncodedEvent::Binary(parts) => {
                attributes.extend(
                    headers_from_parts(&parts).map(|(name, value)| (name, value.to_string())),
                );
                parts.body
            }
            EncodedEvent::Structured(body) | EncodedEvent::Batched(body) => body,
        };
        Ok((data, attributes))
    }

    #[cfg_attr(
        feature = "observability",
        tracing::instrument(
            skip(self, ctx, event),
            fields(id = event.id(), topic = %self.config.topic)
        )
    )]
    async fn send_event(
        &self,
        ctx: &RequestContext,
        event: Event,
    ) -> Result<String, TransportError> {
        if ctx.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        let (data, attributes) = self.to_message(ctx, &event)?;
        tokio::select! {
            () = ctx.cancellation().cancelled() => Err(TransportError::Cancelled),
            result = self.publisher.publish(&self.config.topic, data, attributes) => result,
        }
    }

    async fn handle(
        &self,
        subscriber: &dyn PubSubSubscriber,
        message: PubSubMessage,
        cancel: &CancellationToken,
    ) -> Result<(), TransportError> {
        let reporter = report(Measure::PubSubTransport, "receive");
        let span = reporter.span().clone();
        let ctx = RequestContext::new()
            .with_cancellation(cancel.child_token())
            .with_transport_context(TransportContext::PubSub {
                id: message.id.clone(),
                subscription: message.subscription.clone(),
                publish_time: message.publish_time,
            });
        let outcome = async {
            let events = self.dispatcher.decode(self.codec(), &ctx, &message).await?;
            Ok::<_, TransportError>(self.dispatcher.deliver(&ctx, events).await.error)
        }
        .instrument(span)
        .await;
        match outcome {
            Ok(None) => {
                reporter.ok();
                subscriber.ack(&message).await
            }
            Ok(Some(err)) => {
                reporter.error();
                tracing::debug!(id = %message.id, error = %err, "message nacked");
                subscriber.nack(&message).await
            }
            Err(err) => {
                reporter.error();
                tracing::warn!(id = %message.id, error = %err, "failed to decode message");
                subscriber.nack(&message).await
            }
        }
    }
}

#[async_trait::async_trait]
impl Transport for PubSubTransport {
    async fn send(
        &self,
        ctx: &RequestContext,
        event: Event,
    ) -> Result<Option<Event>, TransportError> {
        let reporter = report(Measure::PubSubTransport, "send");
        let span = reporter.span().clone();
        let result = self.send_event(ctx, event).instrument(span).await;
        reporter.result(&result);
        let id = result?;
        tracing::debug!(message_id = %id, "published");
        Ok(None)
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
        let subscriber = self
            .subscriber
            .clone()
            .ok_or_else(|| TransportError::invalid_configuration("no subscriber configured"))?;
        let subscription = self
            .config
            .subscription
            .clone()
            .ok_or_else(|| TransportError::invalid_configuration("no subscription configured"))?;
        let guard = self.lifecycle.start()?;
        tracing::info!(%subscription, "pubsub receiver started");
        guard.running();
        loop {
            let pulled = tokio::select! {
                () = cancel.cancelled() => break,
                pulled = subscriber.pull(&subscription) => pulled,
            };
            match pulled {
                Ok(Some(message)) => {
                    let handled = guard
                        .drain(
                            self.handle(subscriber.as_ref(), message, &cancel),
                            &cancel,
                            self.config.shutdown_timeout,
                        )
                        .await?;
                    if let Err(err) = handled {
                        if !err.is_recoverable() {
                            return Err(err);
                        }
                        tracing::warn!(error = %err, "acknowledgement failed");
                    }
                }
                Ok(None) => {
                    tracing::info!("pubsub subscription closed");
                    break;
                }
                Err(err) if err.is_recoverable() => {
                    tracing::warn!(error = %err, "pubsub pull failed");
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CLOUDEVENTS_JSON;
    use crate::event::SpecVersion;

    fn event() -> Event {
        let mut e = Event::new(SpecVersion::V10);
        e.set_id("ABC-123");
        e.set_type("com.example.test");
        e.set_source("/unit/test/client").unwrap();
        e.set_data_with("application/json", &serde_json::json!({"n": 1}))
            .unwrap();
        e
    }

    #[tokio::test]
    async fn test_binary_attributes() {
        let pubsub = MemoryPubSub::new();
        pubsub.create_subscription("events", "s");
        let transport = PubSubTransport::new(PubSubConfig::new("events"), pubsub.clone());
        transport.send(&RequestContext::new(), event()).await.unwrap();
        let message = pubsub.pull("s").await.unwrap().unwrap();
        assert_eq!(message.attributes["ce-id"], "ABC-123");
        assert_eq!(message.attributes["ce-specversion"], "1.0");
        assert_eq!(message.attributes["content-type"], "application/json");
        assert_eq!(message.data, br#"{"n":1}"#);
    }

    #[tokio::test]
    async fn test_structured_data() {
        let pubsub = MemoryPubSub::new();
        pubsub.create_subscription("events", "s");
        let config =
            PubSubConfig::new("events").with_encoding(Encoding::Structured(SpecVersion::V02));
        let transport = PubSubTransport::new(config, pubsub.clone());
        transport.send(&RequestContext::new(), event()).await.unwrap();
        let message = pubsub.pull("s").await.unwrap().unwrap();
        assert_eq!(message.attributes["content-type"], CLOUDEVENTS_JSON);
        let decoded = crate::codec::decode_structured(&message.data).unwrap();
        assert_eq!(decoded.spec_version(), SpecVersion::V02);
    }

    #[tokio::test]
    async fn test_receive_requires_subscription() {
        let pubsub = MemoryPubSub::new();
        let transport =
            PubSubTransport::new(PubSubConfig::new("events"), pubsub.clone())
                .with_subscriber(pubsub);
        assert!(matches!(
            transport.start_receiver(CancellationToken::new()).await,
            Err(TransportError::InvalidConfiguration { .. })
        ));
    }
}
