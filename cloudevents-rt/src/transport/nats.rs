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

//! NATS and JetStream transport.
//!
//! NATS has no message headers in the wire binding, so only the structured
//! encoding is supported, in every specversion. Publishing and receiving
//! use one subject and there is no reply channel.
//!
//! In [`NatsMode::Streaming`] a delivery is acknowledged after its handler
//! succeeds; in [`NatsMode::Core`] nothing is acknowledged.

mod driver;
mod memory;

pub use self::driver::{NatsConnection, NatsMessage, NatsSubscription};
pub use self::memory::MemoryNats;

use super::dispatch::Dispatcher;
use super::lifecycle::{DEFAULT_SHUTDOWN_TIMEOUT, Lifecycle, ReceiverState};
use super::{Converter, Receiver, RequestContext, Transport, TransportError};
use crate::codec::{Codec, EncodedEvent, Encoding, resolve_encoding, structured_encoding_selector};
use crate::event::Event;
use crate::observability::{Measure, report};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

const TRANSPORT: &str = "nats";

/// Delivery semantics of the subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NatsMode {
    /// Fire-and-forget core NATS
    #[default]
    Core,
    /// JetStream-style streaming with acknowledgements
    Streaming,
}

/// Configuration for [`NatsTransport`].
#[derive(Debug, Clone)]
pub struct NatsConfig {
    subject: String,
    mode: NatsMode,
    encoding: Encoding,
    shutdown_timeout: Duration,
}

impl NatsConfig {
    /// Creates a core NATS configuration for `subject`.
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            mode: NatsMode::Core,
            encoding: Encoding::Default,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Sets the delivery mode.
    #[must_use]
    pub fn with_mode(mut self, mode: NatsMode) -> Self {
        self.mode = mode;
        self
    }

    /// Fixes the structured specversion to send in.
    #[must_use]
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Bounds how long an in-flight message may take after cancellation.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Returns the subject.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Returns the delivery mode.
    #[must_use]
    pub fn mode(&self) -> NatsMode {
        self.mode
    }

    /// Returns the shutdown bound.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }
}

/// CloudEvents over NATS.
pub struct NatsTransport {
    config: NatsConfig,
    connection: Arc<dyn NatsConnection>,
    dispatcher: Dispatcher,
    codec: OnceLock<Codec>,
    lifecycle: Lifecycle,
}

impl std::fmt::Debug for NatsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatsTransport")
            .field("config", &self.config)
            .field("state", &self.lifecycle.state())
            .finish_non_exhaustive()
    }
}

impl NatsTransport {
    /// Creates a transport over `connection`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidConfiguration`] when the configured
    /// encoding is not structured.
    pub fn new(
        config: NatsConfig,
        connection: impl NatsConnection,
    ) -> Result<Self, TransportError> {
        if !matches!(config.encoding, Encoding::Default | Encoding::Structured(_)) {
            return Err(TransportError::invalid_configuration(format!(
                "nats supports only structured encoding, not {}",
                config.encoding
            )));
        }
        Ok(Self {
            config,
            connection: Arc::new(connection),
            dispatcher: Dispatcher::default(),
            codec: OnceLock::new(),
            lifecycle: Lifecycle::new(TRANSPORT),
        })
    }

    /// Returns the receiver lifecycle state.
    #[must_use]
    pub fn state(&self) -> ReceiverState {
        self.lifecycle.state()
    }

    fn codec(&self) -> &Codec {
        self.codec.get_or_init(|| Codec::structured_only(TRANSPORT))
    }

    #[cfg_attr(
        feature = "observability",
        tracing::instrument(
            skip(self, ctx, event),
            fields(id = event.id(), subject = %self.config.subject)
        )
    )]
    async fn send_event(&self, ctx: &RequestContext, event: Event) -> Result<(), TransportError> {
        if ctx.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        let encoding = resolve_encoding(
            ctx,
            self.config.encoding,
            &structured_encoding_selector(),
            &event,
        );
        let data = match self.codec().encode(encoding, &event)? {
            EncodedEvent::Structured(body) => body,
            EncodedEvent::Binary(_) | EncodedEvent::Batched(_) => {
                return Err(TransportError::invalid_configuration(
                    "nats supports only structured encoding",
                ));
            }
        };
        tokio::select! {
            () = ctx.cancellation().cancelled() => Err(TransportError::Cancelled),
            result = self.connection.publish(&self.config.subject, data) => result,
        }
    }

    /// Handles one delivery and reports whether it should be acknowledged.
    async fn handle(&self, message: &NatsMessage, cancel: &CancellationToken) -> bool {
        let reporter = report(Measure::NatsTransport, "receive");
        let span = reporter.span().clone();
        let ctx = RequestContext::new()
            .with_cancellation(cancel.child_token())
            .with_transport_context(super::TransportContext::Nats {
                subject: message.subject.clone(),
            });
        let outcome = async {
            let events = self.dispatcher.decode(self.codec(), &ctx, message).await?;
            Ok::<_, TransportError>(self.dispatcher.deliver(&ctx, events).await.error)
        }
        .instrument(span)
        .await;
        match outcome {
            Ok(None) => {
                reporter.ok();
                true
            }
            Ok(Some(_)) => {
                reporter.error();
                false
            }
            Err(err) => {
                reporter.error();
                tracing::warn!(
                    subject = %message.subject,
                    error = %err,
                    "failed to decode message"
                );
                false
            }
        }
    }
}

#[async_trait::async_trait]
impl Transport for NatsTransport {
    async fn send(
        &self,
        ctx: &RequestContext,
        event: Event,
    ) -> Result<Option<Event>, TransportError> {
        let reporter = report(Measure::NatsTransport, "send");
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
        let guard = self.lifecycle.start()?;
        let mut subscription = self.connection.subscribe(&self.config.subject).await?;
        tracing::info!(
            subject = %self.config.subject,
            mode = ?self.config.mode,
            "nats receiver subscribed"
        );
        guard.running();
        let result = loop {
            let next = tokio::select! {
                () = cancel.cancelled() => break Ok(()),
                next = subscription.next() => next,
            };
            match next {
                Ok(Some(message)) => {
                    let limit = self.config.shutdown_timeout;
                    let handled = guard.drain(self.handle(&message, &cancel), &cancel, limit);
                    let ack = match handled.await {
                        Ok(ack) => ack,
                        Err(err) => break Err(err),
                    };
                    if ack && self.config.mode == NatsMode::Streaming {
                        if let Err(err) = subscription.ack(&message).await {
                            tracing::warn!(sequence = message.sequence, error = %err, "ack failed");
                        }
                    }
                }
                Ok(None) => break Ok(()),
                Err(err) if err.is_recoverable() => {
                    tracing::warn!(error = %err, "nats receive failed");
                }
                Err(err) => break Err(err),
            }
        };
        guard.stopping();
        if let Err(err) = subscription.unsubscribe().await {
            tracing::debug!(error = %err, "unsubscribe failed");
        }
        result
    }

    fn has_trace_propagation(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        TRANSPORT
    }
}
