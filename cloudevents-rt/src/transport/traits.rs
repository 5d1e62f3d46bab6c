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

//! Core transport traits.

use super::{EventResponse, Message, RequestContext, TransportError};
use crate::codec::CodecError;
use crate::event::Event;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Error type returned by receivers and handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Uniform send and receive over one wire protocol.
///
/// Methods take `&self`; transports keep their mutable state behind locks
/// so one instance can be shared between a sending task and the task
/// running [`Transport::start_receiver`].
///
/// # Implementations
///
/// - [`HttpTransport`](crate::transport::http::HttpTransport)
/// - [`KafkaTransport`](crate::transport::kafka::KafkaTransport)
/// - [`NatsTransport`](crate::transport::nats::NatsTransport)
/// - [`PubSubTransport`](crate::transport::pubsub::PubSubTransport)
///
/// # Examples
///
/// ```rust,no_run
/// use cloudevents_rt::event::{Event, SpecVersion};
/// use cloudevents_rt::transport::{RequestContext, Transport};
///
/// # async fn example(transport: &dyn Transport) -> Result<(), Box<dyn std::error::Error>> {
/// let mut event = Event::new(SpecVersion::V10);
/// event.set_id("ABC-123");
/// event.set_type("com.example.test");
/// event.set_source("/unit/test/client")?;
///
/// if let Some(reply) = transport.send(&RequestContext::new(), event).await? {
///     println!("peer replied with {}", reply.id());
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Encodes and delivers `event`.
    ///
    /// Returns the peer's reply event on transports with request/response
    /// semantics. Returns [`TransportError::Cancelled`] immediately if the
    /// context is already cancelled.
    async fn send(&self, ctx: &RequestContext, event: Event)
    -> Result<Option<Event>, TransportError>;

    /// Installs the inbound dispatcher.
    fn set_receiver(&self, receiver: Arc<dyn Receiver>);

    /// Installs a fallback for undecodable inbound messages.
    fn set_converter(&self, converter: Arc<dyn Converter>);

    /// Returns `true` if a converter is installed.
    fn has_converter(&self) -> bool;

    /// Runs the receiver until `cancel` fires or a fatal error occurs.
    ///
    /// On cancellation the transport shuts down gracefully, bounded by its
    /// shutdown timeout. Returns `Ok(())` on a clean stop.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::AlreadyStarted`] if a receiver is already
    /// running, and the first fatal transport error otherwise.
    async fn start_receiver(&self, cancel: CancellationToken) -> Result<(), TransportError>;

    /// Returns `true` if the transport injects and extracts distributed
    /// tracing context.
    fn has_trace_propagation(&self) -> bool;

    /// Short transport name, used in errors and logs.
    fn name(&self) -> &'static str;
}

/// Consumes inbound events.
///
/// The client installs one that adapts the user's handler; transports can
/// also be driven directly with a custom receiver.
#[async_trait::async_trait]
pub trait Receiver: Send + Sync + 'static {
    /// Handles one event. `response` collects what to send back.
    async fn receive(
        &self,
        ctx: RequestContext,
        event: Event,
        response: EventResponse,
    ) -> Result<(), HandlerError>;
}

/// Synthesizes an event from a message the codec rejected.
///
/// # Examples
///
/// ```rust
/// use cloudevents_rt::codec::CodecError;
/// use cloudevents_rt::event::{Event, SpecVersion};
/// use cloudevents_rt::transport::{Converter, Message, RequestContext};
///
/// struct PlainPost;
///
/// #[async_trait::async_trait]
/// impl Converter for PlainPost {
///     async fn convert(
///         &self,
///         _ctx: &RequestContext,
///         message: &dyn Message,
///         _err: &CodecError,
///     ) -> Result<Option<Event>, CodecError> {
///         let mut event = Event::new(SpecVersion::V10);
///         event.set_id("converted");
///         event.set_type("io.cloudevents.converter.http.post");
///         event.set_source("/converter")?;
///         event.set_data_bytes(message.body().to_vec());
///         Ok(Some(event))
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait Converter: Send + Sync + 'static {
    /// Converts `message`, or returns `err` (or another error) to refuse.
    /// `Ok(None)` declines without an error.
    async fn convert(
        &self,
        ctx: &RequestContext,
        message: &dyn Message,
        err: &CodecError,
    ) -> Result<Option<Event>, CodecError>;
}
