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

//! Transport layer.
//!
//! A [`Transport`] moves events between the codec and a concrete wire. It
//! can send one event and optionally get a reply, and it can run a blocking
//! receive loop that hands each decoded event to a [`Receiver`]. When the
//! codec rejects an inbound message, an installed [`Converter`] gets a
//! chance to produce the event instead.
//!
//! Implementations:
//!
//! - [`http::HttpTransport`]: axum server and reqwest client
//! - [`kafka::KafkaTransport`]: Kafka records over a producer/consumer seam
//! - [`nats::NatsTransport`]: NATS and JetStream, structured only
//! - [`pubsub::PubSubTransport`]: Cloud Pub/Sub over a publisher/subscriber seam
//!
//! The broker transports ship with in-memory drivers for tests and
//! in-process use.
//!
//! # Receiver lifecycle
//!
//! A receive loop can run once at a time per transport. A second call to
//! [`Transport::start_receiver`] while one is running fails with
//! [`TransportError::AlreadyStarted`]. Cancelling the token ends the loop.
//! Work already in flight gets the transport's shutdown timeout to finish,
//! after which the loop returns [`TransportError::ShutdownTimeout`].
//!
//! # Examples
//!
//! ```rust
//! use cloudevents_rt::event::{Event, SpecVersion};
//! use cloudevents_rt::transport::nats::{MemoryNats, NatsConfig, NatsTransport};
//! use cloudevents_rt::transport::{RequestContext, Transport};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = NatsTransport::new(NatsConfig::new("events"), MemoryNats::new())?;
//!
//! let mut event = Event::new(SpecVersion::V10);
//! event.set_id("ABC-123");
//! event.set_type("com.example.test");
//! event.set_source("/unit/test/client")?;
//! assert!(transport.send(&RequestContext::new(), event).await?.is_none());
//! # Ok(())
//! # }
//! ```

mod context;
pub(crate) mod dispatch;
mod error;
mod lifecycle;
pub(crate) mod message;
mod response;
mod traits;

pub mod http;
pub mod kafka;
pub mod nats;
pub mod pubsub;

pub use self::context::{RequestContext, TransportContext};
pub use self::error::TransportError;
pub use self::lifecycle::{DEFAULT_SHUTDOWN_TIMEOUT, Lifecycle, LifecycleGuard, ReceiverState};
pub use self::message::{ATTRIBUTE_PREFIX, Message};
pub use self::response::EventResponse;
pub use self::traits::{Converter, HandlerError, Receiver, Transport};
