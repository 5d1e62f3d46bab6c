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

//! Client runtime.
//!
//! A [`Client`] wraps one transport. Outbound events pass through the
//! defaulter chain, are validated, and are handed to the transport.
//! Inbound events are delivered to a user [`Handler`].
//!
//! # Examples
//!
//! ```rust
//! use cloudevents_rt::client::{Client, ClientConfig};
//! use cloudevents_rt::event::{Event, SpecVersion};
//! use cloudevents_rt::transport::RequestContext;
//! use cloudevents_rt::transport::kafka::{KafkaConfig, KafkaTransport, MemoryKafka};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), cloudevents_rt::Error> {
//! let broker = MemoryKafka::new();
//! let client = Client::new(
//!     KafkaTransport::new(KafkaConfig::new("events"), broker.clone()),
//!     ClientConfig::new().with_uuids().with_time_now(),
//! );
//!
//! let mut event = Event::new(SpecVersion::V10);
//! event.set_type("com.example.test");
//! event.set_source("/unit/test/client")?;
//! client.send(&RequestContext::new(), event).await?;
//! assert_eq!(broker.records("events").len(), 1);
//! # Ok(())
//! # }
//! ```

mod config;
mod defaulters;
mod handler;
mod observer;

pub use self::config::ClientConfig;
pub use self::defaulters::{EventDefaulter, default_id_to_uuid, default_time_to_now};
pub use self::handler::{Handler, HandlerResult};
pub use self::observer::OverrideObserver;

use self::handler::HandlerReceiver;
use crate::Error;
use crate::event::{DistributedTracingExtension, Event};
use crate::observability::{Measure, report};
use crate::transport::{RequestContext, Transport, TransportError};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Sends and receives events over one transport.
pub struct Client {
    transport: Arc<dyn Transport>,
    defaulters: Vec<EventDefaulter>,
    observer: Option<Arc<OverrideObserver>>,
    trace_propagation: bool,
    receiving: AtomicBool,
    shutdown: CancellationToken,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("transport", &self.transport.name())
            .field("defaulters", &self.defaulters.len())
            .field("observer", &self.observer)
            .field("trace_propagation", &self.trace_propagation)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client over `transport`.
    ///
    /// With overrides configured the directory watch is spawned on the
    /// current Tokio runtime and stops when the client is dropped. Outside a
    /// runtime only the initial walk applies.
    pub fn new(transport: impl Transport, config: ClientConfig) -> Self {
        Self::with_shared(Arc::new(transport), config)
    }

    /// Creates a client over a transport that is shared with other owners.
    pub fn with_shared(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        if let Some(converter) = config.converter {
            transport.set_converter(converter);
        }
        let shutdown = CancellationToken::new();
        let observer = config.overrides.map(|dir| {
            let observer = Arc::new(OverrideObserver::new(dir));
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let watcher = observer.clone();
                    let token = shutdown.child_token();
                    handle.spawn(async move {
                        if let Err(err) = watcher.watch(token).await {
                            tracing::warn!(
                                dir = %watcher.dir().display(),
                                error = %err,
                                "override watch failed"
                            );
                        }
                    });
                }
                Err(_) => {
                    tracing::warn!(
                        dir = %observer.dir().display(),
                        "no runtime; override directory will not be watched"
                    );
                }
            }
            observer
        });
        Self {
            transport,
            defaulters: config.defaulters,
            observer,
            trace_propagation: config.trace_propagation,
            receiving: AtomicBool::new(false),
            shutdown,
        }
    }

    /// Returns the underlying transport.
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Returns the override observer, if configured.
    #[must_use]
    pub fn observer(&self) -> Option<&OverrideObserver> {
        self.observer.as_deref()
    }

    /// Runs the defaulter chain, then the overrides, over `event`.
    #[must_use]
    pub fn apply_defaults(&self, event: Event) -> Event {
        let event = self
            .defaulters
            .iter()
            .fold(event, |event, defaulter| defaulter(event));
        match &self.observer {
            Some(observer) => observer.apply(event),
            None => event,
        }
    }

    /// Defaults, validates and sends `event`.
    ///
    /// Returns the peer's reply event when the transport has one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Event`] if the defaulted event is invalid and the
    /// transport's error otherwise.
    pub async fn send(&self, ctx: &RequestContext, event: Event) -> Result<Option<Event>, Error> {
        let reporter = report(Measure::Client, "send");
        let span = reporter.span().clone();
        let result = self.send_event(ctx, event).instrument(span).await;
        reporter.result(&result);
        result
    }

    #[cfg_attr(
        feature = "observability",
        tracing::instrument(skip(self, ctx, event), fields(transport = self.transport.name()))
    )]
    async fn send_event(&self, ctx: &RequestContext, event: Event) -> Result<Option<Event>, Error> {
        let mut event = self.apply_defaults(event);
        if self.trace_propagation {
            attach_trace_parent(ctx, &mut event)?;
        }
        event.validate()?;
        Ok(self.transport.send(ctx, event).await?)
    }

    /// Delivers inbound events to `handler` until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::AlreadyStarted`] if this client is already
    /// receiving, and the transport's fatal error otherwise.
    pub async fn start_receiver<H, Args>(
        &self,
        cancel: CancellationToken,
        handler: H,
    ) -> Result<(), Error>
    where
        H: Handler<Args>,
        Args: 'static,
    {
        if self
            .receiving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(TransportError::AlreadyStarted.into());
        }
        let _receiving = ReceivingGuard(&self.receiving);
        self.transport
            .set_receiver(Arc::new(HandlerReceiver::new(handler)));
        tracing::info!(transport = self.transport.name(), "client receiver starting");
        let result = self.transport.start_receiver(cancel).await;
        tracing::info!(
            transport = self.transport.name(),
            ok = result.is_ok(),
            "client receiver stopped"
        );
        result.map_err(Error::from)
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

struct ReceivingGuard<'a>(&'a AtomicBool);

impl Drop for ReceivingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Adds the context's trace parent unless the event already carries one.
fn attach_trace_parent(ctx: &RequestContext, event: &mut Event) -> Result<(), Error> {
    let Some(trace_parent) = ctx.trace_parent() else {
        return Ok(());
    };
    if DistributedTracingExtension::from_event(event).is_some() {
        return Ok(());
    }
    let mut extension = DistributedTracingExtension::new(trace_parent);
    if let Some(state) = ctx.trace_state() {
        extension = extension.with_trace_state(state);
    }
    extension.add_to(event)?;
    Ok(())
}
