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

//! Inbound decode and dispatch shared by every transport.

use super::{Converter, EventResponse, HandlerError, Message, Receiver, RequestContext};
use super::TransportError;
use crate::codec::Codec;
use crate::event::Event;
use parking_lot::RwLock;
use std::sync::Arc;

/// Outcome of handing one message's events to the receiver.
#[derive(Debug, Default)]
pub(crate) struct Delivery {
    /// Response of the last event handled
    pub(crate) response: EventResponse,
    /// First handler error, if any
    pub(crate) error: Option<HandlerError>,
}

/// Holds a transport's receiver and converter.
#[derive(Default)]
pub(crate) struct Dispatcher {
    receiver: RwLock<Option<Arc<dyn Receiver>>>,
    converter: RwLock<Option<Arc<dyn Converter>>>,
}

impl Dispatcher {
    pub(crate) fn set_receiver(&self, receiver: Arc<dyn Receiver>) {
        *self.receiver.write() = Some(receiver);
    }

    pub(crate) fn set_converter(&self, converter: Arc<dyn Converter>) {
        *self.converter.write() = Some(converter);
    }

    pub(crate) fn has_converter(&self) -> bool {
        self.converter.read().is_some()
    }

    /// Decodes `message`, falling back to the converter on codec errors.
    pub(crate) async fn decode(
        &self,
        codec: &Codec,
        ctx: &RequestContext,
        message: &dyn Message,
    ) -> Result<Vec<Event>, TransportError> {
        let err = match codec.decode(message) {
            Ok(events) => return Ok(events),
            Err(err) => err,
        };
        let converter = self.converter.read().clone();
        let Some(converter) = converter else {
            return Err(err.into());
        };
        match converter.convert(ctx, message, &err).await {
            Ok(Some(event)) => {
                tracing::debug!(
                    transport = codec.transport(),
                    id = event.id(),
                    "message converted"
                );
                Ok(vec![event])
            }
            Ok(None) => Err(TransportError::ConverterDeclined),
            Err(err) => Err(err.into()),
        }
    }

    /// Hands events to the receiver in order.
    ///
    /// Every event is delivered even if an earlier one fails; the first
    /// error is kept.
    pub(crate) async fn deliver(&self, ctx: &RequestContext, events: Vec<Event>) -> Delivery {
        let receiver = self.receiver.read().clone();
        let mut delivery = Delivery::default();
        let Some(receiver) = receiver else {
            tracing::warn!(count = events.len(), "no receiver installed, dropping events");
            return delivery;
        };
        for event in events {
            let response = EventResponse::new();
            let id = event.id().to_string();
            if let Err(err) = receiver.receive(ctx.clone(), event, response.clone()).await {
                tracing::warn!(id = %id, error = %err, "handler failed");
                delivery.error.get_or_insert(err);
            }
            delivery.response = response;
        }
        delivery
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{BinaryParts, CodecError};
    use crate::event::SpecVersion;
    use parking_lot::Mutex;

    struct Junk;

    impl Message for Junk {
        fn content_type(&self) -> Option<String> {
            Some("text/plain".to_string())
        }

        fn body(&self) -> &[u8] {
            b"hello"
        }

        fn binary_parts(&self) -> Result<BinaryParts, CodecError> {
            Ok(BinaryParts::default())
        }
    }

    struct Declining;

    #[async_trait::async_trait]
    impl Converter for Declining {
        async fn convert(
            &self,
            _ctx: &RequestContext,
            _message: &dyn Message,
            _err: &CodecError,
        ) -> Result<Option<Event>, CodecError> {
            Ok(None)
        }
    }

    struct Wrapping;

    #[async_trait::async_trait]
    impl Converter for Wrapping {
        async fn convert(
            &self,
            _ctx: &RequestContext,
            message: &dyn Message,
            _err: &CodecError,
        ) -> Result<Option<Event>, CodecError> {
            let mut event = Event::new(SpecVersion::V10);
            event.set_id("wrapped");
            event.set_data_bytes(message.body().to_vec());
            Ok(Some(event))
        }
    }

    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl Receiver for Recording {
        async fn receive(
            &self,
            _ctx: RequestContext,
            event: Event,
            _response: EventResponse,
        ) -> Result<(), HandlerError> {
            self.seen.lock().push(event.id().to_string());
            if event.id() == "bad" {
                return Err("bad event".into());
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_decode_without_converter_fails() {
        let dispatcher = Dispatcher::default();
        let result = dispatcher
            .decode(&Codec::new("test"), &RequestContext::new(), &Junk)
            .await;
        assert!(matches!(result, Err(TransportError::Codec(_))));
    }

    #[tokio::test]
    async fn test_converter_declines() {
        let dispatcher = Dispatcher::default();
        dispatcher.set_converter(Arc::new(Declining));
        assert!(dispatcher.has_converter());
        let result = dispatcher
            .decode(&Codec::new("test"), &RequestContext::new(), &Junk)
            .await;
        assert!(matches!(result, Err(TransportError::ConverterDeclined)));
    }

    #[tokio::test]
    async fn test_converter_rescues() {
        let dispatcher = Dispatcher::default();
        dispatcher.set_converter(Arc::new(Wrapping));
        let events = dispatcher
            .decode(&Codec::new("test"), &RequestContext::new(), &Junk)
            .await
            .unwrap();
        assert_eq!(events[0].id(), "wrapped");
        assert_eq!(events[0].data_bytes(), Some(&b"hello"[..]));
    }

    #[tokio::test]
    async fn test_deliver_in_order_keeps_first_error() {
        let dispatcher = Dispatcher::default();
        let receiver = Arc::new(Recording::default());
        dispatcher.set_receiver(receiver.clone());
        let events = ["1", "bad", "3"]
            .into_iter()
            .map(|id| {
                let mut e = Event::new(SpecVersion::V10);
                e.set_id(id);
                e
            })
            .collect();
        let delivery = dispatcher.deliver(&RequestContext::new(), events).await;
        assert_eq!(*receiver.seen.lock(), ["1", "bad", "3"]);
        assert_eq!(delivery.error.unwrap().to_string(), "bad event");
    }
}
