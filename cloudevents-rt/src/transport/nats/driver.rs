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

//! NATS driver seam.

use crate::codec::{BinaryParts, CLOUDEVENTS_JSON, CodecError};
use crate::transport::{Message, TransportContext, TransportError};

/// A message delivered on a subject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NatsMessage {
    /// Subject
    pub subject: String,
    /// Stream sequence for streaming deliveries, zero for core NATS
    pub sequence: u64,
    /// Payload
    pub data: Vec<u8>,
}

impl Message for NatsMessage {
    /// NATS carries only structured events, so every payload is treated
    /// as a structured document.
    fn content_type(&self) -> Option<String> {
        Some(CLOUDEVENTS_JSON.to_string())
    }

    fn body(&self) -> &[u8] {
        &self.data
    }

    fn binary_parts(&self) -> Result<BinaryParts, CodecError> {
        Err(CodecError::binary("NATS messages carry no attributes"))
    }

    fn transport_context(&self) -> Option<TransportContext> {
        Some(TransportContext::Nats {
            subject: self.subject.clone(),
        })
    }
}

/// A connection to a NATS server or JetStream context.
#[async_trait::async_trait]
pub trait NatsConnection: Send + Sync + 'static {
    /// Publishes `data` on `subject`.
    async fn publish(&self, subject: &str, data: Vec<u8>) -> Result<(), TransportError>;

    /// Subscribes to `subject`.
    async fn subscribe(&self, subject: &str) -> Result<Box<dyn NatsSubscription>, TransportError>;
}

/// An active subscription.
#[async_trait::async_trait]
pub trait NatsSubscription: Send + 'static {
    /// Waits for the next message. `None` means the subscription ended.
    async fn next(&mut self) -> Result<Option<NatsMessage>, TransportError>;

    /// Acknowledges a streaming delivery.
    async fn ack(&mut self, message: &NatsMessage) -> Result<(), TransportError>;

    /// Ends the subscription.
    async fn unsubscribe(&mut self) -> Result<(), TransportError>;
}
