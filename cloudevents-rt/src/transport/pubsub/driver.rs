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

//! Pub/Sub driver seam.

use crate::codec::{BinaryParts, CodecError};
use crate::transport::message::parts_from_headers;
use crate::transport::{Message, TransportContext, TransportError};
use crate::types::Timestamp;
use std::collections::BTreeMap;

/// Attribute carrying the data content type in binary mode and the
/// document media type in structured mode.
pub const CONTENT_TYPE_ATTRIBUTE: &str = "content-type";

/// A pulled Pub/Sub message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PubSubMessage {
    /// Server-assigned message id
    pub id: String,
    /// Payload
    pub data: Vec<u8>,
    /// Message attributes
    pub attributes: BTreeMap<String, String>,
    /// Time the server accepted the message
    pub publish_time: Option<Timestamp>,
    /// Subscription the message was pulled from
    pub subscription: String,
}

impl Message for PubSubMessage {
    fn content_type(&self) -> Option<String> {
        self.attributes.get(CONTENT_TYPE_ATTRIBUTE).cloned()
    }

    fn body(&self) -> &[u8] {
        &self.data
    }

    fn binary_parts(&self) -> Result<BinaryParts, CodecError> {
        parts_from_headers(
            self.attributes
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_bytes())),
            self.content_type(),
            &self.data,
        )
    }

    fn transport_context(&self) -> Option<TransportContext> {
        Some(TransportContext::PubSub {
            id: self.id.clone(),
            subscription: self.subscription.clone(),
            publish_time: self.publish_time,
        })
    }
}

/// Publishes messages to a topic.
#[async_trait::async_trait]
pub trait PubSubPublisher: Send + Sync + 'static {
    /// Publishes and returns the server-assigned message id.
    async fn publish(
        &self,
        topic: &str,
        data: Vec<u8>,
        attributes: BTreeMap<String, String>,
    ) -> Result<String, TransportError>;
}

/// Pulls messages from a subscription.
#[async_trait::async_trait]
pub trait PubSubSubscriber: Send + Sync + 'static {
    /// Waits for the next message. `None` means the subscription was closed.
    async fn pull(&self, subscription: &str) -> Result<Option<PubSubMessage>, TransportError>;

    /// Acknowledges `message`.
    async fn ack(&self, message: &PubSubMessage) -> Result<(), TransportError>;

    /// Negatively acknowledges `message`.
    async fn nack(&self, message: &PubSubMessage) -> Result<(), TransportError>;
}
