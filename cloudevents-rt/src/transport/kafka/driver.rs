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

//! Kafka driver seam.
//!
//! Implement [`KafkaProducer`] and [`KafkaConsumer`] over a broker client to
//! run the transport against a real cluster.

use crate::codec::{BinaryParts, CodecError};
use crate::transport::message::parts_from_headers;
use crate::transport::{Message, TransportContext, TransportError};

/// One Kafka record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KafkaRecord {
    /// Topic
    pub topic: String,
    /// Partition; assigned by the broker on produce
    pub partition: i32,
    /// Offset; assigned by the broker on produce
    pub offset: i64,
    /// Record key
    pub key: Option<Vec<u8>>,
    /// Record headers in order
    pub headers: Vec<(String, Vec<u8>)>,
    /// Record value
    pub value: Vec<u8>,
}

impl KafkaRecord {
    /// Returns the last header named `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_slice())
    }
}

impl Message for KafkaRecord {
    fn content_type(&self) -> Option<String> {
        self.header("content-type")
            .and_then(|v| std::str::from_utf8(v).ok())
            .map(str::to_string)
    }

    fn body(&self) -> &[u8] {
        &self.value
    }

    fn binary_parts(&self) -> Result<BinaryParts, CodecError> {
        parts_from_headers(
            self.headers.iter().map(|(n, v)| (n.as_str(), v.as_slice())),
            self.content_type(),
            &self.value,
        )
    }

    fn transport_context(&self) -> Option<TransportContext> {
        Some(TransportContext::Kafka {
            topic: self.topic.clone(),
            partition: self.partition,
            offset: self.offset,
            key: self.key.clone(),
        })
    }
}

/// Publishes records.
#[async_trait::async_trait]
pub trait KafkaProducer: Send + Sync + 'static {
    /// Writes `record` and waits for the broker's acknowledgement.
    async fn produce(&self, record: KafkaRecord) -> Result<(), TransportError>;
}

/// Consumes records as a member of a consumer group.
#[async_trait::async_trait]
pub trait KafkaConsumer: Send + Sync + 'static {
    /// Joins `group` and subscribes to `topic`.
    async fn subscribe(&self, topic: &str, group: &str) -> Result<(), TransportError>;

    /// Waits for the next record. `None` means the consumer was closed.
    async fn poll(&self) -> Result<Option<KafkaRecord>, TransportError>;

    /// Commits the offset of `record` for the group.
    async fn commit(&self, record: &KafkaRecord) -> Result<(), TransportError>;
}
