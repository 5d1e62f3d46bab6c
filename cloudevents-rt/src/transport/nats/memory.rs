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

//! In-process NATS server with exact-match subjects.

use super::{NatsConnection, NatsMessage, NatsSubscription};
use crate::transport::TransportError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

#[derive(Debug, Default)]
struct Server {
    subscribers: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<NatsMessage>>>>,
    acked: Mutex<Vec<u64>>,
    sequence: AtomicU64,
}

/// An in-memory NATS server. Clones share the same subjects.
///
/// Messages published with no subscriber are dropped, as with core NATS.
/// Every delivery gets a sequence number so streaming acks can be checked
/// with [`MemoryNats::acked`].
#[derive(Debug, Clone, Default)]
pub struct MemoryNats {
    server: Arc<Server>,
}

impl MemoryNats {
    /// Creates an empty server.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the acknowledged sequence numbers in ack order.
    #[must_use]
    pub fn acked(&self) -> Vec<u64> {
        self.server.acked.lock().clone()
    }

    /// Returns the number of live subscriptions on `subject`.
    #[must_use]
    pub fn subscriber_count(&self, subject: &str) -> usize {
        self.server
            .subscribers
            .lock()
            .get(subject)
            .map_or(0, |subs| subs.iter().filter(|s| !s.is_closed()).count())
    }

    /// Ends every subscription.
    pub fn close(&self) {
        self.server.subscribers.lock().clear();
    }
}

#[async_trait::async_trait]
impl NatsConnection for MemoryNats {
    async fn publish(&self, subject: &str, data: Vec<u8>) -> Result<(), TransportError> {
        let sequence = self.server.sequence.fetch_add(1, Ordering::AcqRel) + 1;
        let mut subscribers = self.server.subscribers.lock();
        if let Some(subs) = subscribers.get_mut(subject) {
            subs.retain(|sub| {
                sub.send(NatsMessage {
                    subject: subject.to_string(),
                    sequence,
                    data: data.clone(),
                })
                .is_ok()
            });
        }
        Ok(())
    }

    async fn subscribe(&self, subject: &str) -> Result<Box<dyn NatsSubscription>, TransportError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.server
            .subscribers
            .lock()
            .entry(subject.to_string())
            .or_default()
            .push(tx);
        Ok(Box::new(MemoryNatsSubscription {
            server: self.server.clone(),
            rx,
        }))
    }
}

struct MemoryNatsSubscription {
    server: Arc<Server>,
    rx: mpsc::UnboundedReceiver<NatsMessage>,
}

#[async_trait::async_trait]
impl NatsSubscription for MemoryNatsSubscription {
    async fn next(&mut self) -> Result<Option<NatsMessage>, TransportError> {
        Ok(self.rx.recv().await)
    }

    async fn ack(&mut self, message: &NatsMessage) -> Result<(), TransportError> {
        self.server.acked.lock().push(message.sequence);
        Ok(())
    }

    async fn unsubscribe(&mut self) -> Result<(), TransportError> {
        self.rx.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fan_out() {
        let nats = MemoryNats::new();
        let mut a = nats.subscribe("events").await.unwrap();
        let mut b = nats.subscribe("events").await.unwrap();
        nats.publish("events", b"hi".to_vec()).await.unwrap();
        assert_eq!(a.next().await.unwrap().unwrap().data, b"hi");
        assert_eq!(b.next().await.unwrap().unwrap().data, b"hi");
    }

    #[tokio::test]
    async fn test_close_ends_subscription() {
        let nats = MemoryNats::new();
        let mut sub = nats.subscribe("events").await.unwrap();
        assert_eq!(nats.subscriber_count("events"), 1);
        nats.close();
        assert!(sub.next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ack_records_sequence() {
        let nats = MemoryNats::new();
        let mut sub = nats.subscribe("events").await.unwrap();
        nats.publish("events", b"1".to_vec()).await.unwrap();
        let message = sub.next().await.unwrap().unwrap();
        sub.ack(&message).await.unwrap();
        assert_eq!(nats.acked(), [message.sequence]);
    }
}
