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

//! In-process Kafka broker with one partition per topic.

use super::{KafkaConsumer, KafkaProducer, KafkaRecord};
use crate::transport::TransportError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Broker {
    topics: Mutex<HashMap<String, Vec<KafkaRecord>>>,
    committed: Mutex<HashMap<(String, String), i64>>,
    notify: Notify,
    closed: AtomicBool,
}

/// An in-memory broker. Clones share the same log.
///
/// # Examples
///
/// ```rust
/// use cloudevents_rt::transport::kafka::{KafkaProducer, KafkaRecord, MemoryKafka};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let broker = MemoryKafka::new();
/// broker
///     .produce(KafkaRecord {
///         topic: "events".to_string(),
///         value: b"{}".to_vec(),
///         ..Default::default()
///     })
///     .await
///     .unwrap();
/// assert_eq!(broker.records("events").len(), 1);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryKafka {
    broker: Arc<Broker>,
}

impl MemoryKafka {
    /// Creates an empty broker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a consumer attached to this broker.
    #[must_use]
    pub fn consumer(&self) -> MemoryKafkaConsumer {
        MemoryKafkaConsumer {
            broker: self.broker.clone(),
            subscription: Mutex::new(None),
        }
    }

    /// Returns every record written to `topic`.
    #[must_use]
    pub fn records(&self, topic: &str) -> Vec<KafkaRecord> {
        self.broker
            .topics
            .lock()
            .get(topic)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the last committed offset of `group` on `topic`.
    #[must_use]
    pub fn committed(&self, topic: &str, group: &str) -> Option<i64> {
        self.broker
            .committed
            .lock()
            .get(&(topic.to_string(), group.to_string()))
            .copied()
    }

    /// Closes the broker; pending and future polls return `None`.
    pub fn close(&self) {
        self.broker.closed.store(true, Ordering::Release);
        self.broker.notify.notify_waiters();
    }
}

#[async_trait::async_trait]
impl KafkaProducer for MemoryKafka {
    async fn produce(&self, mut record: KafkaRecord) -> Result<(), TransportError> {
        if self.broker.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        {
            let mut topics = self.broker.topics.lock();
            let log = topics.entry(record.topic.clone()).or_default();
            record.partition = 0;
            record.offset = log.len() as i64;
            log.push(record);
        }
        self.broker.notify.notify_waiters();
        Ok(())
    }
}

#[derive(Debug)]
struct Subscription {
    topic: String,
    group: String,
    next: usize,
}

/// A consumer of a [`MemoryKafka`] broker.
///
/// Subscribing resumes after the group's last committed offset.
#[derive(Debug)]
pub struct MemoryKafkaConsumer {
    broker: Arc<Broker>,
    subscription: Mutex<Option<Subscription>>,
}

impl MemoryKafkaConsumer {
    fn next_record(&self) -> Result<Option<KafkaRecord>, TransportError> {
        let mut subscription = self.subscription.lock();
        let Some(sub) = subscription.as_mut() else {
            return Err(TransportError::invalid_configuration("poll before subscribe"));
        };
        let topics = self.broker.topics.lock();
        let record = topics
            .get(&sub.topic)
            .and_then(|log| log.get(sub.next))
            .cloned();
        if record.is_some() {
            sub.next += 1;
        }
        Ok(record)
    }
}

#[async_trait::async_trait]
impl KafkaConsumer for MemoryKafkaConsumer {
    async fn subscribe(&self, topic: &str, group: &str) -> Result<(), TransportError> {
        let committed = self
            .broker
            .committed
            .lock()
            .get(&(topic.to_string(), group.to_string()))
            .copied();
        *self.subscription.lock() = Some(Subscription {
            topic: topic.to_string(),
            group: group.to_string(),
            next: committed.map_or(0, |offset| offset as usize + 1),
        });
        Ok(())
    }

    async fn poll(&self) -> Result<Option<KafkaRecord>, TransportError> {
        loop {
            let notified = self.broker.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if let Some(record) = self.next_record()? {
                return Ok(Some(record));
            }
            if self.broker.closed.load(Ordering::Acquire) {
                return Ok(None);
            }
            notified.await;
        }
    }

    async fn commit(&self, record: &KafkaRecord) -> Result<(), TransportError> {
        let group = match self.subscription.lock().as_ref() {
            Some(sub) => sub.group.clone(),
            None => return Err(TransportError::invalid_configuration("commit before subscribe")),
        };
        self.broker
            .committed
            .lock()
            .insert((record.topic.clone(), group), record.offset);
        Ok(())
    }
}
