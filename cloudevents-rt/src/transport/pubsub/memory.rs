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

//! In-process Pub/Sub service.

use super::{PubSubMessage, PubSubPublisher, PubSubSubscriber};
use crate::transport::TransportError;
use crate::types::Timestamp;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Service {
    topics: Mutex<HashMap<String, Vec<String>>>,
    queues: Mutex<HashMap<String, VecDeque<PubSubMessage>>>,
    acked: Mutex<Vec<String>>,
    nacked: Mutex<Vec<String>>,
    next_id: AtomicU64,
    notify: Notify,
    closed: AtomicBool,
}

/// An in-memory Pub/Sub service. Clones share state.
///
/// Each subscription attached to a topic gets its own copy of every message
/// published after it was created. Nacked messages are recorded and not
/// redelivered.
#[derive(Debug, Clone, Default)]
pub struct MemoryPubSub {
    service: Arc<Service>,
}

impl MemoryPubSub {
    /// Creates an empty service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `subscription` to `topic`.
    pub fn create_subscription(&self, topic: &str, subscription: &str) {
        self.service
            .topics
            .lock()
            .entry(topic.to_string())
            .or_default()
            .push(subscription.to_string());
        self.service
            .queues
            .lock()
            .entry(subscription.to_string())
            .or_default();
    }

    /// Returns the number of undelivered messages on `subscription`.
    #[must_use]
    pub fn pending(&self, subscription: &str) -> usize {
        self.service
            .queues
            .lock()
            .get(subscription)
            .map_or(0, VecDeque::len)
    }

    /// Returns acknowledged message ids in ack order.
    #[must_use]
    pub fn acked(&self) -> Vec<String> {
        self.service.acked.lock().clone()
    }

    /// Returns negatively acknowledged message ids.
    #[must_use]
    pub fn nacked(&self) -> Vec<String> {
        self.service.nacked.lock().clone()
    }

    /// Closes the service; pending and future pulls return `None`.
    pub fn close(&self) {
        self.service.closed.store(true, Ordering::Release);
        self.service.notify.notify_waiters();
    }

    fn take(&self, subscription: &str) -> Result<Option<PubSubMessage>, TransportError> {
        let mut queues = self.service.queues.lock();
        let Some(queue) = queues.get_mut(subscription) else {
            return Err(TransportError::driver(
                "pubsub",
                format!("subscription {subscription} does not exist"),
            ));
        };
        Ok(queue.pop_front())
    }
}

#[async_trait::async_trait]
impl PubSubPublisher for MemoryPubSub {
    async fn publish(
        &self,
        topic: &str,
        data: Vec<u8>,
        attributes: BTreeMap<String, String>,
    ) -> Result<String, TransportError> {
        if self.service.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        let id = (self.service.next_id.fetch_add(1, Ordering::AcqRel) + 1).to_string();
        let subscriptions = self
            .service
            .topics
            .lock()
            .get(topic)
            .cloned()
            .unwrap_or_default();
        {
            let mut queues = self.service.queues.lock();
            let publish_time = Timestamp::now();
            for subscription in subscriptions {
                queues
                    .entry(subscription.clone())
                    .or_default()
                    .push_back(PubSubMessage {
                        id: id.clone(),
                        data: data.clone(),
                        attributes: attributes.clone(),
                        publish_time: Some(publish_time),
                        subscription,
                    });
            }
        }
        self.service.notify.notify_waiters();
        Ok(id)
    }
}

#[async_trait::async_trait]
impl PubSubSubscriber for MemoryPubSub {
    async fn pull(&self, subscription: &str) -> Result<Option<PubSubMessage>, TransportError> {
        loop {
            let notified = self.service.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if let Some(message) = self.take(subscription)? {
                return Ok(Some(message));
            }
            if self.service.closed.load(Ordering::Acquire) {
                return Ok(None);
            }
            notified.await;
        }
    }

    async fn ack(&self, message: &PubSubMessage) -> Result<(), TransportError> {
        self.service.acked.lock().push(message.id.clone());
        Ok(())
    }

    async fn nack(&self, message: &PubSubMessage) -> Result<(), TransportError> {
        self.service.nacked.lock().push(message.id.clone());
        Ok(())
    }
}
