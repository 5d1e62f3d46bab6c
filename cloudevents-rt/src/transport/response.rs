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

//! Handler response holder.

use crate::event::Event;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct ResponseState {
    status: Option<u16>,
    reason: Option<String>,
    event: Option<Event>,
}

/// What a handler wants sent back for the message it handled.
///
/// Clones share state, so the transport keeps one clone while the handler
/// fills in another. Transports without a reply channel ignore the event.
///
/// # Examples
///
/// ```rust
/// use cloudevents_rt::transport::EventResponse;
///
/// let response = EventResponse::new();
/// response.error(409, "duplicate");
/// assert_eq!(response.status(), Some(409));
/// assert_eq!(response.reason().as_deref(), Some("duplicate"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventResponse {
    inner: Arc<Mutex<ResponseState>>,
}

impl EventResponse {
    /// Creates an empty response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replies with `event`.
    pub fn respond(&self, event: Event) {
        self.inner.lock().event = Some(event);
    }

    /// Replies with `event` and an explicit status code.
    pub fn respond_with_status(&self, status: u16, event: Option<Event>) {
        let mut state = self.inner.lock();
        state.status = Some(status);
        state.event = event;
    }

    /// Signals a failure with a status code and reason.
    pub fn error(&self, status: u16, reason: impl Into<String>) {
        let mut state = self.inner.lock();
        state.status = Some(status);
        state.reason = Some(reason.into());
    }

    /// Returns the status the handler set.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.inner.lock().status
    }

    /// Returns the reason the handler set.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.inner.lock().reason.clone()
    }

    /// Returns a copy of the reply event.
    #[must_use]
    pub fn event(&self) -> Option<Event> {
        self.inner.lock().event.clone()
    }

    /// Takes the reply event out of the response.
    #[must_use]
    pub fn take_event(&self) -> Option<Event> {
        self.inner.lock().event.take()
    }
}
