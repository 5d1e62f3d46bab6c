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

//! Built-in event defaulters.

use crate::event::Event;
use crate::types::Timestamp;
use std::sync::Arc;
use uuid::Uuid;

/// A pure function run over every outbound event before it is sent.
pub type EventDefaulter = Arc<dyn Fn(Event) -> Event + Send + Sync>;

/// Assigns a random UUID v4 as the id if none is set.
#[must_use]
pub fn default_id_to_uuid(mut event: Event) -> Event {
    if event.id().is_empty() {
        event.set_id(Uuid::new_v4().to_string());
    }
    event
}

/// Assigns the current time if none is set.
#[must_use]
pub fn default_time_to_now(mut event: Event) -> Event {
    if event.time().is_none_or(Timestamp::is_zero) {
        event.set_time(Timestamp::now());
    }
    event
}
