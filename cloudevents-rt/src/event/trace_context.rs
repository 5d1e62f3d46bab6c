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

//! The distributed tracing extension (`traceparent` / `tracestate`).

use super::{Event, EventError};
use serde_json::Value;

/// Extension key carrying a W3C trace parent.
pub const TRACE_PARENT_EXTENSION: &str = "traceparent";
/// Extension key carrying W3C trace state.
pub const TRACE_STATE_EXTENSION: &str = "tracestate";

/// W3C trace context carried as event extensions.
///
/// # Examples
///
/// ```rust
/// use cloudevents_rt::event::{DistributedTracingExtension, Event, SpecVersion};
///
/// let mut event = Event::new(SpecVersion::V10);
/// let dte = DistributedTracingExtension::new(
///     "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
/// );
/// dte.add_to(&mut event).unwrap();
/// assert_eq!(DistributedTracingExtension::from_event(&event), Some(dte));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributedTracingExtension {
    /// `traceparent`
    pub trace_parent: String,
    /// `tracestate`
    pub trace_state: Option<String>,
}

impl DistributedTracingExtension {
    /// Creates an extension with a trace parent and no state.
    #[must_use]
    pub fn new(trace_parent: impl Into<String>) -> Self {
        Self {
            trace_parent: trace_parent.into(),
            trace_state: None,
        }
    }

    /// Sets the trace state.
    #[must_use]
    pub fn with_trace_state(mut self, state: impl Into<String>) -> Self {
        self.trace_state = Some(state.into());
        self
    }

    /// Reads the extension from an event.
    #[must_use]
    pub fn from_event(event: &Event) -> Option<Self> {
        let trace_parent = event
            .extension(TRACE_PARENT_EXTENSION)
            .and_then(Value::as_str)?
            .to_string();
        let trace_state = event
            .extension(TRACE_STATE_EXTENSION)
            .and_then(Value::as_str)
            .map(str::to_string);
        Some(Self {
            trace_parent,
            trace_state,
        })
    }

    /// Writes the extension onto an event, replacing any previous values.
    ///
    /// # Errors
    ///
    /// Propagates extension errors from the event.
    pub fn add_to(&self, event: &mut Event) -> Result<(), EventError> {
        event.set_extension(TRACE_PARENT_EXTENSION, self.trace_parent.as_str())?;
        match &self.trace_state {
            Some(state) => event.set_extension(TRACE_STATE_EXTENSION, state.as_str()),
            None => event.set_extension(TRACE_STATE_EXTENSION, &Value::Null),
        }
    }
}
