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

//! Client configuration.

use super::defaulters::{EventDefaulter, default_id_to_uuid, default_time_to_now};
use crate::event::Event;
use crate::transport::Converter;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Options for a [`Client`](super::Client).
///
/// Defaulters run in the order they were added; filesystem overrides run
/// after all of them.
///
/// # Examples
///
/// ```rust
/// use cloudevents_rt::client::ClientConfig;
///
/// let config = ClientConfig::default()
///     .with_uuids()
///     .with_time_now()
///     .with_event_defaulter(|mut event| {
///         event.set_subject(Some("default"));
///         event
///     });
/// assert_eq!(config.defaulter_count(), 3);
/// ```
#[derive(Clone, Default)]
pub struct ClientConfig {
    pub(crate) defaulters: Vec<EventDefaulter>,
    pub(crate) converter: Option<Arc<dyn Converter>>,
    pub(crate) overrides: Option<PathBuf>,
    pub(crate) trace_propagation: bool,
}

impl ClientConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a UUID v4 to events without an id.
    #[must_use]
    pub fn with_uuids(self) -> Self {
        self.with_event_defaulter(default_id_to_uuid)
    }

    /// Assigns the current time to events without one.
    #[must_use]
    pub fn with_time_now(self) -> Self {
        self.with_event_defaulter(default_time_to_now)
    }

    /// Appends a defaulter.
    #[must_use]
    pub fn with_event_defaulter<F>(mut self, defaulter: F) -> Self
    where
        F: Fn(Event) -> Event + Send + Sync + 'static,
    {
        self.defaulters.push(Arc::new(defaulter));
        self
    }

    /// Installs a converter on the transport.
    #[must_use]
    pub fn with_converter(mut self, converter: impl Converter) -> Self {
        self.converter = Some(Arc::new(converter));
        self
    }

    /// Stamps the files of `dir` onto outbound events as extensions.
    #[must_use]
    pub fn with_overrides(mut self, dir: impl Into<PathBuf>) -> Self {
        self.overrides = Some(dir.into());
        self
    }

    /// Copies the request context's trace parent onto outbound events that
    /// have none.
    #[must_use]
    pub fn with_trace_propagation(mut self, enabled: bool) -> Self {
        self.trace_propagation = enabled;
        self
    }

    /// Returns the number of configured defaulters.
    #[must_use]
    pub fn defaulter_count(&self) -> usize {
        self.defaulters.len()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("defaulters", &self.defaulters.len())
            .field("converter", &self.converter.is_some())
            .field("overrides", &self.overrides)
            .field("trace_propagation", &self.trace_propagation)
            .finish()
    }
}
