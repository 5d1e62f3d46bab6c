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

//! Event model error types.
//!
//! Event errors are the validation layer of the error hierarchy. They are
//! raised while building or converting an event and never depend on a wire.

use super::SpecVersion;
use thiserror::Error;

/// Errors raised by the in-memory event model.
///
/// # Examples
///
/// ```rust
/// use cloudevents_rt::event::{Event, EventError, SpecVersion};
///
/// let mut event = Event::new(SpecVersion::V10);
/// let err = event.set_extension("Bad-Key", "value").unwrap_err();
/// assert!(matches!(err, EventError::BadExtensionKey { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// A required attribute is unset or empty.
    #[error("{attribute}: REQUIRED but missing (specversion {version})")]
    MissingAttribute {
        /// Wire name of the attribute
        attribute: &'static str,
        /// Version whose rules were applied
        version: SpecVersion,
    },

    /// An extension key is not lowercase alphanumeric.
    #[error("bad extension key {key:?}: must match [a-z0-9]+")]
    BadExtensionKey {
        /// The rejected key
        key: String,
    },

    /// A timestamp could not be parsed as RFC 3339.
    #[error("bad timestamp {value:?}: {reason}")]
    BadTimestamp {
        /// The rejected text
        value: String,
        /// Parser message
        reason: String,
    },

    /// A URI-reference violates the URI grammar.
    #[error("bad URI-reference {value:?}: {reason}")]
    BadUriRef {
        /// The rejected text
        value: String,
        /// What was wrong with it
        reason: String,
    },

    /// A specversion value names no known version.
    #[error("unsupported specversion {version:?}")]
    UnsupportedSpecVersion {
        /// The version text that was found
        version: String,
    },

    /// An attribute does not exist in the event's version.
    #[error("attribute {attribute} is not supported by specversion {version}")]
    UnsupportedAttribute {
        /// Wire name of the attribute
        attribute: &'static str,
        /// Version of the context
        version: SpecVersion,
    },

    /// An attribute is present but its value is not allowed.
    #[error("invalid value for {attribute}: {reason}")]
    InvalidAttribute {
        /// Wire name of the attribute
        attribute: &'static str,
        /// What was wrong with it
        reason: String,
    },
}

impl EventError {
    /// Returns `true` for errors produced by [`Event::validate`](super::Event::validate).
    #[must_use]
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::UnsupportedSpecVersion { .. })
    }
}
