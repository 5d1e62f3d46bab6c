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

//! RFC 3339 timestamps.

use crate::event::EventError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An RFC 3339 timestamp with up to nanosecond precision.
///
/// The zero timestamp is the result of parsing an empty string. It formats
/// back to an empty string so that an unset wire value survives a round trip.
///
/// Formatting follows the shortest exact representation: trailing zeros of
/// the fractional second are dropped and the fraction disappears entirely
/// for whole seconds.
///
/// # Examples
///
/// ```rust
/// use cloudevents_rt::types::Timestamp;
///
/// let ts = Timestamp::parse("2020-04-05T17:31:00.120000Z").unwrap();
/// assert_eq!(ts.to_string(), "2020-04-05T17:31:00.12Z");
///
/// let zero = Timestamp::parse("").unwrap();
/// assert!(zero.is_zero());
/// assert_eq!(zero.to_string(), "");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(Option<DateTime<Utc>>);

impl Timestamp {
    /// Returns the zero timestamp.
    #[must_use]
    pub const fn zero() -> Self {
        Self(None)
    }

    /// Returns a timestamp for the current instant.
    #[must_use]
    pub fn now() -> Self {
        Self(Some(Utc::now()))
    }

    /// Parses an RFC 3339 timestamp.
    ///
    /// Offsets other than `Z` are accepted and normalized to UTC.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::BadTimestamp`] if `s` is neither empty nor a
    /// valid RFC 3339 timestamp.
    pub fn parse(s: &str) -> Result<Self, EventError> {
        if s.is_empty() {
            return Ok(Self::zero());
        }
        DateTime::parse_from_rfc3339(s)
            .map(|t| Self(Some(t.with_timezone(&Utc))))
            .map_err(|e| EventError::BadTimestamp {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }

    /// Returns `true` if this is the zero timestamp.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0.is_none()
    }

    /// Returns the underlying UTC instant, if any.
    #[must_use]
    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        self.0.as_ref()
    }

    /// Formats the timestamp as RFC 3339 with nanosecond precision,
    /// trimming trailing zeros from the fractional second.
    #[must_use]
    pub fn format(&self) -> String {
        let Some(t) = self.0 else {
            return String::new();
        };
        let full = t.to_rfc3339_opts(SecondsFormat::Nanos, true);
        match full.find('.') {
            Some(dot) => {
                let (head, rest) = full.split_at(dot);
                let fraction = rest.trim_end_matches('Z').trim_end_matches('0');
                if fraction == "." {
                    format!("{head}Z")
                } else {
                    format!("{head}{fraction}Z")
                }
            }
            None => full,
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(Some(value))
    }
}

impl FromStr for Timestamp {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.format())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
