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

use crate::event::EventError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A URI-reference (RFC 3986 section 4.1).
///
/// Both absolute URIs (`https://example.com/a`) and relative references
/// (`/unit/test`, `a/b?c`) are accepted. The value keeps its original text.
///
/// # Examples
///
/// ```rust
/// use cloudevents_rt::types::UriRef;
///
/// assert!(UriRef::parse("http://example.com/source").is_ok());
/// assert!(UriRef::parse("relative/path").is_ok());
/// assert!(UriRef::parse("has space").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UriRef(String);

impl UriRef {
    /// Parses and validates a URI-reference.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::BadUriRef`] when the text contains characters
    /// that are never legal in a URI, a malformed percent escape, or an
    /// invalid scheme.
    pub fn parse(s: &str) -> Result<Self, EventError> {
        validate(s).map_err(|reason| EventError::BadUriRef {
            value: s.to_string(),
            reason: reason.to_string(),
        })?;
        Ok(Self(s.to_string()))
    }

    /// Returns the reference text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the reference is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the scheme if this is an absolute URI.
    #[must_use]
    pub fn scheme(&self) -> Option<&str> {
        scheme_end(&self.0).map(|end| &self.0[..end])
    }
}

fn scheme_end(s: &str) -> Option<usize> {
    let end = s.find([':', '/', '?', '#'])?;
    (s.as_bytes()[end] == b':').then_some(end)
}

fn validate(s: &str) -> Result<(), &'static str> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            0x00..=0x20 | 0x7f => return Err("contains a control or space character"),
            b'<' | b'>' | b'"' | b'{' | b'}' | b'|' | b'\\' | b'^' | b'`' => {
                return Err("contains a character that is not allowed in a URI");
            }
            b'%' => {
                let valid = bytes
                    .get(i + 1..i + 3)
                    .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
                if !valid {
                    return Err("malformed percent escape");
                }
                i += 2;
            }
            _ => {}
        }
        i += 1;
    }

    if let Some(end) = scheme_end(s) {
        let scheme = &bytes[..end];
        let valid = scheme.first().is_some_and(u8::is_ascii_alphabetic)
            && scheme
                .iter()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, b'+' | b'-' | b'.'));
        if !valid {
            return Err("invalid scheme");
        }
    }
    Ok(())
}

impl FromStr for UriRef {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for UriRef {
    type Error = EventError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<String> for UriRef {
    type Error = EventError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate(&value).map_err(|reason| EventError::BadUriRef {
            value: value.clone(),
            reason: reason.to_string(),
        })?;
        Ok(Self(value))
    }
}

impl AsRef<str> for UriRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UriRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for UriRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UriRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::try_from(s).map_err(serde::de::Error::custom)
    }
}
