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

use serde_json::Value;

/// The payload of an event.
///
/// A [`Data::Value`] is an in-memory value that is encoded by the data codec
/// for the event's media type when the event goes on the wire. A
/// [`Data::Bytes`] payload is already in the wire media type; received events
/// always carry bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    /// A value still to be encoded
    Value(Value),
    /// Bytes in the event's media type
    Bytes(Vec<u8>),
}

impl Data {
    /// Returns `true` if the payload is already encoded.
    #[must_use]
    pub fn is_bytes(&self) -> bool {
        matches!(self, Self::Bytes(_))
    }

    /// Returns the encoded bytes, if any.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            Self::Value(_) => None,
        }
    }

    /// Returns the unencoded value, if any.
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::Bytes(_) => None,
        }
    }
}

impl From<Vec<u8>> for Data {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for Data {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl From<Value> for Data {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}
