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

//! Batched JSON encoding: a JSON array of structured events.

use super::CodecError;
use super::structured::{from_value, to_value};
use crate::event::Event;
use serde_json::Value;

/// Encodes events as one batched JSON document.
///
/// # Errors
///
/// Returns the first per-event encoding error.
pub fn encode_batch(events: &[Event]) -> Result<Vec<u8>, CodecError> {
    let items = events.iter().map(to_value).collect::<Result<Vec<_>, _>>()?;
    serde_json::to_vec(&Value::Array(items)).map_err(|e| CodecError::structured(e.to_string()))
}

/// Decodes a batched JSON document, preserving order.
///
/// # Errors
///
/// Returns [`CodecError::MalformedStructuredBody`] if the body is not a
/// JSON array, or the first per-event decoding error.
pub fn decode_batch(body: &[u8]) -> Result<Vec<Event>, CodecError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| CodecError::structured(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(CodecError::structured("batch must be a JSON array"));
    };
    items.into_iter().map(from_value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SpecVersion;

    fn event(id: &str, version: SpecVersion) -> Event {
        let mut e = Event::new(version);
        e.set_id(id);
        e.set_type("t");
        e.set_source("/s").unwrap();
        e
    }

    #[test]
    fn test_batch_mixed_versions_in_order() {
        let events = vec![
            event("1", SpecVersion::V10),
            event("2", SpecVersion::V03),
            event("3", SpecVersion::V01),
        ];
        let body = encode_batch(&events).unwrap();
        let back = decode_batch(&body).unwrap();
        let ids: Vec<_> = back.iter().map(Event::id).collect();
        assert_eq!(ids, ["1", "2", "3"]);
        assert_eq!(back[2].spec_version(), SpecVersion::V01);
    }

    #[test]
    fn test_empty_batch() {
        assert_eq!(encode_batch(&[]).unwrap(), b"[]");
        assert!(decode_batch(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_batch_requires_array() {
        assert!(matches!(
            decode_batch(br#"{"specversion":"1.0"}"#),
            Err(CodecError::MalformedStructuredBody { .. })
        ));
    }
}
