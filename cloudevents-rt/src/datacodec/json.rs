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

//! JSON data codec.

use super::{APPLICATION_JSON, DataCodec, DataCodecError, unquote_base64};

/// JSON data codec for `application/json`, `text/json`, `*+json` and the
/// empty media type.
///
/// A payload that is a JSON string holding base64 is decoded to its inner
/// bytes first; if those bytes do not decode, the payload is decoded as is.
///
/// # Examples
///
/// ```rust
/// use cloudevents_rt::datacodec::{DataCodec, JsonCodec};
/// use std::collections::BTreeMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let codec = JsonCodec::default();
/// // base64 of {"a":"b"}
/// let map: BTreeMap<String, String> = codec.decode(br#""eyJhIjoiYiJ9""#)?;
/// assert_eq!(map["a"], "b");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    /// Creates a codec producing compact JSON.
    #[must_use]
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Produces indented JSON.
    #[must_use]
    pub fn with_pretty_print(mut self) -> Self {
        self.pretty = true;
        self
    }
}

impl DataCodec for JsonCodec {
    fn encode<T>(&self, value: &T) -> Result<Vec<u8>, DataCodecError>
    where
        T: serde::Serialize + ?Sized,
    {
        let result = if self.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        };
        result.map_err(|e| DataCodecError::encode(APPLICATION_JSON, e))
    }

    fn decode<T>(&self, bytes: &[u8]) -> Result<T, DataCodecError>
    where
        T: serde::de::DeserializeOwned,
    {
        if let Some(inner) = unquote_base64(bytes) {
            if let Ok(value) = serde_json::from_slice(&inner) {
                return Ok(value);
            }
        }
        serde_json::from_slice(bytes).map_err(|e| DataCodecError::decode(APPLICATION_JSON, e))
    }

    fn name(&self) -> &'static str {
        APPLICATION_JSON
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        id: u32,
        message: String,
    }

    #[test]
    fn test_json_codec_struct() {
        let codec = JsonCodec::new();
        let sample = Sample {
            id: 123,
            message: "hi".to_string(),
        };
        let bytes = codec.encode(&sample).unwrap();
        assert_eq!(bytes, br#"{"id":123,"message":"hi"}"#);
        let back: Sample = codec.decode(&bytes).unwrap();
        assert_eq!(back, sample);
    }

    #[test]
    fn test_plain_string_payload_falls_back() {
        let codec = JsonCodec::new();
        let s: String = codec.decode(br#""not base64!""#).unwrap();
        assert_eq!(s, "not base64!");
    }

    #[test]
    fn test_base64_string_that_is_not_json_falls_back() {
        let codec = JsonCodec::new();
        // "aGVsbG8=" is base64 of "hello", which is not JSON.
        let s: String = codec.decode(br#""aGVsbG8=""#).unwrap();
        assert_eq!(s, "aGVsbG8=");
    }

    #[test]
    fn test_malformed_json() {
        let codec = JsonCodec::new();
        let err = codec.decode::<Sample>(b"{not json").unwrap_err();
        assert!(matches!(err, DataCodecError::Decode { .. }));
    }

    #[test]
    fn test_pretty_print() {
        let codec = JsonCodec::new().with_pretty_print();
        let bytes = codec.encode(&serde_json::json!({"a": 1})).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "{\n  \"a\": 1\n}");
    }
}
