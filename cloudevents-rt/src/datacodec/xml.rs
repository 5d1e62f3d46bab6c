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

//! XML data codec.

use super::{APPLICATION_XML, DataCodec, DataCodecError, unquote_base64};

/// XML data codec for `application/xml`, `text/xml` and `*+xml`.
///
/// Values are written under a root element, `<data>` unless configured
/// otherwise. Base64-quoted payloads are unwrapped before decoding.
///
/// # Examples
///
/// ```rust
/// use cloudevents_rt::datacodec::{DataCodec, XmlCodec};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Point { x: i32, y: i32 }
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let codec = XmlCodec::default();
/// let bytes = codec.encode(&Point { x: 1, y: 2 })?;
/// assert_eq!(bytes, b"<data><x>1</x><y>2</y></data>");
/// let back: Point = codec.decode(&bytes)?;
/// assert_eq!(back, Point { x: 1, y: 2 });
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct XmlCodec {
    root: &'static str,
}

impl XmlCodec {
    /// Creates a codec writing a `<data>` root element.
    #[must_use]
    pub fn new() -> Self {
        Self { root: "data" }
    }

    /// Uses a different root element name when encoding.
    #[must_use]
    pub fn with_root(mut self, root: &'static str) -> Self {
        self.root = root;
        self
    }
}

impl Default for XmlCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl DataCodec for XmlCodec {
    fn encode<T>(&self, value: &T) -> Result<Vec<u8>, DataCodecError>
    where
        T: serde::Serialize + ?Sized,
    {
        quick_xml::se::to_string_with_root(self.root, value)
            .map(String::into_bytes)
            .map_err(|e| DataCodecError::encode(APPLICATION_XML, e))
    }

    fn decode<T>(&self, bytes: &[u8]) -> Result<T, DataCodecError>
    where
        T: serde::de::DeserializeOwned,
    {
        let owned;
        let bytes = match unquote_base64(bytes) {
            Some(inner) => {
                owned = inner;
                owned.as_slice()
            }
            None => bytes,
        };
        let text =
            std::str::from_utf8(bytes).map_err(|e| DataCodecError::decode(APPLICATION_XML, e))?;
        quick_xml::de::from_str(text).map_err(|e| DataCodecError::decode(APPLICATION_XML, e))
    }

    fn name(&self) -> &'static str {
        APPLICATION_XML
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        message: String,
    }

    #[test]
    fn test_xml_custom_root() {
        let codec = XmlCodec::new().with_root("event");
        let bytes = codec
            .encode(&Sample {
                message: "hi".to_string(),
            })
            .unwrap();
        assert_eq!(bytes, b"<event><message>hi</message></event>");
    }

    #[test]
    fn test_xml_base64_quoted() {
        use base64::Engine;
        let inner = b"<data><message>hi</message></data>";
        let quoted = format!(
            "\"{}\"",
            base64::engine::general_purpose::STANDARD.encode(inner)
        );
        let back: Sample = XmlCodec::new().decode(quoted.as_bytes()).unwrap();
        assert_eq!(back.message, "hi");
    }

    #[test]
    fn test_xml_malformed() {
        let err = XmlCodec::new().decode::<Sample>(b"<data><message>").unwrap_err();
        assert!(matches!(err, DataCodecError::Decode { .. }));
    }
}
