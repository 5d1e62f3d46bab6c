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

//! Data codecs, one per media type.
//!
//! The data codec converts between in-memory values and the bytes of an
//! event's `datacontenttype`. Codecs are looked up by media type:
//!
//! | Media type                                          | Codec         |
//! |-----------------------------------------------------|---------------|
//! | empty, `application/json`, `text/json`, `*+json`    | [`JsonCodec`] |
//! | `application/xml`, `text/xml`, `*+xml`              | [`XmlCodec`] (feature `xml`) |
//! | any other `text/*`                                  | [`TextCodec`] |
//!
//! Anything else is [`DataCodecError::UnsupportedContentType`]. Parameters
//! such as `; charset=utf-8` are ignored and matching is case-insensitive.
//!
//! # Examples
//!
//! ```rust
//! use cloudevents_rt::datacodec;
//! use std::collections::BTreeMap;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = datacodec::encode("application/json", &BTreeMap::from([("k", "v")]))?;
//! let back: BTreeMap<String, String> = datacodec::decode("application/json; charset=utf-8", &bytes)?;
//! assert_eq!(back["k"], "v");
//!
//! assert!(datacodec::lookup("image/png").is_err());
//! # Ok(())
//! # }
//! ```

mod error;
mod json;
mod text;
mod traits;
#[cfg(feature = "xml")]
mod xml;

pub use self::error::DataCodecError;
pub use self::json::JsonCodec;
pub use self::text::TextCodec;
pub use self::traits::DataCodec;
#[cfg(feature = "xml")]
pub use self::xml::XmlCodec;

use crate::observability::{self, Measure};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// `application/json`
pub const APPLICATION_JSON: &str = "application/json";
/// `text/json`
pub const TEXT_JSON: &str = "text/json";
/// `application/xml`
pub const APPLICATION_XML: &str = "application/xml";
/// `text/xml`
pub const TEXT_XML: &str = "text/xml";
/// `text/plain`
pub const TEXT_PLAIN: &str = "text/plain";

/// A registered codec, selected by media type.
#[derive(Clone, Debug)]
pub enum MediaCodec {
    /// JSON
    Json(JsonCodec),
    /// XML
    #[cfg(feature = "xml")]
    Xml(XmlCodec),
    /// UTF-8 text
    Text(TextCodec),
}

/// Returns the codec registered for `media_type`.
///
/// # Errors
///
/// Returns [`DataCodecError::UnsupportedContentType`] when no codec matches.
pub fn lookup(media_type: &str) -> Result<MediaCodec, DataCodecError> {
    let media = crate::event::media_type(media_type);
    match media.as_str() {
        "" | APPLICATION_JSON | TEXT_JSON => Ok(MediaCodec::Json(JsonCodec::new())),
        m if m.ends_with("+json") => Ok(MediaCodec::Json(JsonCodec::new())),
        #[cfg(feature = "xml")]
        APPLICATION_XML | TEXT_XML => Ok(MediaCodec::Xml(XmlCodec::new())),
        #[cfg(feature = "xml")]
        m if m.ends_with("+xml") => Ok(MediaCodec::Xml(XmlCodec::new())),
        m if m.starts_with("text/") && m != TEXT_XML => Ok(MediaCodec::Text(TextCodec)),
        _ => Err(DataCodecError::UnsupportedContentType {
            content_type: media_type.to_string(),
        }),
    }
}

impl DataCodec for MediaCodec {
    fn encode<T>(&self, value: &T) -> Result<Vec<u8>, DataCodecError>
    where
        T: serde::Serialize + ?Sized,
    {
        match self {
            Self::Json(c) => c.encode(value),
            #[cfg(feature = "xml")]
            Self::Xml(c) => c.encode(value),
            Self::Text(c) => c.encode(value),
        }
    }

    fn decode<T>(&self, bytes: &[u8]) -> Result<T, DataCodecError>
    where
        T: serde::de::DeserializeOwned,
    {
        match self {
            Self::Json(c) => c.decode(bytes),
            #[cfg(feature = "xml")]
            Self::Xml(c) => c.decode(bytes),
            Self::Text(c) => c.decode(bytes),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Json(c) => c.name(),
            #[cfg(feature = "xml")]
            Self::Xml(c) => c.name(),
            Self::Text(c) => c.name(),
        }
    }
}

/// Encodes `value` with the codec for `media_type`.
///
/// # Errors
///
/// Returns lookup or encode errors.
pub fn encode<T>(media_type: &str, value: &T) -> Result<Vec<u8>, DataCodecError>
where
    T: serde::Serialize + ?Sized,
{
    let reporter = observability::report(Measure::DataCodec, "encode");
    let result = lookup(media_type).and_then(|codec| codec.encode(value));
    reporter.result(&result);
    result
}

/// Decodes `bytes` with the codec for `media_type`.
///
/// # Errors
///
/// Returns lookup or decode errors.
pub fn decode<T>(media_type: &str, bytes: &[u8]) -> Result<T, DataCodecError>
where
    T: serde::de::DeserializeOwned,
{
    let reporter = observability::report(Measure::DataCodec, "decode");
    let result = lookup(media_type).and_then(|codec| codec.decode(bytes));
    reporter.result(&result);
    result
}

/// Decodes `bytes`, yielding a freshly allocated `T::default()` for an
/// empty payload.
///
/// # Errors
///
/// Returns lookup or decode errors for non-empty payloads.
pub fn decode_or_default<T>(media_type: &str, bytes: &[u8]) -> Result<T, DataCodecError>
where
    T: serde::de::DeserializeOwned + Default,
{
    if bytes.iter().all(u8::is_ascii_whitespace) {
        lookup(media_type)?;
        return Ok(crate::types::allocate());
    }
    decode(media_type, bytes)
}

/// Returns the decoded bytes when `bytes` is a JSON string holding base64.
pub(crate) fn unquote_base64(bytes: &[u8]) -> Option<Vec<u8>> {
    if bytes.first() != Some(&b'"') {
        return None;
    }
    let text: String = serde_json::from_slice(bytes).ok()?;
    STANDARD.decode(text).ok()
}
