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

//! Event codecs.
//!
//! An event travels in one of three encodings:
//!
//! | Encoding   | Attributes                 | Payload            | Content type                          |
//! |------------|----------------------------|--------------------|---------------------------------------|
//! | Binary     | transport headers          | raw message body   | the event's `datacontenttype`         |
//! | Structured | one JSON document          | inside the document| `application/cloudevents+json`        |
//! | Batched    | JSON array of documents    | inside each        | `application/cloudevents-batch+json`  |
//!
//! Outbound, a transport resolves an [`Encoding`] (per-request override,
//! then its configured encoding, then its [`EncodingSelector`]) and hands
//! the event to its [`Codec`]. Inbound, the codec classifies the message by
//! content type and dispatches to the matching decoder.
//!
//! # Examples
//!
//! ```rust
//! use cloudevents_rt::codec::{Encoding, decode_structured, encode_structured};
//! use cloudevents_rt::event::{Event, SpecVersion};
//!
//! let mut event = Event::new(SpecVersion::V10);
//! event.set_id("ABC-123");
//! event.set_type("com.example.test");
//! event.set_source("/unit/test/client").unwrap();
//!
//! let body = encode_structured(&event).unwrap();
//! assert_eq!(decode_structured(&body).unwrap().id(), "ABC-123");
//!
//! let encoding: Encoding = "structured/0.3".parse().unwrap();
//! assert_eq!(encoding, Encoding::Structured(SpecVersion::V03));
//! ```

mod attributes;
mod batch;
mod binary;
mod error;
mod structured;

pub use self::batch::{decode_batch, encode_batch};
pub use self::binary::{BinaryParts, decode_binary, encode_binary};
pub use self::error::CodecError;
pub use self::structured::{decode_structured, encode_structured, from_value, to_value};

use crate::event::{Event, SpecVersion, media_type};
use crate::observability::{Measure, report};
use crate::transport::{Message, RequestContext};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Content type of a structured JSON event.
pub const CLOUDEVENTS_JSON: &str = "application/cloudevents+json";

/// Content type of a batch of structured JSON events.
pub const CLOUDEVENTS_BATCH_JSON: &str = "application/cloudevents-batch+json";

/// How an event is laid out on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Encoding {
    /// Let the transport's selector decide
    #[default]
    Default,
    /// Attributes in transport metadata, payload as body
    Binary(SpecVersion),
    /// One JSON document
    Structured(SpecVersion),
    /// A JSON array of documents
    Batched(SpecVersion),
    /// Not a recognized encoding
    Unknown,
}

impl Encoding {
    /// Returns the specversion this encoding targets, if any.
    #[must_use]
    pub fn version(&self) -> Option<SpecVersion> {
        match self {
            Self::Binary(v) | Self::Structured(v) | Self::Batched(v) => Some(*v),
            Self::Default | Self::Unknown => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Binary(_) => "binary",
            Self::Structured(_) => "structured",
            Self::Batched(_) => "batched",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version() {
            Some(v) => write!(f, "{}/{v}", self.kind()),
            None => f.write_str(self.kind()),
        }
    }
}

impl FromStr for Encoding {
    type Err = CodecError;

    /// Parses `default`, `binary`, `structured` or `batched`, optionally
    /// followed by `/<specversion>`. A bare name targets 1.0.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (kind, version) = match s.split_once('/') {
            Some((kind, version)) => (kind, Some(version)),
            None => (s, None),
        };
        let unknown = || CodecError::EncodingUnknown {
            version: version.unwrap_or("unknown").to_string(),
            transport: "any".to_string(),
        };
        let version = match version {
            Some(v) => v.parse::<SpecVersion>().map_err(|_| unknown())?,
            None => SpecVersion::V10,
        };
        match kind.to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "binary" => Ok(Self::Binary(version)),
            "structured" => Ok(Self::Structured(version)),
            "batched" => Ok(Self::Batched(version)),
            _ => Err(unknown()),
        }
    }
}

impl TryFrom<String> for Encoding {
    type Error = CodecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Encoding> for String {
    fn from(value: Encoding) -> Self {
        value.to_string()
    }
}

/// Picks an encoding per outbound event.
pub type EncodingSelector = Arc<dyn Fn(&RequestContext, &Event) -> Encoding + Send + Sync>;

/// Selects binary encoding in the event's own specversion. This is the
/// default selector of every transport that supports binary.
#[must_use]
pub fn binary_encoding_selector() -> EncodingSelector {
    Arc::new(|_, event| Encoding::Binary(event.spec_version()))
}

/// Selects structured encoding in the event's own specversion.
#[must_use]
pub fn structured_encoding_selector() -> EncodingSelector {
    Arc::new(|_, event| Encoding::Structured(event.spec_version()))
}

/// Resolves the encoding of one outbound event.
///
/// A per-request override wins, then a non-default configured encoding,
/// then the selector.
#[must_use]
pub fn resolve_encoding(
    ctx: &RequestContext,
    configured: Encoding,
    selector: &EncodingSelector,
    event: &Event,
) -> Encoding {
    match ctx.encoding() {
        Some(encoding) if encoding != Encoding::Default => encoding,
        _ if configured != Encoding::Default => configured,
        _ => selector(ctx, event),
    }
}

/// How an inbound message is laid out, judged from its content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageEncoding {
    /// `application/cloudevents+json`
    Structured,
    /// `application/cloudevents-batch+json`
    Batched,
    /// Anything else
    Binary,
}

/// Classifies a message by its content type.
#[must_use]
pub fn classify(content_type: Option<&str>) -> MessageEncoding {
    match content_type.map(media_type).as_deref() {
        Some(CLOUDEVENTS_JSON) => MessageEncoding::Structured,
        Some(CLOUDEVENTS_BATCH_JSON) => MessageEncoding::Batched,
        _ => MessageEncoding::Binary,
    }
}

/// An encoded event, ready for a transport to put on its wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedEvent {
    /// Attributes and body for the transport to map onto metadata
    Binary(BinaryParts),
    /// A structured JSON document
    Structured(Vec<u8>),
    /// A batched JSON document
    Batched(Vec<u8>),
}

impl EncodedEvent {
    /// Returns the content type to put on the wire.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Self::Binary(parts) => parts.content_type.as_deref(),
            Self::Structured(_) => Some(CLOUDEVENTS_JSON),
            Self::Batched(_) => Some(CLOUDEVENTS_BATCH_JSON),
        }
    }
}

/// The encodings one transport supports, bound to its name.
///
/// Transports build their codec lazily and keep it for their lifetime.
#[derive(Debug, Clone)]
pub struct Codec {
    transport: &'static str,
    binary: bool,
    batched: bool,
}

impl Codec {
    /// Creates a codec supporting binary and structured encodings.
    #[must_use]
    pub fn new(transport: &'static str) -> Self {
        Self {
            transport,
            binary: true,
            batched: false,
        }
    }

    /// Creates a codec that only speaks structured JSON.
    #[must_use]
    pub fn structured_only(transport: &'static str) -> Self {
        Self {
            transport,
            binary: false,
            batched: false,
        }
    }

    /// Enables the batched encoding.
    #[must_use]
    pub fn with_batched(mut self) -> Self {
        self.batched = true;
        self
    }

    /// Returns the transport name this codec reports errors under.
    #[must_use]
    pub fn transport(&self) -> &'static str {
        self.transport
    }

    fn unknown(&self, version: impl fmt::Display) -> CodecError {
        CodecError::EncodingUnknown {
            version: version.to_string(),
            transport: self.transport.to_string(),
        }
    }

    /// Encodes an event, converting it to the encoding's specversion first.
    ///
    /// [`Encoding::Default`] encodes binary in the event's own version, or
    /// structured when binary is unsupported.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EncodingUnknown`] when the transport does not
    /// support the encoding, and any error of the selected encoder.
    pub fn encode(&self, encoding: Encoding, event: &Event) -> Result<EncodedEvent, CodecError> {
        let reporter = report(Measure::Codec, "encode");
        let encoding = match encoding {
            Encoding::Default if self.binary => Encoding::Binary(event.spec_version()),
            Encoding::Default => Encoding::Structured(event.spec_version()),
            other => other,
        };
        let result = reporter.span().in_scope(|| self.encode_as(encoding, event));
        reporter.result(&result);
        result
    }

    fn encode_as(&self, encoding: Encoding, event: &Event) -> Result<EncodedEvent, CodecError> {
        let Some(version) = encoding.version() else {
            return Err(self.unknown(event.spec_version()));
        };
        let converted;
        let event = if event.spec_version() == version {
            event
        } else {
            converted = event.convert_to(version);
            &converted
        };
        match encoding {
            Encoding::Binary(_) if self.binary => encode_binary(event).map(EncodedEvent::Binary),
            Encoding::Structured(_) => encode_structured(event).map(EncodedEvent::Structured),
            Encoding::Batched(_) if self.batched => {
                encode_batch(std::slice::from_ref(event)).map(EncodedEvent::Batched)
            }
            _ => Err(self.unknown(version)),
        }
    }

    /// Decodes an inbound message into the events it carries, in order.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EncodingUnknown`] when the message is not
    /// recognized as an event, and any error of the matching decoder.
    pub fn decode(&self, message: &dyn Message) -> Result<Vec<Event>, CodecError> {
        let reporter = report(Measure::Codec, "decode");
        let result = reporter.span().in_scope(|| self.decode_message(message));
        reporter.result(&result);
        result
    }

    fn decode_message(&self, message: &dyn Message) -> Result<Vec<Event>, CodecError> {
        let content_type = message.content_type();
        match classify(content_type.as_deref()) {
            MessageEncoding::Structured => Ok(vec![decode_structured(message.body())?]),
            MessageEncoding::Batched if self.batched => decode_batch(message.body()),
            MessageEncoding::Batched => Err(self.unknown("batch")),
            MessageEncoding::Binary if !self.binary => Err(self.unknown("unknown")),
            MessageEncoding::Binary => {
                let parts = message.binary_parts()?;
                if parts.spec_version().is_none() {
                    return Err(self.unknown("unknown"));
                }
                Ok(vec![decode_binary(parts)?])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Raw {
        content_type: Option<String>,
        body: Vec<u8>,
        parts: BinaryParts,
    }

    impl Message for Raw {
        fn content_type(&self) -> Option<String> {
            self.content_type.clone()
        }

        fn body(&self) -> &[u8] {
            &self.body
        }

        fn binary_parts(&self) -> Result<BinaryParts, CodecError> {
            Ok(self.parts.clone())
        }
    }

    fn event() -> Event {
        let mut e = Event::new(SpecVersion::V10);
        e.set_id("ABC-123");
        e.set_type("unit.test.client.sent");
        e.set_source("/unit/test/client").unwrap();
        e
    }

    #[test]
    fn test_encoding_parse_and_display() {
        assert_eq!("binary".parse::<Encoding>().unwrap(), Encoding::Binary(SpecVersion::V10));
        assert_eq!(
            "Structured/0.1".parse::<Encoding>().unwrap(),
            Encoding::Structured(SpecVersion::V01)
        );
        assert_eq!(Encoding::Batched(SpecVersion::V03).to_string(), "batched/0.3");
        assert_eq!(Encoding::Default.to_string(), "default");
        assert!("carrier-pigeon".parse::<Encoding>().is_err());
        assert!("binary/9.9".parse::<Encoding>().is_err());
    }

    #[test]
    fn test_encoding_serde() {
        let e: Encoding = serde_json::from_str(r#""binary/0.2""#).unwrap();
        assert_eq!(e, Encoding::Binary(SpecVersion::V02));
        assert_eq!(serde_json::to_string(&e).unwrap(), r#""binary/0.2""#);
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            classify(Some("application/cloudevents+json; charset=utf-8")),
            MessageEncoding::Structured
        );
        assert_eq!(
            classify(Some("Application/CloudEvents-Batch+JSON")),
            MessageEncoding::Batched
        );
        assert_eq!(classify(Some("application/json")), MessageEncoding::Binary);
        assert_eq!(classify(None), MessageEncoding::Binary);
    }

    #[test]
    fn test_resolve_order() {
        let selector = structured_encoding_selector();
        let ev = event();
        let ctx = RequestContext::new();
        assert_eq!(
            resolve_encoding(&ctx, Encoding::Default, &selector, &ev),
            Encoding::Structured(SpecVersion::V10)
        );
        assert_eq!(
            resolve_encoding(&ctx, Encoding::Binary(SpecVersion::V03), &selector, &ev),
            Encoding::Binary(SpecVersion::V03)
        );
        let ctx = ctx.with_encoding(Encoding::Batched(SpecVersion::V10));
        assert_eq!(
            resolve_encoding(&ctx, Encoding::Binary(SpecVersion::V03), &selector, &ev),
            Encoding::Batched(SpecVersion::V10)
        );
    }

    #[test]
    fn test_encode_converts_version() {
        let codec = Codec::new("test");
        let EncodedEvent::Binary(parts) =
            codec.encode(Encoding::Binary(SpecVersion::V02), &event()).unwrap()
        else {
            panic!("expected binary");
        };
        assert_eq!(parts.attributes["specversion"], "0.2");
    }

    #[test]
    fn test_structured_only_rejects_binary() {
        let codec = Codec::structured_only("nats");
        let err = codec
            .encode(Encoding::Binary(SpecVersion::V10), &event())
            .unwrap_err();
        assert_eq!(
            err,
            CodecError::EncodingUnknown {
                version: "1.0".to_string(),
                transport: "nats".to_string()
            }
        );
        assert!(matches!(
            codec.encode(Encoding::Default, &event()).unwrap(),
            EncodedEvent::Structured(_)
        ));
    }

    #[test]
    fn test_batched_requires_support() {
        let ev = event();
        assert!(Codec::new("kafka").encode(Encoding::Batched(SpecVersion::V10), &ev).is_err());
        let encoded = Codec::new("http")
            .with_batched()
            .encode(Encoding::Batched(SpecVersion::V10), &ev)
            .unwrap();
        assert_eq!(encoded.content_type(), Some(CLOUDEVENTS_BATCH_JSON));
    }

    #[test]
    fn test_decode_dispatches_on_content_type() {
        let codec = Codec::new("test");
        let structured = Raw {
            content_type: Some(CLOUDEVENTS_JSON.to_string()),
            body: encode_structured(&event()).unwrap(),
            parts: BinaryParts::default(),
        };
        assert_eq!(codec.decode(&structured).unwrap()[0].id(), "ABC-123");

        let binary = Raw {
            content_type: Some("application/json".to_string()),
            body: b"{}".to_vec(),
            parts: encode_binary(&event()).unwrap(),
        };
        assert_eq!(codec.decode(&binary).unwrap()[0].ty(), "unit.test.client.sent");

        let plain = Raw {
            content_type: Some("application/json".to_string()),
            body: br#"{"id":123}"#.to_vec(),
            parts: BinaryParts::default(),
        };
        assert!(codec.decode(&plain).unwrap_err().is_unrecognized());
    }
}
