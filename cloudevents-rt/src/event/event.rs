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

use super::context::{BASE64, EventContextReader, EventContextWriter, Extensions};
use super::{Data, EventContext, EventError, SpecVersion};
use crate::datacodec::{self, DataCodecError};
use crate::types::{Timestamp, UriRef, format_value};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// A CloudEvent: a version-specific context plus an optional payload.
///
/// # Examples
///
/// ```rust
/// use cloudevents_rt::event::{Event, SpecVersion};
/// use std::collections::BTreeMap;
///
/// let mut event = Event::new(SpecVersion::V10);
/// event.set_id("ABC-123");
/// event.set_type("unit.test.client.sent");
/// event.set_source("/unit/test/client").unwrap();
/// event.set_data_with("application/json", &BTreeMap::from([("hello", "unittest")])).unwrap();
/// assert!(event.validate().is_ok());
///
/// let back: BTreeMap<String, String> = event.data_as().unwrap();
/// assert_eq!(back["hello"], "unittest");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    context: EventContext,
    data: Option<Data>,
    data_base64: bool,
}

impl Event {
    /// Creates an empty event of the given version.
    #[must_use]
    pub fn new(version: SpecVersion) -> Self {
        Self::from_context(EventContext::new(version))
    }

    /// Creates an event without data from a context.
    #[must_use]
    pub fn from_context(context: impl Into<EventContext>) -> Self {
        Self {
            context: context.into(),
            data: None,
            data_base64: false,
        }
    }

    /// Returns the context.
    #[must_use]
    pub fn context(&self) -> &EventContext {
        &self.context
    }

    /// Returns the context for modification.
    pub fn context_mut(&mut self) -> &mut EventContext {
        &mut self.context
    }

    /// Splits the event into its context and data.
    #[must_use]
    pub fn into_parts(self) -> (EventContext, Option<Data>) {
        (self.context, self.data)
    }

    /// Returns the specification version.
    #[must_use]
    pub fn spec_version(&self) -> SpecVersion {
        self.context.spec_version()
    }

    /// Returns the event id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.context.id()
    }

    /// Returns the event type.
    #[must_use]
    pub fn ty(&self) -> &str {
        self.context.ty()
    }

    /// Returns the event source.
    #[must_use]
    pub fn source(&self) -> &UriRef {
        self.context.source()
    }

    /// Returns the event time.
    #[must_use]
    pub fn time(&self) -> Option<&Timestamp> {
        self.context.time()
    }

    /// Returns the subject.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.context.subject()
    }

    /// Returns the data schema.
    #[must_use]
    pub fn data_schema(&self) -> Option<&UriRef> {
        self.context.data_schema()
    }

    /// Returns the full data content type.
    #[must_use]
    pub fn data_content_type(&self) -> Option<&str> {
        self.context.data_content_type()
    }

    /// Returns the data media type without parameters.
    #[must_use]
    pub fn data_media_type(&self) -> Option<String> {
        self.context.data_media_type()
    }

    /// Returns the data content encoding.
    #[must_use]
    pub fn data_content_encoding(&self) -> Option<&str> {
        self.context.data_content_encoding()
    }

    /// Returns all extensions.
    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        self.context.extensions()
    }

    /// Returns one extension.
    #[must_use]
    pub fn extension(&self, name: &str) -> Option<&Value> {
        self.context.extension(name)
    }

    /// Decodes an extension into `T`.
    ///
    /// String values that hold JSON text are parsed, so a `1.0` extension
    /// set from a number reads back as that number.
    ///
    /// # Errors
    ///
    /// Returns [`DataCodecError::Decode`] if the value does not fit `T`.
    pub fn extension_as<T: DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<Option<T>, DataCodecError> {
        let Some(value) = self.extension(name) else {
            return Ok(None);
        };
        if let Ok(direct) = serde_json::from_value::<T>(value.clone()) {
            return Ok(Some(direct));
        }
        match value {
            Value::String(text) => serde_json::from_str(text)
                .map(Some)
                .map_err(|e| DataCodecError::decode("extension", e)),
            other => serde_json::from_value(other.clone())
                .map(Some)
                .map_err(|e| DataCodecError::decode("extension", e)),
        }
    }

    /// Sets the event id.
    pub fn set_id(&mut self, id: impl AsRef<str>) {
        self.context.set_id(id.as_ref());
    }

    /// Sets the event type.
    pub fn set_type(&mut self, ty: impl AsRef<str>) {
        self.context.set_type(ty.as_ref());
    }

    /// Sets the event source.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::BadUriRef`] for an invalid reference.
    pub fn set_source(&mut self, source: impl AsRef<str>) -> Result<(), EventError> {
        self.context.set_source(source.as_ref())
    }

    /// Sets or clears the event time.
    pub fn set_time(&mut self, time: impl Into<Option<Timestamp>>) {
        self.context.set_time(time.into());
    }

    /// Sets or clears the subject.
    pub fn set_subject(&mut self, subject: Option<&str>) {
        self.context.set_subject(subject);
    }

    /// Sets or clears the data schema.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::BadUriRef`] for an invalid reference.
    pub fn set_data_schema(&mut self, schema: Option<&str>) -> Result<(), EventError> {
        self.context.set_data_schema(schema)
    }

    /// Sets or clears the data content type.
    pub fn set_data_content_type(&mut self, content_type: Option<&str>) {
        self.context.set_data_content_type(content_type);
    }

    /// Sets or clears the data content encoding.
    ///
    /// On a 1.0 event `base64` toggles the `data_base64` form instead of an
    /// attribute.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::UnsupportedAttribute`] for any other encoding
    /// on a 1.0 event.
    pub fn set_data_content_encoding(&mut self, encoding: Option<&str>) -> Result<(), EventError> {
        if self.spec_version() == SpecVersion::V10 {
            return match encoding {
                None => {
                    self.data_base64 = false;
                    Ok(())
                }
                Some(e) if e.eq_ignore_ascii_case(BASE64) => {
                    self.data_base64 = true;
                    Ok(())
                }
                Some(_) => self.context.set_data_content_encoding(encoding),
            };
        }
        self.context.set_data_content_encoding(encoding)
    }

    /// Sets an extension. A `null` value removes it.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::BadExtensionKey`] when the key is not allowed
    /// by the event's version.
    pub fn set_extension<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
    ) -> Result<(), EventError> {
        let value = serde_json::to_value(value).map_err(|e| EventError::InvalidAttribute {
            attribute: "extension",
            reason: e.to_string(),
        })?;
        self.context.set_extension(key, value)
    }

    /// Returns the payload.
    #[must_use]
    pub fn data(&self) -> Option<&Data> {
        self.data.as_ref()
    }

    /// Returns the payload bytes when the payload is already encoded.
    #[must_use]
    pub fn data_bytes(&self) -> Option<&[u8]> {
        self.data.as_ref().and_then(Data::as_bytes)
    }

    /// Removes and returns the payload.
    pub fn take_data(&mut self) -> Option<Data> {
        self.data.take()
    }

    /// Returns `true` when the payload holds wire-ready bytes.
    #[must_use]
    pub fn data_encoded(&self) -> bool {
        self.data.as_ref().is_some_and(Data::is_bytes)
    }

    /// Returns `true` when the payload travels base64 encoded.
    #[must_use]
    pub fn is_base64(&self) -> bool {
        self.data_base64
            || self
                .data_content_encoding()
                .is_some_and(|e| e.eq_ignore_ascii_case(BASE64))
    }

    /// Stores a value to be encoded on send.
    ///
    /// The value is kept in its JSON form and encoded for the event's media
    /// type later, so a `Vec<u8>` or `&[u8]` becomes a JSON array of numbers.
    /// Use [`Event::set_data_bytes`] for a payload that is already encoded.
    ///
    /// # Errors
    ///
    /// Returns [`DataCodecError::Encode`] if the value cannot be represented.
    pub fn set_data<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), DataCodecError> {
        let value =
            serde_json::to_value(value).map_err(|e| DataCodecError::encode("application/json", e))?;
        self.data = Some(Data::Value(value));
        Ok(())
    }

    /// Sets the content type and stores a value.
    ///
    /// # Errors
    ///
    /// See [`Event::set_data`].
    pub fn set_data_with<T: Serialize + ?Sized>(
        &mut self,
        content_type: &str,
        value: &T,
    ) -> Result<(), DataCodecError> {
        self.set_data_content_type(Some(content_type));
        self.set_data(value)
    }

    /// Stores bytes that are already in the event's media type.
    ///
    /// The bytes are sent as-is and [`Event::data_encoded`] reports `true`.
    pub fn set_data_bytes(&mut self, bytes: impl Into<Vec<u8>>) {
        self.data = Some(Data::Bytes(bytes.into()));
    }

    /// Replaces the payload wholesale.
    pub fn set_payload(&mut self, data: Option<Data>) {
        self.data = data;
    }

    /// Returns the payload encoded for the event's media type.
    ///
    /// # Errors
    ///
    /// Returns data codec errors for an unsupported media type or a value
    /// the codec cannot encode.
    pub fn encoded_data(&self) -> Result<Option<Vec<u8>>, DataCodecError> {
        match &self.data {
            None => Ok(None),
            Some(Data::Bytes(b)) => Ok(Some(b.clone())),
            Some(Data::Value(v)) => {
                let media = self.data_media_type().unwrap_or_default();
                datacodec::encode(&media, v).map(Some)
            }
        }
    }

    /// Decodes the payload into `T` using the event's media type.
    ///
    /// # Errors
    ///
    /// Returns [`DataCodecError::NoData`] when the event has no payload and
    /// codec errors when the payload does not decode.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, DataCodecError> {
        match &self.data {
            None => Err(DataCodecError::NoData),
            Some(Data::Value(v)) => serde_json::from_value(v.clone())
                .map_err(|e| DataCodecError::decode("application/json", e)),
            Some(Data::Bytes(b)) => {
                let media = self.data_media_type().unwrap_or_default();
                datacodec::decode(&media, b)
            }
        }
    }

    /// Decodes the payload, yielding `T::default()` when there is none.
    ///
    /// # Errors
    ///
    /// Returns codec errors when a present payload does not decode.
    pub fn data_as_or_default<T: DeserializeOwned + Default>(&self) -> Result<T, DataCodecError> {
        match &self.data {
            None => Ok(crate::types::allocate()),
            Some(Data::Bytes(b)) => {
                let media = self.data_media_type().unwrap_or_default();
                datacodec::decode_or_default(&media, b)
            }
            Some(Data::Value(_)) => self.data_as(),
        }
    }

    /// Returns a copy of this event converted to another version.
    ///
    /// A `base64` content encoding becomes the 1.0 `data_base64` form when
    /// the payload is bytes, and `data_base64` becomes
    /// `datacontentencoding: base64` going down.
    #[must_use]
    pub fn convert_to(&self, version: SpecVersion) -> Event {
        let mut context = self.context.to_version(version);
        let base64 = self.is_base64();
        let data_base64 = if version == SpecVersion::V10 {
            base64 && self.data_encoded()
        } else {
            if base64 {
                // Only the 1.0 context refuses this attribute.
                let _ = context.set_data_content_encoding(Some(BASE64));
            }
            false
        };
        Event {
            context,
            data: self.data.clone(),
            data_base64,
        }
    }

    /// Validates the event against its version rules.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<(), EventError> {
        self.context.validate()
    }
}

impl From<EventContext> for Event {
    fn from(value: EventContext) -> Self {
        Self::from_context(value)
    }
}

fn attribute_names(version: SpecVersion) -> [&'static str; 8] {
    match version {
        SpecVersion::V01 => [
            "cloudEventsVersion",
            "eventType",
            "source",
            "eventID",
            "eventTime",
            "schemaURL",
            "contentType",
            "subject",
        ],
        SpecVersion::V02 => [
            "specversion",
            "type",
            "source",
            "id",
            "time",
            "schemaurl",
            "contenttype",
            "subject",
        ],
        SpecVersion::V03 => [
            "specversion",
            "type",
            "source",
            "id",
            "time",
            "schemaurl",
            "datacontenttype",
            "subject",
        ],
        SpecVersion::V10 => [
            "specversion",
            "type",
            "source",
            "id",
            "time",
            "dataschema",
            "datacontenttype",
            "subject",
        ],
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.validate() {
            Ok(()) => writeln!(f, "Validation: valid")?,
            Err(e) => writeln!(f, "Validation: invalid\nValidation Error: \n{e}")?,
        }

        let version = self.spec_version();
        let [sv, ty, source, id, time, schema, content_type, subject] = attribute_names(version);
        writeln!(f, "Context Attributes,")?;
        writeln!(f, "  {sv}: {version}")?;
        writeln!(f, "  {ty}: {}", self.ty())?;
        writeln!(f, "  {source}: {}", self.source())?;
        if version >= SpecVersion::V03 {
            if let Some(s) = self.subject() {
                writeln!(f, "  {subject}: {s}")?;
            }
        }
        writeln!(f, "  {id}: {}", self.id())?;
        if let Some(t) = self.time() {
            writeln!(f, "  {time}: {t}")?;
        }
        if let Some(s) = self.data_schema() {
            writeln!(f, "  {schema}: {s}")?;
        }
        if let Some(ct) = self.data_content_type() {
            writeln!(f, "  {content_type}: {ct}")?;
        }
        if version == SpecVersion::V03 {
            if let Some(e) = self.data_content_encoding() {
                writeln!(f, "  datacontentencoding: {e}")?;
            }
        }
        if let EventContext::V01(c) = &self.context {
            if let Some(etv) = &c.event_type_version {
                writeln!(f, "  eventTypeVersion: {etv}")?;
            }
        }

        if !self.extensions().is_empty() {
            writeln!(f, "Extensions,")?;
            for (k, v) in self.extensions() {
                writeln!(f, "  {k}: {}", format_value(v))?;
            }
        }

        if let Some(data) = &self.data {
            writeln!(f, "Data,")?;
            match data {
                Data::Value(v) => {
                    let pretty = serde_json::to_string_pretty(v).map_err(|_| fmt::Error)?;
                    for line in pretty.lines() {
                        writeln!(f, "  {line}")?;
                    }
                }
                Data::Bytes(b) => writeln!(f, "  {}", String::from_utf8_lossy(b))?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample(version: SpecVersion) -> Event {
        let mut event = Event::new(version);
        event.set_id("ABC-123");
        event.set_type("unit.test.client.sent");
        event.set_source("/unit/test/client").unwrap();
        event.set_subject(Some("resource"));
        event
            .set_data_with("application/json", &BTreeMap::from([("hello", "unittest")]))
            .unwrap();
        event
    }

    #[test]
    fn test_set_data_value_is_not_encoded() {
        let event = sample(SpecVersion::V10);
        assert!(!event.data_encoded());
        assert_eq!(
            event.encoded_data().unwrap().unwrap(),
            br#"{"hello":"unittest"}"#.to_vec()
        );
    }

    #[test]
    fn test_set_data_bytes_is_encoded() {
        let mut event = sample(SpecVersion::V10);
        event.set_data_bytes(br#"{"hello":"bytes"}"#.to_vec());
        assert!(event.data_encoded());
        let map: BTreeMap<String, String> = event.data_as().unwrap();
        assert_eq!(map["hello"], "bytes");
    }

    #[test]
    fn test_bytes_through_set_data_are_a_json_array() {
        let mut event = sample(SpecVersion::V10);
        event.set_data(&b"hi"[..]).unwrap();
        assert!(!event.data_encoded());
        assert_eq!(event.encoded_data().unwrap().unwrap(), b"[104,105]".to_vec());

        event.set_data_bytes(&b"hi"[..]);
        assert_eq!(event.data_bytes(), Some(&b"hi"[..]));
        assert_eq!(event.encoded_data().unwrap().unwrap(), b"hi".to_vec());
    }

    #[test]
    fn test_data_as_without_payload() {
        let event = Event::new(SpecVersion::V10);
        assert!(matches!(
            event.data_as::<String>(),
            Err(DataCodecError::NoData)
        ));
        let empty: BTreeMap<String, String> = event.data_as_or_default().unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_extension_as_parses_string_json() {
        let mut event = sample(SpecVersion::V10);
        event.set_extension("count", &42).unwrap();
        assert_eq!(event.extension("count"), Some(&Value::from("42")));
        assert_eq!(event.extension_as::<i64>("count").unwrap(), Some(42));
        assert_eq!(event.extension_as::<i64>("missing").unwrap(), None);
        event.set_extension("word", "abc").unwrap();
        assert_eq!(
            event.extension_as::<String>("word").unwrap().as_deref(),
            Some("abc")
        );
        assert!(event.extension_as::<i64>("word").is_err());
    }

    #[test]
    fn test_base64_carried_to_v1_and_back() {
        let mut event = sample(SpecVersion::V03);
        event.set_data_bytes(b"raw".to_vec());
        event.set_data_content_encoding(Some("base64")).unwrap();
        let v1 = event.convert_to(SpecVersion::V10);
        assert!(v1.is_base64());
        assert_eq!(v1.data_content_encoding(), None);
        let v03 = v1.convert_to(SpecVersion::V03);
        assert_eq!(v03.data_content_encoding(), Some("base64"));
        assert_eq!(v03.data_bytes(), Some(&b"raw"[..]));
    }

    #[test]
    fn test_base64_not_carried_for_values() {
        let mut event = sample(SpecVersion::V03);
        event.set_data_content_encoding(Some("base64")).unwrap();
        assert!(!event.convert_to(SpecVersion::V10).is_base64());
    }

    #[test]
    fn test_display_sections() {
        let mut event = sample(SpecVersion::V10);
        event.set_extension("zeta", "z").unwrap();
        event.set_extension("alpha", "a").unwrap();
        let text = event.to_string();
        assert!(text.starts_with("Validation: valid\nContext Attributes,\n  specversion: 1.0\n"));
        assert!(text.contains("  subject: resource\n"));
        let alpha = text.find("  alpha: a").unwrap();
        let zeta = text.find("  zeta: z").unwrap();
        assert!(alpha < zeta);
        assert!(text.contains("Data,\n  {\n    \"hello\": \"unittest\"\n  }\n"));
    }

    #[test]
    fn test_display_invalid() {
        let text = Event::new(SpecVersion::V02).to_string();
        assert!(text.starts_with("Validation: invalid\n"));
    }
}
