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

//! Version-polymorphic event context.
//!
//! Each specification version has its own context struct. [`EventContext`]
//! is the tagged variant over them and implements the common
//! [`EventContextReader`] and [`EventContextWriter`] accessors by delegating
//! to the active variant.

use super::{
    EventContextV01, EventContextV02, EventContextV03, EventContextV1, EventError, SpecVersion,
};
use crate::types::{Timestamp, UriRef};
use serde_json::Value;
use std::collections::BTreeMap;

/// Extension map carried by every context.
pub type Extensions = BTreeMap<String, Value>;

/// Well-known extension holding `subject` in versions without the attribute.
pub(crate) const SUBJECT_EXTENSION: &str = "subject";
/// Well-known extension holding `datacontentencoding` in versions without the attribute.
pub(crate) const CONTENT_ENCODING_EXTENSION: &str = "datacontentencoding";
/// Extension holding the V0.1 `eventTypeVersion` attribute in later versions.
pub(crate) const EVENT_TYPE_VERSION_EXTENSION: &str = "eventTypeVersion";

/// The only `datacontentencoding` value the runtime understands.
pub const BASE64: &str = "base64";

/// Read access to the logical attributes of a context.
///
/// Every accessor returns the logical attribute regardless of the version's
/// spelling. Attributes a version does not define are looked up in its
/// extensions.
pub trait EventContextReader {
    /// Returns the specification version.
    fn spec_version(&self) -> SpecVersion;
    /// Returns the event type.
    fn ty(&self) -> &str;
    /// Returns the event id.
    fn id(&self) -> &str;
    /// Returns the event source.
    fn source(&self) -> &UriRef;
    /// Returns the event time, if set.
    fn time(&self) -> Option<&Timestamp>;
    /// Returns the data schema (`schemaurl` before 1.0), if set.
    fn data_schema(&self) -> Option<&UriRef>;
    /// Returns the full content type of the data, if set.
    fn data_content_type(&self) -> Option<&str>;
    /// Returns the content encoding of the data, if set.
    fn data_content_encoding(&self) -> Option<&str>;
    /// Returns the subject, if set.
    fn subject(&self) -> Option<&str>;
    /// Returns all extensions.
    fn extensions(&self) -> &Extensions;
    /// Validates the context against its version rules.
    ///
    /// # Errors
    ///
    /// Returns the first rule violation found.
    fn validate(&self) -> Result<(), EventError>;

    /// Returns the media type of the data without parameters, lowercased.
    fn data_media_type(&self) -> Option<String> {
        self.data_content_type().map(media_type)
    }

    /// Returns a single extension.
    fn extension(&self, name: &str) -> Option<&Value> {
        self.extensions().get(name)
    }
}

/// Write access to the logical attributes of a context.
pub trait EventContextWriter {
    /// Sets the event type.
    fn set_type(&mut self, ty: &str);
    /// Sets the event id.
    fn set_id(&mut self, id: &str);
    /// Sets the event source.
    ///
    /// # Errors
    ///
    /// Returns an error if `source` is not a URI-reference.
    fn set_source(&mut self, source: &str) -> Result<(), EventError>;
    /// Sets or clears the event time. A zero timestamp clears it.
    fn set_time(&mut self, time: Option<Timestamp>);
    /// Sets or clears the data schema.
    ///
    /// # Errors
    ///
    /// Returns an error if `schema` is not a URI-reference.
    fn set_data_schema(&mut self, schema: Option<&str>) -> Result<(), EventError>;
    /// Sets or clears the data content type.
    fn set_data_content_type(&mut self, content_type: Option<&str>);
    /// Sets or clears the data content encoding.
    ///
    /// # Errors
    ///
    /// Versions without the attribute may reject it.
    fn set_data_content_encoding(&mut self, encoding: Option<&str>) -> Result<(), EventError>;
    /// Sets or clears the subject.
    fn set_subject(&mut self, subject: Option<&str>);
    /// Sets an extension. `Value::Null` removes it.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::BadExtensionKey`] when the version requires
    /// lowercase alphanumeric keys and `key` is not one.
    fn set_extension(&mut self, key: &str, value: Value) -> Result<(), EventError>;
}

/// Returns `true` if `key` matches `[a-z0-9]+`.
#[must_use]
pub fn is_valid_extension_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

pub(crate) fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

pub(crate) fn parse_optional_uri(value: Option<&str>) -> Result<Option<UriRef>, EventError> {
    value.map(UriRef::parse).transpose()
}

pub(crate) fn non_zero(time: Option<Timestamp>) -> Option<Timestamp> {
    time.filter(|t| !t.is_zero())
}

pub(crate) fn set_or_remove(extensions: &mut Extensions, key: &str, value: Option<&str>) {
    match value {
        Some(v) => {
            extensions.insert(key.to_string(), Value::String(v.to_string()));
        }
        None => {
            extensions.remove(key);
        }
    }
}

/// A context of any supported specification version.
#[derive(Debug, Clone, PartialEq)]
pub enum EventContext {
    /// CloudEvents 0.1 context
    V01(EventContextV01),
    /// CloudEvents 0.2 context
    V02(EventContextV02),
    /// CloudEvents 0.3 context
    V03(EventContextV03),
    /// CloudEvents 1.0 context
    V1(EventContextV1),
}

macro_rules! delegate {
    ($self:ident, $ctx:ident => $body:expr) => {
        match $self {
            EventContext::V01($ctx) => $body,
            EventContext::V02($ctx) => $body,
            EventContext::V03($ctx) => $body,
            EventContext::V1($ctx) => $body,
        }
    };
}

impl EventContext {
    /// Creates an empty context of the given version.
    #[must_use]
    pub fn new(version: SpecVersion) -> Self {
        match version {
            SpecVersion::V01 => Self::V01(EventContextV01::default()),
            SpecVersion::V02 => Self::V02(EventContextV02::default()),
            SpecVersion::V03 => Self::V03(EventContextV03::default()),
            SpecVersion::V10 => Self::V1(EventContextV1::default()),
        }
    }

    /// Views the context as CloudEvents 0.1.
    #[must_use]
    pub fn as_v01(&self) -> EventContextV01 {
        match self {
            Self::V01(c) => c.clone(),
            Self::V02(c) => c.as_v01(),
            Self::V03(c) => c.as_v02().as_v01(),
            Self::V1(c) => c.as_v03().as_v02().as_v01(),
        }
    }

    /// Views the context as CloudEvents 0.2.
    #[must_use]
    pub fn as_v02(&self) -> EventContextV02 {
        match self {
            Self::V01(c) => c.as_v02(),
            Self::V02(c) => c.clone(),
            Self::V03(c) => c.as_v02(),
            Self::V1(c) => c.as_v03().as_v02(),
        }
    }

    /// Views the context as CloudEvents 0.3.
    #[must_use]
    pub fn as_v03(&self) -> EventContextV03 {
        match self {
            Self::V01(c) => c.as_v02().as_v03(),
            Self::V02(c) => c.as_v03(),
            Self::V03(c) => c.clone(),
            Self::V1(c) => c.as_v03(),
        }
    }

    /// Views the context as CloudEvents 1.0.
    #[must_use]
    pub fn as_v1(&self) -> EventContextV1 {
        match self {
            Self::V01(c) => c.as_v02().as_v03().as_v1(),
            Self::V02(c) => c.as_v03().as_v1(),
            Self::V03(c) => c.as_v1(),
            Self::V1(c) => c.clone(),
        }
    }

    /// Converts the context to another version.
    #[must_use]
    pub fn to_version(&self, version: SpecVersion) -> Self {
        match version {
            SpecVersion::V01 => Self::V01(self.as_v01()),
            SpecVersion::V02 => Self::V02(self.as_v02()),
            SpecVersion::V03 => Self::V03(self.as_v03()),
            SpecVersion::V10 => Self::V1(self.as_v1()),
        }
    }
}

impl Default for EventContext {
    fn default() -> Self {
        Self::new(SpecVersion::default())
    }
}

impl EventContextReader for EventContext {
    fn spec_version(&self) -> SpecVersion {
        delegate!(self, c => c.spec_version())
    }

    fn ty(&self) -> &str {
        delegate!(self, c => c.ty())
    }

    fn id(&self) -> &str {
        delegate!(self, c => c.id())
    }

    fn source(&self) -> &UriRef {
        delegate!(self, c => c.source())
    }

    fn time(&self) -> Option<&Timestamp> {
        delegate!(self, c => c.time())
    }

    fn data_schema(&self) -> Option<&UriRef> {
        delegate!(self, c => c.data_schema())
    }

    fn data_content_type(&self) -> Option<&str> {
        delegate!(self, c => c.data_content_type())
    }

    fn data_content_encoding(&self) -> Option<&str> {
        delegate!(self, c => c.data_content_encoding())
    }

    fn subject(&self) -> Option<&str> {
        delegate!(self, c => c.subject())
    }

    fn extensions(&self) -> &Extensions {
        delegate!(self, c => c.extensions())
    }

    fn validate(&self) -> Result<(), EventError> {
        delegate!(self, c => c.validate())
    }
}

impl EventContextWriter for EventContext {
    fn set_type(&mut self, ty: &str) {
        delegate!(self, c => c.set_type(ty))
    }

    fn set_id(&mut self, id: &str) {
        delegate!(self, c => c.set_id(id))
    }

    fn set_source(&mut self, source: &str) -> Result<(), EventError> {
        delegate!(self, c => c.set_source(source))
    }

    fn set_time(&mut self, time: Option<Timestamp>) {
        delegate!(self, c => c.set_time(time))
    }

    fn set_data_schema(&mut self, schema: Option<&str>) -> Result<(), EventError> {
        delegate!(self, c => c.set_data_schema(schema))
    }

    fn set_data_content_type(&mut self, content_type: Option<&str>) {
        delegate!(self, c => c.set_data_content_type(content_type))
    }

    fn set_data_content_encoding(&mut self, encoding: Option<&str>) -> Result<(), EventError> {
        delegate!(self, c => c.set_data_content_encoding(encoding))
    }

    fn set_subject(&mut self, subject: Option<&str>) {
        delegate!(self, c => c.set_subject(subject))
    }

    fn set_extension(&mut self, key: &str, value: Value) -> Result<(), EventError> {
        delegate!(self, c => c.set_extension(key, value))
    }
}

impl From<EventContextV01> for EventContext {
    fn from(value: EventContextV01) -> Self {
        Self::V01(value)
    }
}

impl From<EventContextV02> for EventContext {
    fn from(value: EventContextV02) -> Self {
        Self::V02(value)
    }
}

impl From<EventContextV03> for EventContext {
    fn from(value: EventContextV03) -> Self {
        Self::V03(value)
    }
}

impl From<EventContextV1> for EventContext {
    fn from(value: EventContextV1) -> Self {
        Self::V1(value)
    }
}
