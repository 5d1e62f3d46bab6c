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

use super::context::{
    CONTENT_ENCODING_EXTENSION, EVENT_TYPE_VERSION_EXTENSION, EventContextReader,
    EventContextWriter, Extensions, SUBJECT_EXTENSION, non_zero, parse_optional_uri,
    set_or_remove,
};
use super::{EventContextV02, EventError, SpecVersion};
use crate::types::{Timestamp, UriRef};
use serde_json::Value;

/// Context attributes of a CloudEvents 0.1 event.
///
/// Version 0.1 has no `subject` or `datacontentencoding`; both are kept in
/// the extensions under their later names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventContextV01 {
    /// `eventID`
    pub event_id: String,
    /// `eventTime`
    pub event_time: Option<Timestamp>,
    /// `eventType`
    pub event_type: String,
    /// `eventTypeVersion`
    pub event_type_version: Option<String>,
    /// `schemaURL`
    pub schema_url: Option<UriRef>,
    /// `contentType`
    pub content_type: Option<String>,
    /// `source`
    pub source: UriRef,
    /// `extensions`, any JSON value
    pub extensions: Extensions,
}

impl EventContextV01 {
    /// Converts to a 0.2 context.
    ///
    /// `eventTypeVersion` moves into the `eventTypeVersion` extension.
    #[must_use]
    pub fn as_v02(&self) -> EventContextV02 {
        let mut extensions = self.extensions.clone();
        if let Some(etv) = &self.event_type_version {
            extensions.insert(
                EVENT_TYPE_VERSION_EXTENSION.to_string(),
                Value::String(etv.clone()),
            );
        }
        EventContextV02 {
            ty: self.event_type.clone(),
            source: self.source.clone(),
            id: self.event_id.clone(),
            time: self.event_time,
            schema_url: self.schema_url.clone(),
            content_type: self.content_type.clone(),
            extensions,
        }
    }
}

impl EventContextReader for EventContextV01 {
    fn spec_version(&self) -> SpecVersion {
        SpecVersion::V01
    }

    fn ty(&self) -> &str {
        &self.event_type
    }

    fn id(&self) -> &str {
        &self.event_id
    }

    fn source(&self) -> &UriRef {
        &self.source
    }

    fn time(&self) -> Option<&Timestamp> {
        self.event_time.as_ref()
    }

    fn data_schema(&self) -> Option<&UriRef> {
        self.schema_url.as_ref()
    }

    fn data_content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn data_content_encoding(&self) -> Option<&str> {
        self.extensions
            .get(CONTENT_ENCODING_EXTENSION)
            .and_then(Value::as_str)
    }

    fn subject(&self) -> Option<&str> {
        self.extensions.get(SUBJECT_EXTENSION).and_then(Value::as_str)
    }

    fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    fn validate(&self) -> Result<(), EventError> {
        let missing = |attribute| EventError::MissingAttribute {
            attribute,
            version: SpecVersion::V01,
        };
        if self.event_type.trim().is_empty() {
            return Err(missing("eventType"));
        }
        if self.event_id.trim().is_empty() {
            return Err(missing("eventID"));
        }
        if self.source.is_empty() {
            return Err(missing("source"));
        }
        if matches!(&self.content_type, Some(ct) if ct.trim().is_empty()) {
            return Err(EventError::InvalidAttribute {
                attribute: "contentType",
                reason: "if present, MUST be a non-empty string".to_string(),
            });
        }
        Ok(())
    }
}

impl EventContextWriter for EventContextV01 {
    fn set_type(&mut self, ty: &str) {
        self.event_type = ty.to_string();
    }

    fn set_id(&mut self, id: &str) {
        self.event_id = id.to_string();
    }

    fn set_source(&mut self, source: &str) -> Result<(), EventError> {
        self.source = UriRef::parse(source)?;
        Ok(())
    }

    fn set_time(&mut self, time: Option<Timestamp>) {
        self.event_time = non_zero(time);
    }

    fn set_data_schema(&mut self, schema: Option<&str>) -> Result<(), EventError> {
        self.schema_url = parse_optional_uri(schema)?;
        Ok(())
    }

    fn set_data_content_type(&mut self, content_type: Option<&str>) {
        self.content_type = content_type.map(str::to_string);
    }

    fn set_data_content_encoding(&mut self, encoding: Option<&str>) -> Result<(), EventError> {
        set_or_remove(&mut self.extensions, CONTENT_ENCODING_EXTENSION, encoding);
        Ok(())
    }

    fn set_subject(&mut self, subject: Option<&str>) {
        set_or_remove(&mut self.extensions, SUBJECT_EXTENSION, subject);
    }

    fn set_extension(&mut self, key: &str, value: Value) -> Result<(), EventError> {
        if value.is_null() {
            self.extensions.remove(key);
        } else {
            self.extensions.insert(key.to_string(), value);
        }
        Ok(())
    }
}
