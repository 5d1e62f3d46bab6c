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
use super::{EventContextV01, EventContextV03, EventError, SpecVersion};
use crate::types::{Timestamp, UriRef};
use serde_json::Value;

/// Context attributes of a CloudEvents 0.2 event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventContextV02 {
    /// `type`
    pub ty: String,
    /// `source`
    pub source: UriRef,
    /// `id`
    pub id: String,
    /// `time`
    pub time: Option<Timestamp>,
    /// `schemaurl`
    pub schema_url: Option<UriRef>,
    /// `contenttype`
    pub content_type: Option<String>,
    /// Flat extension attributes, any JSON value
    pub extensions: Extensions,
}

impl EventContextV02 {
    /// Converts to a 0.1 context.
    ///
    /// A string `eventTypeVersion` extension (matched case-insensitively)
    /// becomes the `eventTypeVersion` attribute.
    #[must_use]
    pub fn as_v01(&self) -> EventContextV01 {
        let mut extensions = self.extensions.clone();
        let etv_key = extensions
            .iter()
            .find(|(k, v)| k.eq_ignore_ascii_case(EVENT_TYPE_VERSION_EXTENSION) && v.is_string())
            .map(|(k, _)| k.clone());
        let event_type_version = etv_key
            .and_then(|k| extensions.remove(&k))
            .and_then(|v| v.as_str().map(str::to_string));
        EventContextV01 {
            event_id: self.id.clone(),
            event_time: self.time,
            event_type: self.ty.clone(),
            event_type_version,
            schema_url: self.schema_url.clone(),
            content_type: self.content_type.clone(),
            source: self.source.clone(),
            extensions,
        }
    }

    /// Converts to a 0.3 context.
    ///
    /// String `subject` and `datacontentencoding` extensions become
    /// attributes.
    #[must_use]
    pub fn as_v03(&self) -> EventContextV03 {
        let mut extensions = self.extensions.clone();
        let mut take = |key: &str| {
            if extensions.get(key).is_some_and(Value::is_string) {
                extensions
                    .remove(key)
                    .and_then(|v| v.as_str().map(str::to_string))
            } else {
                None
            }
        };
        let subject = take(SUBJECT_EXTENSION);
        let data_content_encoding = take(CONTENT_ENCODING_EXTENSION);
        EventContextV03 {
            id: self.id.clone(),
            source: self.source.clone(),
            ty: self.ty.clone(),
            data_content_type: self.content_type.clone(),
            data_content_encoding,
            schema_url: self.schema_url.clone(),
            subject,
            time: self.time,
            extensions,
        }
    }
}

impl EventContextReader for EventContextV02 {
    fn spec_version(&self) -> SpecVersion {
        SpecVersion::V02
    }

    fn ty(&self) -> &str {
        &self.ty
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn source(&self) -> &UriRef {
        &self.source
    }

    fn time(&self) -> Option<&Timestamp> {
        self.time.as_ref()
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
            version: SpecVersion::V02,
        };
        if self.ty.trim().is_empty() {
            return Err(missing("type"));
        }
        if self.source.is_empty() {
            return Err(missing("source"));
        }
        if self.id.trim().is_empty() {
            return Err(missing("id"));
        }
        if matches!(&self.content_type, Some(ct) if ct.trim().is_empty()) {
            return Err(EventError::InvalidAttribute {
                attribute: "contenttype",
                reason: "if present, MUST be a non-empty string".to_string(),
            });
        }
        Ok(())
    }
}

impl EventContextWriter for EventContextV02 {
    fn set_type(&mut self, ty: &str) {
        self.ty = ty.to_string();
    }

    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }

    fn set_source(&mut self, source: &str) -> Result<(), EventError> {
        self.source = UriRef::parse(source)?;
        Ok(())
    }

    fn set_time(&mut self, time: Option<Timestamp>) {
        self.time = non_zero(time);
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
