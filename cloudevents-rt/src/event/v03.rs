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
    BASE64, CONTENT_ENCODING_EXTENSION, EventContextReader, EventContextWriter, Extensions,
    SUBJECT_EXTENSION, is_valid_extension_key, non_zero, parse_optional_uri,
};
use super::{EventContextV02, EventContextV1, EventError, SpecVersion};
use crate::types::{Timestamp, UriRef, format_value};
use serde_json::Value;

/// Context attributes of a CloudEvents 0.3 event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventContextV03 {
    /// `id`
    pub id: String,
    /// `source`
    pub source: UriRef,
    /// `type`
    pub ty: String,
    /// `datacontenttype`
    pub data_content_type: Option<String>,
    /// `datacontentencoding`
    pub data_content_encoding: Option<String>,
    /// `schemaurl`
    pub schema_url: Option<UriRef>,
    /// `subject`
    pub subject: Option<String>,
    /// `time`
    pub time: Option<Timestamp>,
    /// Flat extension attributes, any JSON value
    pub extensions: Extensions,
}

impl EventContextV03 {
    /// Converts to a 0.2 context.
    ///
    /// `subject` and `datacontentencoding` move into extensions.
    #[must_use]
    pub fn as_v02(&self) -> EventContextV02 {
        let mut extensions = self.extensions.clone();
        if let Some(subject) = &self.subject {
            extensions.insert(SUBJECT_EXTENSION.to_string(), Value::String(subject.clone()));
        }
        if let Some(encoding) = &self.data_content_encoding {
            extensions.insert(
                CONTENT_ENCODING_EXTENSION.to_string(),
                Value::String(encoding.clone()),
            );
        }
        EventContextV02 {
            ty: self.ty.clone(),
            source: self.source.clone(),
            id: self.id.clone(),
            time: self.time,
            schema_url: self.schema_url.clone(),
            content_type: self.data_content_type.clone(),
            extensions,
        }
    }

    /// Converts to a 1.0 context.
    ///
    /// `schemaurl` becomes `dataschema`, extension keys are lowercased and
    /// their values formatted as strings. `datacontentencoding` has no 1.0
    /// attribute and is dropped here; [`Event::convert_to`](super::Event::convert_to)
    /// carries it as the `data_base64` form instead.
    #[must_use]
    pub fn as_v1(&self) -> EventContextV1 {
        let extensions = self
            .extensions
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), Value::String(format_value(v))))
            .collect();
        EventContextV1 {
            id: self.id.clone(),
            source: self.source.clone(),
            ty: self.ty.clone(),
            data_content_type: self.data_content_type.clone(),
            data_schema: self.schema_url.clone(),
            subject: self.subject.clone(),
            time: self.time,
            extensions,
        }
    }
}

impl EventContextReader for EventContextV03 {
    fn spec_version(&self) -> SpecVersion {
        SpecVersion::V03
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
        self.data_content_type.as_deref()
    }

    fn data_content_encoding(&self) -> Option<&str> {
        self.data_content_encoding.as_deref()
    }

    fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    fn validate(&self) -> Result<(), EventError> {
        let missing = |attribute| EventError::MissingAttribute {
            attribute,
            version: SpecVersion::V03,
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
        if matches!(&self.data_content_type, Some(ct) if ct.trim().is_empty()) {
            return Err(EventError::InvalidAttribute {
                attribute: "datacontenttype",
                reason: "if present, MUST be a non-empty string".to_string(),
            });
        }
        if let Some(encoding) = &self.data_content_encoding {
            if !encoding.eq_ignore_ascii_case(BASE64) {
                return Err(EventError::InvalidAttribute {
                    attribute: "datacontentencoding",
                    reason: format!("unknown encoding {encoding:?}, expected \"base64\""),
                });
            }
        }
        if matches!(&self.subject, Some(s) if s.trim().is_empty()) {
            return Err(EventError::InvalidAttribute {
                attribute: "subject",
                reason: "if present, MUST be a non-empty string".to_string(),
            });
        }
        if let Some(key) = self.extensions.keys().find(|k| !is_valid_extension_key(k)) {
            return Err(EventError::BadExtensionKey { key: key.clone() });
        }
        Ok(())
    }
}

impl EventContextWriter for EventContextV03 {
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
        self.data_content_type = content_type.map(str::to_string);
    }

    fn set_data_content_encoding(&mut self, encoding: Option<&str>) -> Result<(), EventError> {
        self.data_content_encoding = encoding.map(str::to_string);
        Ok(())
    }

    fn set_subject(&mut self, subject: Option<&str>) {
        self.subject = subject.map(str::to_string);
    }

    fn set_extension(&mut self, key: &str, value: Value) -> Result<(), EventError> {
        let key = key.to_ascii_lowercase();
        if !is_valid_extension_key(&key) {
            return Err(EventError::BadExtensionKey { key });
        }
        if value.is_null() {
            self.extensions.remove(&key);
        } else {
            self.extensions.insert(key, value);
        }
        Ok(())
    }
}
