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
    EventContextReader, EventContextWriter, Extensions, is_valid_extension_key, non_zero,
    parse_optional_uri,
};
use super::{EventContextV03, EventError, SpecVersion};
use crate::types::{Timestamp, UriRef, format_value};
use serde_json::Value;

/// Context attributes of a CloudEvents 1.0 event.
///
/// Extension values are always strings: setting a non-string value stores
/// its canonical string form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventContextV1 {
    /// `id`
    pub id: String,
    /// `source`
    pub source: UriRef,
    /// `type`
    pub ty: String,
    /// `datacontenttype`
    pub data_content_type: Option<String>,
    /// `dataschema`
    pub data_schema: Option<UriRef>,
    /// `subject`
    pub subject: Option<String>,
    /// `time`
    pub time: Option<Timestamp>,
    /// Flat extension attributes, string values only
    pub extensions: Extensions,
}

impl EventContextV1 {
    /// Converts to a 0.3 context. `dataschema` becomes `schemaurl`.
    #[must_use]
    pub fn as_v03(&self) -> EventContextV03 {
        EventContextV03 {
            id: self.id.clone(),
            source: self.source.clone(),
            ty: self.ty.clone(),
            data_content_type: self.data_content_type.clone(),
            data_content_encoding: None,
            schema_url: self.data_schema.clone(),
            subject: self.subject.clone(),
            time: self.time,
            extensions: self.extensions.clone(),
        }
    }
}

impl EventContextReader for EventContextV1 {
    fn spec_version(&self) -> SpecVersion {
        SpecVersion::V10
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
        self.data_schema.as_ref()
    }

    fn data_content_type(&self) -> Option<&str> {
        self.data_content_type.as_deref()
    }

    fn data_content_encoding(&self) -> Option<&str> {
        None
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
            version: SpecVersion::V10,
        };
        if self.id.trim().is_empty() {
            return Err(missing("id"));
        }
        if self.source.is_empty() {
            return Err(missing("source"));
        }
        if self.ty.trim().is_empty() {
            return Err(missing("type"));
        }
        if matches!(&self.data_content_type, Some(ct) if ct.trim().is_empty()) {
            return Err(EventError::InvalidAttribute {
                attribute: "datacontenttype",
                reason: "if present, MUST be a non-empty string".to_string(),
            });
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

impl EventContextWriter for EventContextV1 {
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
        self.data_schema = parse_optional_uri(schema)?;
        Ok(())
    }

    fn set_data_content_type(&mut self, content_type: Option<&str>) {
        self.data_content_type = content_type.map(str::to_string);
    }

    fn set_data_content_encoding(&mut self, encoding: Option<&str>) -> Result<(), EventError> {
        match encoding {
            None => Ok(()),
            Some(_) => Err(EventError::UnsupportedAttribute {
                attribute: "datacontentencoding",
                version: SpecVersion::V10,
            }),
        }
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
            self.extensions
                .insert(key, Value::String(format_value(&value)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_values_become_strings() {
        let mut ctx = EventContextV1::default();
        ctx.set_extension("flag", Value::from(true)).unwrap();
        ctx.set_extension("nested", serde_json::json!({"a": 1})).unwrap();
        assert_eq!(ctx.extension("flag"), Some(&Value::from("true")));
        assert_eq!(ctx.extension("nested"), Some(&Value::from(r#"{"a":1}"#)));
    }

    #[test]
    fn test_rejects_content_encoding() {
        let mut ctx = EventContextV1::default();
        assert!(ctx.set_data_content_encoding(Some("base64")).is_err());
        assert!(ctx.set_data_content_encoding(None).is_ok());
    }

    #[test]
    fn test_schema_maps_to_schemaurl() {
        let ctx = EventContextV1 {
            data_schema: Some(UriRef::parse("http://example.com/s").unwrap()),
            ..Default::default()
        };
        assert_eq!(
            ctx.as_v03().schema_url.as_ref().map(UriRef::as_str),
            Some("http://example.com/s")
        );
    }

    #[test]
    fn test_validate_requires_id_first() {
        let err = EventContextV1::default().validate().unwrap_err();
        assert_eq!(
            err,
            EventError::MissingAttribute {
                attribute: "id",
                version: SpecVersion::V10
            }
        );
    }
}
