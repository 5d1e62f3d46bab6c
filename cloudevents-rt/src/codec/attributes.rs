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

//! Per-version attribute spelling.
//!
//! The structured form uses the names as listed; the binary form uses them
//! lowercased. Attributes missing from a version's table (such as `subject`
//! before 0.3) travel as extensions.

use super::CodecError;
use crate::event::{EventContext, EventContextReader, EventContextWriter, SpecVersion};
use crate::types::Timestamp;

/// Logical context attributes with a fixed wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Attr {
    SpecVersion,
    Id,
    Type,
    Source,
    Time,
    DataSchema,
    DataContentType,
    DataContentEncoding,
    Subject,
    EventTypeVersion,
}

const V01: &[(&str, Attr)] = &[
    ("cloudEventsVersion", Attr::SpecVersion),
    ("eventType", Attr::Type),
    ("eventTypeVersion", Attr::EventTypeVersion),
    ("source", Attr::Source),
    ("eventID", Attr::Id),
    ("eventTime", Attr::Time),
    ("schemaURL", Attr::DataSchema),
    ("contentType", Attr::DataContentType),
];

const V02: &[(&str, Attr)] = &[
    ("specversion", Attr::SpecVersion),
    ("type", Attr::Type),
    ("source", Attr::Source),
    ("id", Attr::Id),
    ("time", Attr::Time),
    ("schemaurl", Attr::DataSchema),
    ("contenttype", Attr::DataContentType),
];

const V03: &[(&str, Attr)] = &[
    ("specversion", Attr::SpecVersion),
    ("type", Attr::Type),
    ("source", Attr::Source),
    ("id", Attr::Id),
    ("time", Attr::Time),
    ("schemaurl", Attr::DataSchema),
    ("datacontenttype", Attr::DataContentType),
    ("datacontentencoding", Attr::DataContentEncoding),
    ("subject", Attr::Subject),
];

const V10: &[(&str, Attr)] = &[
    ("specversion", Attr::SpecVersion),
    ("id", Attr::Id),
    ("source", Attr::Source),
    ("type", Attr::Type),
    ("datacontenttype", Attr::DataContentType),
    ("dataschema", Attr::DataSchema),
    ("subject", Attr::Subject),
    ("time", Attr::Time),
];

/// Returns the attribute table of a version.
pub(crate) fn table(version: SpecVersion) -> &'static [(&'static str, Attr)] {
    match version {
        SpecVersion::V01 => V01,
        SpecVersion::V02 => V02,
        SpecVersion::V03 => V03,
        SpecVersion::V10 => V10,
    }
}

/// Structured-form name of the specversion attribute.
pub(crate) fn spec_version_name(version: SpecVersion) -> &'static str {
    match version {
        SpecVersion::V01 => "cloudEventsVersion",
        _ => "specversion",
    }
}

/// Returns `true` if `name` is a context attribute of `version`.
pub(crate) fn is_reserved(version: SpecVersion, name: &str) -> bool {
    table(version)
        .iter()
        .any(|(n, _)| n.eq_ignore_ascii_case(name))
        || matches!(name, "data" | "data_base64")
        || (version == SpecVersion::V01 && name == "extensions")
}

/// Reads an attribute as its wire string.
pub(crate) fn read(ctx: &EventContext, attr: Attr) -> Option<String> {
    match attr {
        Attr::SpecVersion => Some(ctx.spec_version().to_string()),
        Attr::Id => non_empty(ctx.id()),
        Attr::Type => non_empty(ctx.ty()),
        Attr::Source => non_empty(ctx.source().as_str()),
        Attr::Time => ctx.time().filter(|t| !t.is_zero()).map(Timestamp::format),
        Attr::DataSchema => ctx.data_schema().map(ToString::to_string),
        Attr::DataContentType => ctx.data_content_type().map(str::to_string),
        Attr::DataContentEncoding => ctx.data_content_encoding().map(str::to_string),
        Attr::Subject => ctx.subject().map(str::to_string),
        Attr::EventTypeVersion => match ctx {
            EventContext::V01(c) => c.event_type_version.clone(),
            _ => None,
        },
    }
}

/// Writes an attribute from its wire string.
pub(crate) fn write(ctx: &mut EventContext, attr: Attr, value: &str) -> Result<(), CodecError> {
    match attr {
        Attr::SpecVersion => {}
        Attr::Id => ctx.set_id(value),
        Attr::Type => ctx.set_type(value),
        Attr::Source => ctx.set_source(value)?,
        Attr::Time => ctx.set_time(Some(Timestamp::parse(value)?)),
        Attr::DataSchema => ctx.set_data_schema(Some(value))?,
        Attr::DataContentType => ctx.set_data_content_type(Some(value)),
        Attr::DataContentEncoding => ctx.set_data_content_encoding(Some(value))?,
        Attr::Subject => ctx.set_subject(Some(value)),
        Attr::EventTypeVersion => {
            if let EventContext::V01(c) = ctx {
                c.event_type_version = Some(value.to_string());
            }
        }
    }
    Ok(())
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_version_names_specversion_first() {
        for v in SpecVersion::ALL {
            let (name, attr) = table(v)[0];
            assert_eq!(attr, Attr::SpecVersion);
            assert_eq!(name, spec_version_name(v));
        }
    }

    #[test]
    fn test_reserved_names() {
        assert!(is_reserved(SpecVersion::V10, "dataschema"));
        assert!(is_reserved(SpecVersion::V10, "data_base64"));
        assert!(!is_reserved(SpecVersion::V02, "subject"));
        assert!(is_reserved(SpecVersion::V01, "extensions"));
        assert!(!is_reserved(SpecVersion::V02, "extensions"));
    }

    #[test]
    fn test_read_write_time() {
        let mut ctx = EventContext::new(SpecVersion::V02);
        write(&mut ctx, Attr::Time, "2020-04-05T17:31:00.123Z").unwrap();
        assert_eq!(
            read(&ctx, Attr::Time).as_deref(),
            Some("2020-04-05T17:31:00.123Z")
        );
    }

    #[test]
    fn test_write_bad_time() {
        let mut ctx = EventContext::new(SpecVersion::V10);
        assert!(matches!(
            write(&mut ctx, Attr::Time, "noon"),
            Err(CodecError::Event(_))
        ));
    }
}
