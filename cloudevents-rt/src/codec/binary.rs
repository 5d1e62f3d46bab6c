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

//! Binary encoding.
//!
//! Context attributes become transport metadata and the payload becomes
//! the body. This module produces and consumes [`BinaryParts`]: attribute
//! names lowercased and without any transport prefix, the data content type
//! (which every transport carries in its own content-type slot) and the
//! body. Each transport maps the parts onto its wire, adding `ce-` or
//! whatever its binding requires.
//!
//! Extension values that are maps are flattened with `-` as delimiter, so
//! `{"asmap": {"a": "1"}}` becomes the attribute `asmap-a: 1`, and
//! reassembled on decode. Version 0.1 prefixes extension attributes with
//! `x-`.

use super::CodecError;
use super::attributes::{self, Attr};
use crate::event::{
    Event, EventContext, EventContextReader, EventContextWriter, SpecVersion,
};
use crate::types::format_value;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const V01_EXTENSION_PREFIX: &str = "x-";

/// An event split into binary-mode parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinaryParts {
    /// Lowercase attribute names without transport prefix, string values
    pub attributes: BTreeMap<String, String>,
    /// The data content type
    pub content_type: Option<String>,
    /// The payload
    pub body: Vec<u8>,
}

impl BinaryParts {
    /// Returns the specversion attribute, under its 0.1 name if needed.
    #[must_use]
    pub fn spec_version(&self) -> Option<&str> {
        self.attributes
            .get("specversion")
            .or_else(|| self.attributes.get("cloudeventsversion"))
            .map(String::as_str)
    }
}

/// Splits an event into binary parts.
///
/// # Errors
///
/// Returns [`CodecError::BadExtensionFlatten`] when a flattened extension
/// collides with another attribute, and data codec errors when the payload
/// cannot be encoded.
pub fn encode_binary(event: &Event) -> Result<BinaryParts, CodecError> {
    let version = event.spec_version();
    let ctx = event.context();
    let mut parts = BinaryParts {
        content_type: event.data_content_type().map(str::to_string),
        ..Default::default()
    };

    for &(name, attr) in attributes::table(version) {
        if attr == Attr::DataContentType {
            continue;
        }
        if let Some(value) = attributes::read(ctx, attr) {
            parts.attributes.insert(name.to_ascii_lowercase(), value);
        }
    }

    let prefix = if version == SpecVersion::V01 {
        V01_EXTENSION_PREFIX
    } else {
        ""
    };
    for (key, value) in ctx.extensions() {
        flatten(
            &format!("{prefix}{}", key.to_ascii_lowercase()),
            value,
            &mut parts.attributes,
        )?;
    }

    let data = event.encoded_data()?.unwrap_or_default();
    parts.body = if version != SpecVersion::V10 && event.is_base64() {
        STANDARD.encode(&data).into_bytes()
    } else {
        data
    };
    Ok(parts)
}

fn flatten(
    key: &str,
    value: &Value,
    out: &mut BTreeMap<String, String>,
) -> Result<(), CodecError> {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (k, v) in map {
                flatten(&format!("{key}-{}", k.to_ascii_lowercase()), v, out)?;
            }
            Ok(())
        }
        other => match out.insert(key.to_string(), format_value(other)) {
            None => Ok(()),
            Some(_) => Err(CodecError::BadExtensionFlatten {
                key: key.to_string(),
                reason: "attribute already present".to_string(),
            }),
        },
    }
}

/// Reassembles an event from binary parts.
///
/// # Errors
///
/// Returns [`CodecError::EncodingUnknown`] without a specversion,
/// [`CodecError::UnsupportedSpecVersion`] for an unknown one,
/// [`CodecError::BadExtensionFlatten`] for inconsistent flattened keys, and
/// event errors for invalid attribute values.
pub fn decode_binary(parts: BinaryParts) -> Result<Event, CodecError> {
    let BinaryParts {
        mut attributes,
        content_type,
        body,
    } = parts;
    let version_text = attributes
        .remove("specversion")
        .or_else(|| attributes.remove("cloudeventsversion"))
        .ok_or_else(|| CodecError::EncodingUnknown {
            version: "unknown".to_string(),
            transport: "binary".to_string(),
        })?;
    let version: SpecVersion = version_text
        .parse()
        .map_err(|_| CodecError::UnsupportedSpecVersion {
            version: version_text.clone(),
        })?;

    let mut ctx = EventContext::new(version);
    for &(name, attr) in attributes::table(version) {
        if matches!(attr, Attr::SpecVersion | Attr::DataContentType) {
            continue;
        }
        if let Some(value) = attributes.remove(&name.to_ascii_lowercase()) {
            attributes::write(&mut ctx, attr, &value)?;
        }
    }
    if let Some(ct) = content_type.as_deref().filter(|ct| !ct.is_empty()) {
        ctx.set_data_content_type(Some(ct));
    }

    let remaining = attributes.into_iter().map(|(k, v)| {
        let key = match (version, k.strip_prefix(V01_EXTENSION_PREFIX)) {
            (SpecVersion::V01, Some(stripped)) => stripped.to_string(),
            _ => k,
        };
        (key, v)
    });
    for (key, value) in unflatten(remaining)? {
        ctx.set_extension(&key, value)?;
    }

    let mut event = Event::from_context(ctx);
    if !body.is_empty() {
        let data = if version != SpecVersion::V10 && event.is_base64() {
            let text = String::from_utf8_lossy(&body);
            STANDARD.decode(text.trim())?
        } else {
            body
        };
        event.set_data_bytes(data);
    }
    Ok(event)
}

fn unflatten(
    attributes: impl Iterator<Item = (String, String)>,
) -> Result<Map<String, Value>, CodecError> {
    let mut root = Map::new();
    for (key, value) in attributes {
        let mut parts = key.split('-').peekable();
        let mut node = &mut root;
        let mut path = String::new();
        while let Some(part) = parts.next() {
            if !path.is_empty() {
                path.push('-');
            }
            path.push_str(part);
            if parts.peek().is_none() {
                if node.contains_key(part) {
                    return Err(CodecError::BadExtensionFlatten {
                        key: key.clone(),
                        reason: format!("{path} is both a value and a map"),
                    });
                }
                node.insert(part.to_string(), Value::String(value.clone()));
                break;
            }
            let child = node
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            node = match child {
                Value::Object(map) => map,
                _ => {
                    return Err(CodecError::BadExtensionFlatten {
                        key: key.clone(),
                        reason: format!("{path} is both a value and a map"),
                    });
                }
            };
        }
    }
    Ok(root)
}
