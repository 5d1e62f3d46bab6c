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

//! Structured JSON encoding.
//!
//! The whole event is one JSON object with keys in sorted order. Data with
//! a JSON media type is embedded as JSON; other UTF-8 data is a string;
//! binary data and data marked base64 is the base64 text, under `data`
//! with `datacontentencoding: base64` up to 0.3 and under `data_base64` in
//! 1.0. Decoding always yields the payload as bytes.

use super::CodecError;
use super::attributes::{self, Attr};
use crate::event::{
    BASE64, Data, Event, EventContext, EventContextReader, EventContextWriter, SpecVersion,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value};

const DATA: &str = "data";
const DATA_BASE64: &str = "data_base64";
const EXTENSIONS: &str = "extensions";
const CONTENT_ENCODING: &str = "datacontentencoding";

pub(crate) fn is_json_media(media: &str) -> bool {
    matches!(media, "" | "application/json" | "text/json") || media.ends_with("+json")
}

/// Converts an event to its structured JSON object.
///
/// # Errors
///
/// Returns data codec errors when a payload value cannot be encoded.
pub fn to_value(event: &Event) -> Result<Value, CodecError> {
    let version = event.spec_version();
    let ctx = event.context();
    let mut map = Map::new();
    for &(name, attr) in attributes::table(version) {
        if let Some(value) = attributes::read(ctx, attr) {
            map.insert(name.to_string(), Value::String(value));
        }
    }

    if version == SpecVersion::V01 {
        if !ctx.extensions().is_empty() {
            let nested: Map<String, Value> = ctx
                .extensions()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            map.insert(EXTENSIONS.to_string(), Value::Object(nested));
        }
    } else {
        for (key, value) in ctx.extensions() {
            if attributes::is_reserved(version, key) {
                tracing::warn!(key, "extension shadows a context attribute, skipped");
                continue;
            }
            map.insert(key.clone(), value.clone());
        }
    }

    write_data(event, version, &mut map)?;
    Ok(Value::Object(map))
}

fn write_data(
    event: &Event,
    version: SpecVersion,
    map: &mut Map<String, Value>,
) -> Result<(), CodecError> {
    let Some(data) = event.data() else {
        return Ok(());
    };
    let media = event.data_media_type().unwrap_or_default();

    if !event.is_base64() && is_json_media(&media) {
        match data {
            Data::Value(v) => {
                map.insert(DATA.to_string(), v.clone());
                return Ok(());
            }
            Data::Bytes(b) if b.is_empty() => return Ok(()),
            Data::Bytes(b) => {
                if let Ok(v) = serde_json::from_slice::<Value>(b) {
                    map.insert(DATA.to_string(), v);
                    return Ok(());
                }
            }
        }
    }

    let bytes = event.encoded_data()?.unwrap_or_default();
    let as_text = if event.is_base64() {
        None
    } else {
        String::from_utf8(bytes.clone()).ok()
    };
    match (as_text, version) {
        (Some(text), _) => {
            map.insert(DATA.to_string(), Value::String(text));
        }
        (None, SpecVersion::V10) => {
            map.insert(DATA_BASE64.to_string(), Value::String(STANDARD.encode(&bytes)));
        }
        (None, SpecVersion::V01) => {
            map.insert(DATA.to_string(), Value::String(STANDARD.encode(&bytes)));
            let nested = map
                .entry(EXTENSIONS.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(ext) = nested {
                ext.insert(CONTENT_ENCODING.to_string(), Value::from(BASE64));
            }
        }
        (None, _) => {
            map.insert(DATA.to_string(), Value::String(STANDARD.encode(&bytes)));
            map.insert(CONTENT_ENCODING.to_string(), Value::from(BASE64));
        }
    }
    Ok(())
}

/// Builds an event from its structured JSON object.
///
/// # Errors
///
/// Returns [`CodecError::MalformedStructuredBody`] for a non-object or for
/// attributes of the wrong JSON type, and [`CodecError::UnsupportedSpecVersion`]
/// for an unknown version.
pub fn from_value(value: Value) -> Result<Event, CodecError> {
    let Value::Object(mut map) = value else {
        return Err(CodecError::structured("expected a JSON object"));
    };
    let version = detect_version(&map)?;
    let mut ctx = EventContext::new(version);

    for &(name, attr) in attributes::table(version) {
        let Some(value) = map.remove(name) else {
            continue;
        };
        if attr == Attr::SpecVersion {
            continue;
        }
        match value {
            Value::String(s) => attributes::write(&mut ctx, attr, &s)?,
            Value::Null => {}
            other => {
                return Err(CodecError::structured(format!(
                    "attribute {name} must be a string, found {other}"
                )));
            }
        }
    }

    let data = map.remove(DATA);
    let data_base64 = map.remove(DATA_BASE64);

    if version == SpecVersion::V01 {
        match map.remove(EXTENSIONS) {
            Some(Value::Object(ext)) => {
                for (k, v) in ext {
                    ctx.set_extension(&k, v)?;
                }
            }
            Some(Value::Null) | None => {}
            Some(_) => return Err(CodecError::structured("extensions must be an object")),
        }
    } else {
        for (k, v) in map {
            ctx.set_extension(&k, v)?;
        }
    }

    let mut event = Event::from_context(ctx);
    if let Some(encoded) = data_base64 {
        let Value::String(text) = encoded else {
            return Err(CodecError::structured("data_base64 must be a string"));
        };
        event.set_data_bytes(STANDARD.decode(text)?);
        event.set_data_content_encoding(Some(BASE64))?;
    } else if let Some(data) = data {
        let bytes = if event.is_base64() {
            let Value::String(text) = data else {
                return Err(CodecError::structured("base64 data must be a string"));
            };
            STANDARD.decode(text)?
        } else {
            let media = event.data_media_type().unwrap_or_default();
            match data {
                Value::String(text) if !is_json_media(&media) => text.into_bytes(),
                other => serde_json::to_vec(&other)
                    .map_err(|e| CodecError::structured(e.to_string()))?,
            }
        };
        event.set_data_bytes(bytes);
    }
    Ok(event)
}

fn detect_version(map: &Map<String, Value>) -> Result<SpecVersion, CodecError> {
    let found = map
        .get("specversion")
        .or_else(|| map.get("cloudEventsVersion"));
    match found {
        Some(Value::String(v)) => v.parse().map_err(|_| CodecError::UnsupportedSpecVersion {
            version: v.clone(),
        }),
        Some(other) => Err(CodecError::structured(format!(
            "specversion must be a string, found {other}"
        ))),
        None => Err(CodecError::structured("missing specversion")),
    }
}

/// Encodes an event as a structured JSON document.
///
/// # Errors
///
/// See [`to_value`].
pub fn encode_structured(event: &Event) -> Result<Vec<u8>, CodecError> {
    let value = to_value(event)?;
    serde_json::to_vec(&value).map_err(|e| CodecError::structured(e.to_string()))
}

/// Decodes a structured JSON document.
///
/// # Errors
///
/// See [`from_value`]; also fails for bodies that are not JSON.
pub fn decode_structured(body: &[u8]) -> Result<Event, CodecError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| CodecError::structured(e.to_string()))?;
    from_value(value)
}
