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

use crate::event::EventError;
use serde::Serialize;
use serde_json::Value;

/// Formats an attribute value as its canonical string.
///
/// Strings pass through unquoted, numbers use their decimal form and
/// booleans become `true`/`false`. Anything else, including timestamps and
/// URIs, uses its serialized form: a JSON string is unquoted and compound
/// values fall back to JSON text.
///
/// # Errors
///
/// Returns [`EventError::InvalidAttribute`] if `value` has no JSON form,
/// for example a map with non-string keys.
///
/// # Examples
///
/// ```rust
/// use cloudevents_rt::types::format;
///
/// assert_eq!(format(&"abc").unwrap(), "abc");
/// assert_eq!(format(&42).unwrap(), "42");
/// assert_eq!(format(&true).unwrap(), "true");
/// assert_eq!(format(&vec![1, 2]).unwrap(), "[1,2]");
/// ```
pub fn format<T: Serialize + ?Sized>(value: &T) -> Result<String, EventError> {
    let value = serde_json::to_value(value).map_err(|e| EventError::InvalidAttribute {
        attribute: "extension",
        reason: e.to_string(),
    })?;
    Ok(format_value(&value))
}

/// Formats an already converted JSON value, see [`format`].
#[must_use]
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Returns a fresh zero value to decode into.
///
/// The data codec decodes into `T::default()` when no caller supplied
/// target exists, so missing payloads yield an empty value rather than an
/// error.
#[must_use]
pub fn allocate<T: Default>() -> T {
    T::default()
}
