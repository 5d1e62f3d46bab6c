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

use super::{DataCodec, DataCodecError, TEXT_PLAIN};
use crate::types::format_value;
use serde_json::Value;

/// UTF-8 text codec for `text/*` media types.
///
/// Strings are written verbatim; other values use their canonical string
/// form. Decoding yields the text as a JSON string, so any type that
/// deserializes from a string can be the target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextCodec;

impl DataCodec for TextCodec {
    fn encode<T>(&self, value: &T) -> Result<Vec<u8>, DataCodecError>
    where
        T: serde::Serialize + ?Sized,
    {
        let value = serde_json::to_value(value).map_err(|e| DataCodecError::encode(TEXT_PLAIN, e))?;
        Ok(format_value(&value).into_bytes())
    }

    fn decode<T>(&self, bytes: &[u8]) -> Result<T, DataCodecError>
    where
        T: serde::de::DeserializeOwned,
    {
        let text = std::str::from_utf8(bytes).map_err(|e| DataCodecError::decode(TEXT_PLAIN, e))?;
        serde_json::from_value(Value::String(text.to_string()))
            .map_err(|e| DataCodecError::decode(TEXT_PLAIN, e))
    }

    fn name(&self) -> &'static str {
        TEXT_PLAIN
    }
}
