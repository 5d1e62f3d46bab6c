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

//! Data codec trait definition.

use super::DataCodecError;

/// Converts between in-memory values and the bytes of one media type.
///
/// Implementations must be thread-safe; the registry hands out shared
/// instances.
///
/// # Examples
///
/// ```rust
/// use cloudevents_rt::datacodec::{DataCodec, JsonCodec};
/// use std::collections::BTreeMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let codec = JsonCodec::default();
/// let bytes = codec.encode(&BTreeMap::from([("hello", "world")]))?;
/// assert_eq!(bytes, br#"{"hello":"world"}"#);
///
/// let back: BTreeMap<String, String> = codec.decode(&bytes)?;
/// assert_eq!(back["hello"], "world");
/// # Ok(())
/// # }
/// ```
pub trait DataCodec: Send + Sync + 'static {
    /// Encodes a value.
    ///
    /// # Errors
    ///
    /// Returns [`DataCodecError::Encode`] if the value has no representation
    /// in the media type.
    fn encode<T>(&self, value: &T) -> Result<Vec<u8>, DataCodecError>
    where
        T: serde::Serialize + ?Sized;

    /// Decodes bytes into a fresh value.
    ///
    /// # Errors
    ///
    /// Returns [`DataCodecError::Decode`] if the bytes are malformed or do
    /// not fit `T`.
    fn decode<T>(&self, bytes: &[u8]) -> Result<T, DataCodecError>
    where
        T: serde::de::DeserializeOwned;

    /// Returns the canonical media type handled by the codec.
    fn name(&self) -> &'static str;
}
