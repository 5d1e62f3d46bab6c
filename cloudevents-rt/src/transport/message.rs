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

//! Inbound message abstraction.

use super::TransportContext;
use crate::codec::{BinaryParts, CodecError};

/// Prefix of binary-mode attribute headers on HTTP, Kafka and Pub/Sub.
pub const ATTRIBUTE_PREFIX: &str = "ce-";

/// A message as received from a wire, before decoding.
///
/// Converters get the raw message when the codec rejects it.
pub trait Message: Send + Sync {
    /// Declared content type of the body.
    fn content_type(&self) -> Option<String>;

    /// The raw body.
    fn body(&self) -> &[u8];

    /// Extracts binary-mode attributes with the transport prefix removed.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MalformedBinary`] when metadata cannot be read
    /// as attributes.
    fn binary_parts(&self) -> Result<BinaryParts, CodecError>;

    /// Wire details to expose to the handler.
    fn transport_context(&self) -> Option<TransportContext> {
        None
    }
}

/// Collects `ce-` prefixed headers into binary parts.
///
/// Header names match case-insensitively and are lowercased.
pub(crate) fn parts_from_headers<'a>(
    headers: impl IntoIterator<Item = (&'a str, &'a [u8])>,
    content_type: Option<String>,
    body: &[u8],
) -> Result<BinaryParts, CodecError> {
    let mut parts = BinaryParts {
        content_type,
        body: body.to_vec(),
        ..Default::default()
    };
    for (name, value) in headers {
        let name = name.to_ascii_lowercase();
        let Some(attribute) = name.strip_prefix(ATTRIBUTE_PREFIX) else {
            continue;
        };
        let value = std::str::from_utf8(value)
            .map_err(|_| CodecError::binary(format!("header {name} is not UTF-8")))?;
        parts
            .attributes
            .insert(attribute.to_string(), value.to_string());
    }
    Ok(parts)
}

/// Renders binary attributes as `ce-` prefixed header pairs.
pub(crate) fn headers_from_parts(parts: &BinaryParts) -> impl Iterator<Item = (String, &str)> {
    parts
        .attributes
        .iter()
        .map(|(name, value)| (format!("{ATTRIBUTE_PREFIX}{name}"), value.as_str()))
}
