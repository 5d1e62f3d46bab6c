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

//! Event codec error types.

use crate::datacodec::DataCodecError;
use crate::event::EventError;
use thiserror::Error;

/// Errors raised while encoding or decoding whole events.
///
/// # Examples
///
/// ```rust
/// use cloudevents_rt::codec::{CodecError, decode_structured};
///
/// let err = decode_structured(b"[1, 2]").unwrap_err();
/// assert!(matches!(err, CodecError::MalformedStructuredBody { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// The encoding is not supported by the transport, or an inbound
    /// message could not be classified.
    #[error("encoding unknown for specversion {version} on transport {transport}")]
    EncodingUnknown {
        /// Version, or `unknown` when none was found
        version: String,
        /// Transport name
        transport: String,
    },

    /// The message names a specversion the codec does not implement.
    #[error("unsupported specversion {version:?}")]
    UnsupportedSpecVersion {
        /// The version text found on the wire
        version: String,
    },

    /// A structured body is not a well-formed event document.
    #[error("malformed structured body: {reason}")]
    MalformedStructuredBody {
        /// What was wrong with it
        reason: String,
    },

    /// Binary attributes are not a well-formed event.
    #[error("malformed binary message: {reason}")]
    MalformedBinary {
        /// What was wrong with it
        reason: String,
    },

    /// Flattened extension attributes do not form a consistent map.
    #[error("bad extension flatten at {key:?}: {reason}")]
    BadExtensionFlatten {
        /// The offending attribute key
        key: String,
        /// What conflicted
        reason: String,
    },

    /// The event itself is invalid.
    #[error(transparent)]
    Event(#[from] EventError),

    /// The payload could not be encoded or decoded.
    #[error(transparent)]
    DataCodec(#[from] DataCodecError),

    /// Base64 data was malformed.
    #[error("bad base64 data: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl CodecError {
    pub(crate) fn structured(reason: impl Into<String>) -> Self {
        Self::MalformedStructuredBody {
            reason: reason.into(),
        }
    }

    pub(crate) fn binary(reason: impl Into<String>) -> Self {
        Self::MalformedBinary {
            reason: reason.into(),
        }
    }

    /// Returns `true` when the message was not recognized as a CloudEvent
    /// at all, as opposed to a recognized but broken one.
    #[must_use]
    pub fn is_unrecognized(&self) -> bool {
        matches!(
            self,
            Self::EncodingUnknown { .. } | Self::UnsupportedSpecVersion { .. }
        )
    }
}
