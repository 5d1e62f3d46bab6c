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

//! Data codec error types.

use std::fmt;
use thiserror::Error;

/// Errors raised while encoding or decoding event data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataCodecError {
    /// No codec is registered for the media type.
    #[error("unsupported content type {content_type:?}")]
    UnsupportedContentType {
        /// The media type that was looked up
        content_type: String,
    },

    /// A value could not be encoded.
    #[error("failed to encode {media_type} data: {reason}")]
    Encode {
        /// The target media type
        media_type: String,
        /// Codec message
        reason: String,
    },

    /// Bytes could not be decoded into the requested type.
    #[error("failed to decode {media_type} data: {reason}")]
    Decode {
        /// The source media type
        media_type: String,
        /// Codec message
        reason: String,
    },

    /// The event carries no data.
    #[error("event has no data")]
    NoData,
}

impl DataCodecError {
    /// Creates an [`DataCodecError::Encode`] error.
    pub fn encode(media_type: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Encode {
            media_type: media_type.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a [`DataCodecError::Decode`] error.
    pub fn decode(media_type: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Decode {
            media_type: media_type.into(),
            reason: reason.to_string(),
        }
    }
}
