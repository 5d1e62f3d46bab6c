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

//! Top-level error type.
//!
//! Each layer owns its error enum:
//!
//! 1. **Event**: validation of attributes and extensions ([`EventError`])
//! 2. **Data codec**: payload encoding per media type ([`DataCodecError`])
//! 3. **Codec**: event encoding per version and encoding ([`CodecError`])
//! 4. **Transport**: wire failures and receiver lifecycle ([`TransportError`])
//!
//! [`Error`] composes them, together with errors returned by user handlers,
//! and is what the [`Client`](crate::client::Client) returns.
//!
//! # Examples
//!
//! ```rust
//! use cloudevents_rt::Error;
//! use cloudevents_rt::transport::TransportError;
//!
//! let err: Error = TransportError::AlreadyStarted.into();
//! assert!(err.is_transport());
//! assert!(!err.is_recoverable());
//! ```

use crate::codec::CodecError;
use crate::datacodec::DataCodecError;
use crate::event::EventError;
use crate::transport::{HandlerError, TransportError};
use std::error::Error as StdError;
use std::fmt;

/// Any error produced by the runtime.
#[derive(Debug)]
pub enum Error {
    /// The event failed validation.
    Event(EventError),

    /// The payload could not be encoded or decoded.
    DataCodec(DataCodecError),

    /// The event could not be encoded for or decoded from a message.
    Codec(CodecError),

    /// The wire failed or the receiver could not run.
    Transport(TransportError),

    /// A user handler failed.
    Handler(HandlerError),
}

impl Error {
    /// Returns `true` if this is an event validation error.
    #[must_use]
    pub const fn is_event(&self) -> bool {
        matches!(self, Self::Event(_))
    }

    /// Returns `true` if this is a data codec error.
    #[must_use]
    pub const fn is_data_codec(&self) -> bool {
        matches!(self, Self::DataCodec(_))
    }

    /// Returns `true` if this is an event codec error.
    #[must_use]
    pub const fn is_codec(&self) -> bool {
        matches!(self, Self::Codec(_))
    }

    /// Returns `true` if this is a transport error.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` if this is a handler error.
    #[must_use]
    pub const fn is_handler(&self) -> bool {
        matches!(self, Self::Handler(_))
    }

    /// Returns `true` if retrying the operation may succeed.
    ///
    /// Only transient transport failures qualify; a bad event stays bad.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_recoverable(),
            Self::Event(_) | Self::DataCodec(_) | Self::Codec(_) | Self::Handler(_) => false,
        }
    }

    /// Returns the transport error, if this is one.
    #[must_use]
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event(e) => write!(f, "event error: {e}"),
            Self::DataCodec(e) => write!(f, "data codec error: {e}"),
            Self::Codec(e) => write!(f, "codec error: {e}"),
            Self::Transport(e) => write!(f, "transport error: {e}"),
            Self::Handler(e) => write!(f, "handler error: {e}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Event(e) => Some(e),
            Self::DataCodec(e) => Some(e),
            Self::Codec(e) => Some(e),
            Self::Transport(e) => Some(e),
            Self::Handler(e) => Some(e.as_ref()),
        }
    }
}

impl From<EventError> for Error {
    fn from(error: EventError) -> Self {
        Self::Event(error)
    }
}

impl From<DataCodecError> for Error {
    fn from(error: DataCodecError) -> Self {
        Self::DataCodec(error)
    }
}

impl From<CodecError> for Error {
    fn from(error: CodecError) -> Self {
        Self::Codec(error)
    }
}

impl From<TransportError> for Error {
    fn from(error: TransportError) -> Self {
        Self::Transport(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_classification() {
        let err = Error::from(TransportError::Closed);
        assert!(err.is_transport());
        assert!(!err.is_event());
        assert!(!err.is_codec());

        let err = Error::from(CodecError::UnsupportedSpecVersion {
            version: "9.9".to_string(),
        });
        assert!(err.is_codec());
        assert!(!err.is_recoverable());

        let err = Error::Handler(Box::new(io::Error::other("boom")));
        assert!(err.is_handler());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_recoverable_follows_transport() {
        let err = Error::from(TransportError::BadStatus {
            code: 503,
            body: String::new(),
        });
        assert!(err.is_recoverable());
        let err = Error::from(TransportError::BadStatus {
            code: 404,
            body: String::new(),
        });
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_display_and_source() {
        let err = Error::from(TransportError::AlreadyStarted);
        assert!(err.to_string().starts_with("transport error"));
        assert!(err.source().is_some());
        assert!(matches!(
            err.as_transport(),
            Some(TransportError::AlreadyStarted)
        ));
    }
}
