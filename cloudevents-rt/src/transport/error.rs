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

//! Transport layer error types.
//!
//! Transport errors sit below the client in the error hierarchy. They cover
//! wire failures, peer refusals, receiver lifecycle misuse and codec errors
//! raised while putting events on or taking them off the wire.
//!
//! # Recovery
//!
//! [`TransportError::is_recoverable`] separates transient failures (5xx
//! statuses, timeouts, refused connections, broker hiccups) from permanent
//! ones. Callers decide whether to retry; the transports never retry on
//! their own.

use crate::codec::CodecError;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur in the transport layer.
///
/// # Examples
///
/// ```rust
/// use cloudevents_rt::transport::TransportError;
///
/// let error = TransportError::BadStatus {
///     code: 503,
///     body: "try later".to_string(),
/// };
/// assert!(error.is_recoverable());
///
/// let error = TransportError::BadStatus {
///     code: 400,
///     body: String::new(),
/// };
/// assert!(!error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum TransportError {
    /// The peer answered with a non-2xx status.
    #[error("unexpected status {code}: {body}")]
    BadStatus {
        /// HTTP status code
        code: u16,
        /// Response body, lossily decoded
        body: String,
    },

    /// `start_receiver` was called while a receiver is already running.
    #[error("receiver already started")]
    AlreadyStarted,

    /// Graceful shutdown did not finish in time.
    #[error("shutdown did not complete within {duration:?}")]
    ShutdownTimeout {
        /// The configured bound
        duration: Duration,
    },

    /// The converter ran but produced neither an event nor an error.
    #[error("converter declined the message")]
    ConverterDeclined,

    /// The request context was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// Failed to bind the listening socket.
    #[error("failed to bind to {address}: {source}")]
    BindFailed {
        /// The address that failed to bind
        address: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// An outbound HTTP request failed before a response arrived.
    #[error("request to {url} failed: {source}")]
    RequestFailed {
        /// Target URL
        url: String,
        /// The underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// A broker driver reported a failure.
    #[error("{transport} driver error: {reason}")]
    Driver {
        /// Transport name
        transport: &'static str,
        /// Driver-supplied description
        reason: String,
    },

    /// The transport or its driver is closed.
    #[error("transport is closed")]
    Closed,

    /// Invalid transport configuration.
    ///
    /// Not recoverable; indicates a programming error.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the configuration error
        reason: String,
    },

    /// Encoding or decoding the event failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// An unexpected I/O error occurred.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl TransportError {
    /// Returns `true` if the operation may succeed when retried.
    ///
    /// Recoverable errors include:
    /// - 5xx and 429 statuses
    /// - Requests that timed out or could not connect
    /// - Driver failures
    /// - Transient I/O errors
    ///
    /// Non-recoverable errors include:
    /// - Other statuses
    /// - Codec errors
    /// - Lifecycle misuse and invalid configuration
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            TransportError::BadStatus { code, .. } => *code >= 500 || *code == 429,
            TransportError::RequestFailed { source, .. } => {
                source.is_timeout() || source.is_connect()
            }
            TransportError::Driver { .. } | TransportError::ShutdownTimeout { .. } => true,
            TransportError::Io { source } => matches!(
                source.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),

            TransportError::AlreadyStarted
            | TransportError::ConverterDeclined
            | TransportError::Cancelled
            | TransportError::BindFailed { .. }
            | TransportError::Closed
            | TransportError::InvalidConfiguration { .. }
            | TransportError::Codec(_) => false,
        }
    }

    /// Returns `true` if this error ends a running receiver.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TransportError::BindFailed { .. }
                | TransportError::Closed
                | TransportError::InvalidConfiguration { .. }
                | TransportError::Io { .. }
        )
    }

    pub(crate) fn driver(transport: &'static str, reason: impl Into<String>) -> Self {
        TransportError::Driver {
            transport,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_configuration(reason: impl Into<String>) -> Self {
        TransportError::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(error: io::Error) -> Self {
        TransportError::Io { source: error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_status_recoverable() {
        let error = TransportError::BadStatus {
            code: 500,
            body: String::new(),
        };
        assert!(error.is_recoverable());
        assert!(!error.is_fatal());
        assert_eq!(error.to_string(), "unexpected status 500: ");
    }

    #[test]
    fn test_bad_status_client_error() {
        let error = TransportError::BadStatus {
            code: 404,
            body: "missing".to_string(),
        };
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_already_started_not_recoverable() {
        assert!(!TransportError::AlreadyStarted.is_recoverable());
    }

    #[test]
    fn test_bind_failed_fatal() {
        let error = TransportError::BindFailed {
            address: "0.0.0.0:80".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(error.is_fatal());
        assert!(!error.is_recoverable());
        assert!(error.to_string().contains("0.0.0.0:80"));
    }

    #[test]
    fn test_transient_io_recoverable() {
        let error: TransportError = io::Error::new(io::ErrorKind::TimedOut, "slow").into();
        assert!(error.is_recoverable());
        let error: TransportError = io::Error::new(io::ErrorKind::BrokenPipe, "gone").into();
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_codec_error_passthrough() {
        let error: TransportError = CodecError::MalformedStructuredBody {
            reason: "eof".to_string(),
        }
        .into();
        assert_eq!(error.to_string(), "malformed structured body: eof");
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_driver_error() {
        let error = TransportError::driver("kafka", "broker down");
        assert!(error.is_recoverable());
        assert_eq!(error.to_string(), "kafka driver error: broker down");
    }
}
