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

use crate::codec::{BinaryParts, CodecError};
use crate::transport::message::parts_from_headers;
use crate::transport::{Message, TransportContext};
use axum::http::HeaderMap;
use axum::http::header::{CONTENT_TYPE, HOST};

/// An inbound HTTP request or long-poll response.
#[derive(Debug, Clone, Default)]
pub struct HttpMessage {
    /// Request method, empty for responses
    pub method: String,
    /// Request URI or polled URL
    pub uri: String,
    /// Headers as received
    pub headers: HeaderMap,
    /// Body
    pub body: Vec<u8>,
}

impl HttpMessage {
    /// Returns a header value as text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl Message for HttpMessage {
    fn content_type(&self) -> Option<String> {
        self.header(CONTENT_TYPE.as_str()).map(str::to_string)
    }

    fn body(&self) -> &[u8] {
        &self.body
    }

    fn binary_parts(&self) -> Result<BinaryParts, CodecError> {
        parts_from_headers(
            self.headers
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_bytes())),
            self.content_type(),
            &self.body,
        )
    }

    fn transport_context(&self) -> Option<TransportContext> {
        Some(TransportContext::Http {
            uri: self.uri.clone(),
            host: self.header(HOST.as_str()).map(str::to_string),
            method: self.method.clone(),
            headers: self
                .headers
                .iter()
                .filter_map(|(name, value)| {
                    Some((name.as_str().to_string(), value.to_str().ok()?.to_string()))
                })
                .collect(),
        })
    }
}
