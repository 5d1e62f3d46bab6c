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

#![doc = include_str!("../../README.md")]
#![allow(clippy::module_inception)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod client;
pub mod codec;
pub mod datacodec;
pub mod error;
pub mod event;
pub mod observability;
pub mod transport;
pub mod types;

pub use client::{Client, ClientConfig, Handler};
pub use codec::{CodecError, Encoding};
pub use datacodec::DataCodecError;
pub use error::Error;
pub use event::{Event, EventError, SpecVersion};
pub use observability::{enable_tracing, is_tracing_enabled};
pub use transport::{EventResponse, RequestContext, Transport, TransportError};
