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

//! The in-memory event model.
//!
//! An [`Event`] pairs a version-specific [`EventContext`] with optional
//! [`Data`]. The context is a tagged variant over the four supported
//! specification versions; the [`EventContextReader`] and
//! [`EventContextWriter`] traits expose the logical attributes uniformly and
//! the `as_v*` conversions re-view a context as any other version.
//!
//! # Version differences
//!
//! | Logical attribute     | 0.1                | 0.2           | 0.3                   | 1.0               |
//! |-----------------------|--------------------|---------------|-----------------------|-------------------|
//! | type                  | `eventType`        | `type`        | `type`                | `type`            |
//! | id                    | `eventID`          | `id`          | `id`                  | `id`              |
//! | time                  | `eventTime`        | `time`        | `time`                | `time`            |
//! | data schema           | `schemaURL`        | `schemaurl`   | `schemaurl`           | `dataschema`      |
//! | content type          | `contentType`      | `contenttype` | `datacontenttype`     | `datacontenttype` |
//! | subject               | extension          | extension     | `subject`             | `subject`         |
//! | content encoding      | extension          | extension     | `datacontentencoding` | `data_base64`     |
//!
//! # Examples
//!
//! ```rust
//! use cloudevents_rt::event::{Event, EventContextReader, SpecVersion};
//!
//! let mut event = Event::new(SpecVersion::V03);
//! event.set_id("1");
//! event.set_type("com.example.test");
//! event.set_source("/source").unwrap();
//! event.set_subject(Some("resource"));
//!
//! let v02 = event.context().as_v02();
//! assert_eq!(v02.subject(), Some("resource"));
//! ```

mod context;
mod data;
mod error;
mod event;
mod spec_version;
mod trace_context;
mod v01;
mod v02;
mod v03;
mod v1;

pub use self::context::{
    BASE64, EventContext, EventContextReader, EventContextWriter, Extensions,
    is_valid_extension_key,
};
pub(crate) use self::context::media_type;
pub use self::data::Data;
pub use self::error::EventError;
pub use self::event::Event;
pub use self::spec_version::SpecVersion;
pub use self::trace_context::{
    DistributedTracingExtension, TRACE_PARENT_EXTENSION, TRACE_STATE_EXTENSION,
};
pub use self::v01::EventContextV01;
pub use self::v02::EventContextV02;
pub use self::v03::EventContextV03;
pub use self::v1::EventContextV1;
