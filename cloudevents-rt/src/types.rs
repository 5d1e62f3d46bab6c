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

//! Wire-safe scalar types shared by every specification version.
//!
//! - [`Timestamp`]: RFC 3339 timestamps with nanosecond precision
//! - [`UriRef`]: URI-references, relative references included
//! - [`format`] / [`format_value`]: canonical string form of extension values
//! - [`allocate`]: fresh decode targets for the data codec
//!
//! # Examples
//!
//! ```rust
//! use cloudevents_rt::types::{Timestamp, UriRef};
//!
//! let ts = Timestamp::parse("2020-04-05T17:31:00.123Z").unwrap();
//! assert_eq!(ts.to_string(), "2020-04-05T17:31:00.123Z");
//!
//! let source = UriRef::parse("/unit/test/client").unwrap();
//! assert_eq!(source.as_str(), "/unit/test/client");
//! ```

mod format;
mod timestamp;
mod uri_ref;

pub use self::format::{allocate, format, format_value};
pub use self::timestamp::Timestamp;
pub use self::uri_ref::UriRef;
