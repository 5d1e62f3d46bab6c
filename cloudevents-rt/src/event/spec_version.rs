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

use super::EventError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A CloudEvents specification version.
///
/// # Examples
///
/// ```rust
/// use cloudevents_rt::event::SpecVersion;
///
/// let v: SpecVersion = "0.3".parse().unwrap();
/// assert_eq!(v, SpecVersion::V03);
/// assert_eq!(SpecVersion::V10.as_str(), "1.0");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SpecVersion {
    /// CloudEvents 0.1
    V01,
    /// CloudEvents 0.2
    V02,
    /// CloudEvents 0.3
    V03,
    /// CloudEvents 1.0
    #[default]
    V10,
}

impl SpecVersion {
    /// All supported versions, oldest first.
    pub const ALL: [SpecVersion; 4] = [Self::V01, Self::V02, Self::V03, Self::V10];

    /// Returns the wire form of the version.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::V01 => "0.1",
            Self::V02 => "0.2",
            Self::V03 => "0.3",
            Self::V10 => "1.0",
        }
    }
}

impl FromStr for SpecVersion {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0.1" => Ok(Self::V01),
            "0.2" => Ok(Self::V02),
            "0.3" => Ok(Self::V03),
            "1.0" => Ok(Self::V10),
            other => Err(EventError::UnsupportedSpecVersion {
                version: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for SpecVersion {
    type Error = EventError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SpecVersion> for String {
    fn from(value: SpecVersion) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all() {
        for v in SpecVersion::ALL {
            assert_eq!(v.as_str().parse::<SpecVersion>().unwrap(), v);
        }
    }

    #[test]
    fn test_unknown_rejected() {
        assert!(matches!(
            "2.0".parse::<SpecVersion>(),
            Err(EventError::UnsupportedSpecVersion { .. })
        ));
    }

    #[test]
    fn test_serde() {
        let v: SpecVersion = serde_json::from_str("\"0.2\"").unwrap();
        assert_eq!(v, SpecVersion::V02);
        assert_eq!(serde_json::to_string(&SpecVersion::V10).unwrap(), "\"1.0\"");
    }
}
