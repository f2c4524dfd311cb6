use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// ISO 3166-1 alpha-2 region code, always uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionCode(String);

impl RegionCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RegionCode {
    fn default() -> Self {
        Self("US".to_string())
    }
}

impl FromStr for RegionCode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code.to_ascii_uppercase()))
        } else {
            Err(PipelineError::Config(format!(
                "invalid region code {s:?}: expected two letters such as US or CA"
            )))
        }
    }
}

impl TryFrom<String> for RegionCode {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RegionCode> for String {
    fn from(value: RegionCode) -> Self {
        value.0
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Number of items requested from the chart. The API caps a page at 50.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxResults(u8);

impl MaxResults {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 50;

    pub fn new(value: u32) -> Result<Self, PipelineError> {
        if (u32::from(Self::MIN)..=u32::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(PipelineError::Config(format!(
                "limit must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for MaxResults {
    fn default() -> Self {
        Self(5)
    }
}

impl fmt::Display for MaxResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What to ask the trending chart for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrendingQuery {
    pub region: RegionCode,
    pub max_results: MaxResults,
}

/// The untouched JSON document returned by the fetcher.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPayload(pub serde_json::Value);

/// One trending video, flattened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub rank: u32,
    pub video_id: String,
    pub title: String,
    pub channel_id: String,
    pub channel_title: String,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub published_at: DateTime<Utc>,
    pub region: RegionCode,
}
