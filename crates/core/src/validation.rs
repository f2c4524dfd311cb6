//! Checks a raw `videos.list` payload against the shape we rely on.
//!
//! Payload-level problems (not an object, an error envelope, no `items`
//! array) always reject the whole payload. Item-level problems are handled
//! according to the [`ValidationPolicy`]: strict rejects the payload, lenient
//! drops the offending items and reports them. In both modes every record
//! that comes out has all required fields.

use std::fmt;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::{RawPayload, TrendingQuery, VideoRecord};
use crate::error::PipelineError;
use crate::ports::Result;
use crate::utils::parse_timestamp;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationPolicy {
    /// Any invalid item rejects the whole payload.
    #[default]
    Strict,
    /// Invalid items are dropped and reported.
    Lenient,
}

/// Why a single item was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    NotAnObject,
    MissingField(&'static str),
    EmptyField(&'static str),
    BadTimestamp(String),
    BadCount { field: &'static str, value: String },
    /// A later item repeating an earlier video id.
    Duplicate,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::NotAnObject => f.write_str("item is not an object"),
            Problem::MissingField(field) => write!(f, "missing {field}"),
            Problem::EmptyField(field) => write!(f, "empty {field}"),
            Problem::BadTimestamp(value) => {
                write!(f, "snippet.publishedAt {value:?} is not a timestamp")
            }
            Problem::BadCount { field, value } => {
                write!(f, "statistics.{field} {value:?} is not a count")
            }
            Problem::Duplicate => f.write_str("repeats an earlier video id"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordIssue {
    /// Zero-based position in the payload's `items`.
    pub index: usize,
    pub video_id: Option<String>,
    pub problem: Problem,
}

impl fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.video_id {
            Some(id) => write!(f, "item {} ({}): {}", self.index, id, self.problem),
            None => write!(f, "item {}: {}", self.index, self.problem),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBatch {
    /// Number of items the payload carried.
    pub fetched: usize,
    pub records: Vec<VideoRecord>,
    /// Always empty under the strict policy.
    pub rejected: Vec<RecordIssue>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    policy: ValidationPolicy,
}

impl Validator {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    pub fn validate(&self, query: &TrendingQuery, payload: &RawPayload) -> Result<ValidatedBatch> {
        let root = payload
            .0
            .as_object()
            .ok_or_else(|| PipelineError::MalformedPayload("payload is not a JSON object".into()))?;

        if let Some(message) = error_envelope_message(&payload.0) {
            let status = root
                .get("error")
                .and_then(|e| e.get("code"))
                .and_then(Value::as_u64)
                .and_then(|code| u16::try_from(code).ok())
                .unwrap_or(0);
            return Err(PipelineError::Api { status, message });
        }

        let items = match root.get("items") {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(PipelineError::MalformedPayload(
                    "`items` is not an array".into(),
                ))
            }
            None => return Err(PipelineError::MalformedPayload("missing `items`".into())),
        };

        let mut records = Vec::with_capacity(items.len());
        let mut rejected = Vec::new();

        for (index, item) in items.iter().enumerate() {
            match record_from_item(query, index, item) {
                Ok(record) => records.push(record),
                Err(problem) => rejected.push(RecordIssue {
                    index,
                    video_id: item
                        .get("id")
                        .and_then(Value::as_str)
                        .filter(|id| !id.is_empty())
                        .map(str::to_string),
                    problem,
                }),
            }
        }

        if !rejected.is_empty() {
            match self.policy {
                ValidationPolicy::Strict => {
                    return Err(PipelineError::Validation { issues: rejected });
                }
                ValidationPolicy::Lenient => {
                    for issue in &rejected {
                        warn!(%issue, "dropping invalid record");
                    }
                }
            }
        }

        debug!(
            fetched = items.len(),
            accepted = records.len(),
            rejected = rejected.len(),
            "payload validated"
        );

        Ok(ValidatedBatch {
            fetched: items.len(),
            records,
            rejected,
        })
    }
}

/// Message from Google's `{"error": {"message": ...}}` envelope, if the
/// document is one.
pub fn error_envelope_message(document: &Value) -> Option<String> {
    let error = document.get("error")?;
    let message = match error {
        Value::Object(fields) => fields
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        Value::String(message) => message.clone(),
        other => other.to_string(),
    };
    Some(message)
}

fn record_from_item(
    query: &TrendingQuery,
    index: usize,
    item: &Value,
) -> std::result::Result<VideoRecord, Problem> {
    let item = item.as_object().ok_or(Problem::NotAnObject)?;

    let video_id = required_str(item, "id", "id")?;
    let snippet = item
        .get("snippet")
        .and_then(Value::as_object)
        .ok_or(Problem::MissingField("snippet"))?;
    let title = required_str(snippet, "title", "snippet.title")?;
    let channel_title = required_str(snippet, "channelTitle", "snippet.channelTitle")?;
    let channel_id = snippet
        .get("channelId")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let published_raw = required_str(snippet, "publishedAt", "snippet.publishedAt")?;
    let published_at = parse_timestamp(published_raw)
        .ok_or_else(|| Problem::BadTimestamp(published_raw.to_string()))?;

    let statistics = item.get("statistics").and_then(Value::as_object);
    let view_count = count(statistics, "viewCount")?;
    let like_count = count(statistics, "likeCount")?;
    let comment_count = count(statistics, "commentCount")?;

    Ok(VideoRecord {
        rank: index as u32 + 1,
        video_id: video_id.to_string(),
        title: title.to_string(),
        channel_id: channel_id.to_string(),
        channel_title: channel_title.to_string(),
        view_count,
        like_count,
        comment_count,
        published_at,
        region: query.region.clone(),
    })
}

fn required_str<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    field: &'static str,
) -> std::result::Result<&'a str, Problem> {
    let value = object
        .get(key)
        .and_then(Value::as_str)
        .ok_or(Problem::MissingField(field))?;
    if value.trim().is_empty() {
        return Err(Problem::EmptyField(field));
    }
    Ok(value)
}

// Counts come back as decimal strings; hidden counts are simply absent.
fn count(
    statistics: Option<&Map<String, Value>>,
    field: &'static str,
) -> std::result::Result<Option<u64>, Problem> {
    let Some(value) = statistics.and_then(|s| s.get(field)) else {
        return Ok(None);
    };
    let parsed = match value {
        Value::String(text) => text.trim().parse::<u64>().ok(),
        Value::Number(number) => number.as_u64(),
        Value::Null => return Ok(None),
        _ => None,
    };
    parsed.map(Some).ok_or_else(|| Problem::BadCount {
        field,
        value: value.to_string().trim_matches('"').to_string(),
    })
}
