//! Pipeline error types.

use crate::validation::RecordIssue;

/// Errors produced by any stage of the pipeline.
///
/// Every variant is fatal for the run; the binary reports it and exits.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// No API key in the environment or the `.env` file.
    #[error("API key not found. Make sure it's in .env (YOUTUBE_API_KEY)")]
    MissingApiKey,

    /// Invalid region, limit, env file or endpoint.
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport failure talking to the API.
    #[error("network error: {0}")]
    Network(String),

    /// The API answered with a non-success status or an error envelope.
    #[error("API error: {status} {message}")]
    Api { status: u16, message: String },

    /// The response body was not the JSON document we expect.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Strict validation found invalid items.
    #[error("{} record(s) failed validation: {}", .issues.len(), summarize(.issues))]
    Validation { issues: Vec<RecordIssue> },

    /// An output could not be written.
    #[error("failed to write {destination}: {reason}")]
    Write { destination: String, reason: String },

    /// Stored records could not be read back.
    #[error("failed to read {location}: {reason}")]
    Read { location: String, reason: String },
}

impl PipelineError {
    pub fn write(destination: impl Into<String>, reason: impl ToString) -> Self {
        Self::Write {
            destination: destination.into(),
            reason: reason.to_string(),
        }
    }

    pub fn read(location: impl Into<String>, reason: impl ToString) -> Self {
        Self::Read {
            location: location.into(),
            reason: reason.to_string(),
        }
    }
}

fn summarize(issues: &[RecordIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
