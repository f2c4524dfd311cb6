use crate::domain::{RawPayload, TrendingQuery, VideoRecord};
use crate::error::PipelineError;

pub type Result<T> = std::result::Result<T, PipelineError>;

pub trait TrendingSource {
    // One request, raw JSON back; validation happens in the core
    fn fetch_trending(&self, query: &TrendingQuery) -> Result<RawPayload>;
}

/// Trait for persisting the transformed records.
/// This is a port (interface) that defines how the core communicates with output adapters
pub trait RecordWriter: Send + Sync {
    fn write(&self, query: &TrendingQuery, records: &[VideoRecord]) -> Result<WriteOutcome>;
}

/// Where a writer put the records, and how many.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub destination: String,
    pub rows: usize,
}
