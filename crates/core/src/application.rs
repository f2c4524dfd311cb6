use tracing::{debug, info, warn};

use crate::domain::{RegionCode, TrendingQuery};
use crate::ports::{RecordWriter, Result, TrendingSource, WriteOutcome};
use crate::transform::Transformer;
use crate::validation::{RecordIssue, Validator};

/// Application service running fetch → validate → transform → write
pub struct TrendingPipeline {
    source: Box<dyn TrendingSource>,
    validator: Validator,
    transformer: Transformer,
    writers: Vec<Box<dyn RecordWriter>>,
}

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub region: RegionCode,
    /// Items in the raw payload.
    pub fetched: usize,
    /// Records that made it through validation and transformation.
    pub accepted: usize,
    /// Invalid items and dropped repeats, ordered by payload position.
    /// `accepted + rejected.len() == fetched`.
    pub rejected: Vec<RecordIssue>,
    pub outputs: Vec<WriteOutcome>,
}

impl TrendingPipeline {
    /// Creates a new TrendingPipeline with the given dependencies
    pub fn new(
        source: Box<dyn TrendingSource>,
        validator: Validator,
        writers: Vec<Box<dyn RecordWriter>>,
    ) -> Self {
        Self {
            source,
            validator,
            transformer: Transformer::new(),
            writers,
        }
    }

    /// Executes one run. Any stage failing stops the run; writers after a
    /// failed one are not called.
    pub fn run(&self, query: &TrendingQuery) -> Result<PipelineReport> {
        info!(region = %query.region, limit = query.max_results.get(), "fetching trending videos");
        let payload = self.source.fetch_trending(query)?;

        let batch = self.validator.validate(query, &payload)?;
        let transformed = self.transformer.transform(batch.records);
        for issue in &transformed.duplicates {
            warn!(%issue, "dropping repeated record");
        }

        let records = transformed.records;
        let mut rejected = batch.rejected;
        rejected.extend(transformed.duplicates);
        rejected.sort_by_key(|issue| issue.index);
        info!(
            fetched = batch.fetched,
            accepted = records.len(),
            rejected = rejected.len(),
            "records ready"
        );

        let mut outputs = Vec::with_capacity(self.writers.len());
        for writer in &self.writers {
            let outcome = writer.write(query, &records)?;
            debug!(destination = %outcome.destination, rows = outcome.rows, "output written");
            outputs.push(outcome);
        }

        Ok(PipelineReport {
            region: query.region.clone(),
            fetched: batch.fetched,
            accepted: records.len(),
            rejected,
            outputs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RawPayload, VideoRecord};
    use crate::error::PipelineError;
    use crate::validation::{Problem, ValidationPolicy};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    // `None` behaves like an unreachable API
    struct CannedSource(Option<serde_json::Value>);

    impl TrendingSource for CannedSource {
        fn fetch_trending(&self, _query: &TrendingQuery) -> Result<RawPayload> {
            self.0
                .clone()
                .map(RawPayload)
                .ok_or_else(|| PipelineError::Network("connection refused".into()))
        }
    }

    #[derive(Default, Clone)]
    struct RecordingWriter {
        name: &'static str,
        seen: Arc<Mutex<Vec<(&'static str, Vec<VideoRecord>)>>>,
        fail: bool,
    }

    impl RecordWriter for RecordingWriter {
        fn write(&self, _query: &TrendingQuery, records: &[VideoRecord]) -> Result<WriteOutcome> {
            if self.fail {
                return Err(PipelineError::write(self.name, "disk full"));
            }
            self.seen.lock().unwrap().push((self.name, records.to_vec()));
            Ok(WriteOutcome {
                destination: self.name.to_string(),
                rows: records.len(),
            })
        }
    }

    fn item(id: &str, title: &str) -> serde_json::Value {
        json!({
            "id": id,
            "snippet": {
                "publishedAt": "2024-05-01T12:00:00Z",
                "channelId": "UC1",
                "title": title,
                "channelTitle": "Channel"
            },
            "statistics": { "viewCount": "5" }
        })
    }

    fn query() -> TrendingQuery {
        TrendingQuery::default()
    }

    #[test]
    fn runs_every_stage_and_reports() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let writer = |name: &'static str| RecordingWriter { name, seen: seen.clone(), fail: false };
        let pipeline = TrendingPipeline::new(
            Box::new(CannedSource(Some(json!({
                "items": [item("a", "  Spaced   title "), item("b", "Other")]
            })))),
            Validator::default(),
            vec![Box::new(writer("first")), Box::new(writer("second"))],
        );

        let report = pipeline.run(&query()).unwrap();

        assert_eq!(report.region.as_str(), "US");
        assert_eq!(report.fetched, 2);
        assert_eq!(report.accepted, 2);
        assert!(report.rejected.is_empty());
        assert_eq!(
            report.outputs.iter().map(|o| o.destination.as_str()).collect::<Vec<_>>(),
            vec!["first", "second"]
        );

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].1[0].title, "Spaced title");
        assert_eq!(seen[0].1, seen[1].1);
    }

    #[test]
    fn runs_without_writers() {
        let pipeline = TrendingPipeline::new(
            Box::new(CannedSource(Some(json!({ "items": [item("a", "A")] })))),
            Validator::default(),
            Vec::new(),
        );
        let report = pipeline.run(&query()).unwrap();
        assert_eq!(report.accepted, 1);
        assert!(report.outputs.is_empty());
    }

    #[test]
    fn fetch_failure_is_returned() {
        let pipeline = TrendingPipeline::new(
            Box::new(CannedSource(None)),
            Validator::default(),
            Vec::new(),
        );
        assert!(matches!(pipeline.run(&query()), Err(PipelineError::Network(_))));
    }

    #[test]
    fn strict_validation_failure_skips_writers() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let pipeline = TrendingPipeline::new(
            Box::new(CannedSource(Some(json!({ "items": [item("a", "A"), item("", "B")] })))),
            Validator::new(ValidationPolicy::Strict),
            vec![Box::new(RecordingWriter { name: "out", seen: seen.clone(), fail: false })],
        );
        assert!(matches!(pipeline.run(&query()), Err(PipelineError::Validation { .. })));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn lenient_run_reports_rejections() {
        let pipeline = TrendingPipeline::new(
            Box::new(CannedSource(Some(json!({ "items": [item("a", "A"), item("", "B")] })))),
            Validator::new(ValidationPolicy::Lenient),
            Vec::new(),
        );
        let report = pipeline.run(&query()).unwrap();
        assert_eq!(report.fetched, 2);
        assert_eq!(report.accepted, 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].index, 1);
    }

    #[test]
    fn repeated_ids_are_counted_as_rejected() {
        for policy in [ValidationPolicy::Lenient, ValidationPolicy::Strict] {
            let pipeline = TrendingPipeline::new(
                Box::new(CannedSource(Some(json!({
                    "items": [item("a", "A"), item("a", "A again"), item("b", "B")]
                })))),
                Validator::new(policy),
                Vec::new(),
            );
            let report = pipeline.run(&query()).unwrap();
            assert_eq!(report.fetched, 3);
            assert_eq!(report.accepted, 2);
            assert_eq!(report.accepted + report.rejected.len(), report.fetched);
            assert_eq!(report.rejected[0].index, 1);
            assert_eq!(report.rejected[0].problem, Problem::Duplicate);
        }
    }

    #[test]
    fn rejections_are_ordered_by_position() {
        let pipeline = TrendingPipeline::new(
            Box::new(CannedSource(Some(json!({
                "items": [item("a", "A"), item("a", "again"), item("", "bad"), item("b", "B")]
            })))),
            Validator::new(ValidationPolicy::Lenient),
            Vec::new(),
        );
        let report = pipeline.run(&query()).unwrap();
        let indexes: Vec<_> = report.rejected.iter().map(|i| i.index).collect();
        assert_eq!(indexes, vec![1, 2]);
        assert_eq!(report.accepted + report.rejected.len(), report.fetched);
    }

    #[test]
    fn write_failure_stops_later_writers() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let pipeline = TrendingPipeline::new(
            Box::new(CannedSource(Some(json!({ "items": [item("a", "A")] })))),
            Validator::default(),
            vec![
                Box::new(RecordingWriter { name: "broken", seen: seen.clone(), fail: true }),
                Box::new(RecordingWriter { name: "after", seen: seen.clone(), fail: false }),
            ],
        );
        let err = pipeline.run(&query()).unwrap_err();
        assert!(err.to_string().contains("broken"), "got: {err}");
        assert!(seen.lock().unwrap().is_empty());
    }
}
