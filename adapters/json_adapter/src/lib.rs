use std::fs;
use std::path::{Path, PathBuf};

use trending_core::domain::{TrendingQuery, VideoRecord};
use trending_core::error::PipelineError;
use trending_core::ports::{RecordWriter, Result, WriteOutcome};
use trending_core::utils::output_file_name;

/// Writes records as a pretty-printed JSON array to `trending_<REGION>.json`
pub struct JsonRecordWriter {
    output_folder: PathBuf,
}

impl JsonRecordWriter {
    pub fn new(output_folder: impl Into<PathBuf>) -> Self {
        Self {
            output_folder: output_folder.into(),
        }
    }

    pub fn path_for(&self, query: &TrendingQuery) -> PathBuf {
        self.output_folder.join(output_file_name(&query.region, "json"))
    }
}

impl RecordWriter for JsonRecordWriter {
    fn write(&self, query: &TrendingQuery, records: &[VideoRecord]) -> Result<WriteOutcome> {
        let file_path = self.path_for(query);
        let destination = file_path.display().to_string();

        let mut contents = serde_json::to_string_pretty(records)
            .map_err(|e| PipelineError::write(&destination, e))?;
        contents.push('\n');

        create_parent(&file_path).map_err(|e| PipelineError::write(&destination, e))?;
        fs::write(&file_path, contents).map_err(|e| PipelineError::write(&destination, e))?;

        Ok(WriteOutcome {
            destination,
            rows: records.len(),
        })
    }
}

fn create_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(rank: u32, id: &str, views: Option<u64>) -> VideoRecord {
        VideoRecord {
            rank,
            video_id: id.to_string(),
            title: format!("Video {id}"),
            channel_id: "UC1".to_string(),
            channel_title: "Channel".to_string(),
            view_count: views,
            like_count: None,
            comment_count: Some(2),
            published_at: "2024-05-01T12:00:00Z".parse().unwrap(),
            region: "US".parse().unwrap(),
        }
    }

    #[test]
    fn writes_records_that_read_back_identically() {
        let dir = TempDir::new().unwrap();
        let writer = JsonRecordWriter::new(dir.path().join("nested"));
        let records = vec![record(1, "a", Some(7)), record(2, "b", None)];

        let outcome = writer.write(&TrendingQuery::default(), &records).unwrap();

        assert_eq!(outcome.rows, 2);
        assert!(outcome.destination.ends_with("trending_US.json"));
        let text = fs::read_to_string(dir.path().join("nested/trending_US.json")).unwrap();
        let loaded: Vec<VideoRecord> = serde_json::from_str(&text).unwrap();
        assert_eq!(loaded, records);
        assert!(text.ends_with("]\n"));
    }

    #[test]
    fn same_input_gives_byte_identical_file() {
        let dir = TempDir::new().unwrap();
        let writer = JsonRecordWriter::new(dir.path());
        let query = TrendingQuery::default();
        let records = vec![record(1, "a", Some(7))];

        writer.write(&query, &records).unwrap();
        let first = fs::read(writer.path_for(&query)).unwrap();
        writer.write(&query, &records).unwrap();
        let second = fs::read(writer.path_for(&query)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn empty_batch_writes_empty_array() {
        let dir = TempDir::new().unwrap();
        let writer = JsonRecordWriter::new(dir.path());
        let query = TrendingQuery::default();

        writer.write(&query, &[]).unwrap();

        assert_eq!(fs::read_to_string(writer.path_for(&query)).unwrap(), "[]\n");
    }

    #[test]
    fn unwritable_destination_is_a_write_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let writer = JsonRecordWriter::new(blocker.join("sub"));

        let err = writer.write(&TrendingQuery::default(), &[]).unwrap_err();
        assert!(matches!(err, PipelineError::Write { .. }));
    }
}
