use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use trending_core::domain::{TrendingQuery, VideoRecord};
use trending_core::error::PipelineError;
use trending_core::ports::{RecordWriter, Result, WriteOutcome};
use trending_core::utils::output_file_name;

/// Placeholder for counts the API did not return
pub const MISSING_COUNT: &str = "N/A";

/// Writes records as a CSV table to `trending_<REGION>.csv`
pub struct CsvRecordWriter {
    output_folder: PathBuf,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    rank: u32,
    video_id: &'a str,
    title: &'a str,
    channel_id: &'a str,
    channel_title: &'a str,
    views: String,
    likes: String,
    comments: String,
    published_at: String,
}

impl<'a> From<&'a VideoRecord> for CsvRow<'a> {
    fn from(record: &'a VideoRecord) -> Self {
        Self {
            rank: record.rank,
            video_id: &record.video_id,
            title: &record.title,
            channel_id: &record.channel_id,
            channel_title: &record.channel_title,
            views: count_cell(record.view_count),
            likes: count_cell(record.like_count),
            comments: count_cell(record.comment_count),
            published_at: record
                .published_at
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        }
    }
}

fn count_cell(count: Option<u64>) -> String {
    count.map_or_else(|| MISSING_COUNT.to_string(), |n| n.to_string())
}

const HEADER: [&str; 9] = [
    "rank",
    "video_id",
    "title",
    "channel_id",
    "channel_title",
    "views",
    "likes",
    "comments",
    "published_at",
];

impl CsvRecordWriter {
    pub fn new(output_folder: impl Into<PathBuf>) -> Self {
        Self {
            output_folder: output_folder.into(),
        }
    }

    pub fn path_for(&self, query: &TrendingQuery) -> PathBuf {
        self.output_folder.join(output_file_name(&query.region, "csv"))
    }

    /// Renders the CSV document in memory
    fn render(records: &[VideoRecord]) -> std::result::Result<Vec<u8>, csv::Error> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        // Written explicitly so an empty batch still gets a header row
        writer.write_record(HEADER)?;
        for record in records {
            writer.serialize(CsvRow::from(record))?;
        }
        writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))
    }
}

impl RecordWriter for CsvRecordWriter {
    fn write(&self, query: &TrendingQuery, records: &[VideoRecord]) -> Result<WriteOutcome> {
        let file_path = self.path_for(query);
        let destination = file_path.display().to_string();

        let bytes = Self::render(records).map_err(|e| PipelineError::write(&destination, e))?;
        fs::create_dir_all(&self.output_folder)
            .map_err(|e| PipelineError::write(&destination, e))?;
        fs::write(&file_path, bytes).map_err(|e| PipelineError::write(&destination, e))?;

        Ok(WriteOutcome {
            destination,
            rows: records.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(rank: u32, id: &str, title: &str, views: Option<u64>) -> VideoRecord {
        VideoRecord {
            rank,
            video_id: id.to_string(),
            title: title.to_string(),
            channel_id: "UC1".to_string(),
            channel_title: "Channel".to_string(),
            view_count: views,
            like_count: Some(3),
            comment_count: None,
            published_at: "2024-05-01T12:00:00Z".parse().unwrap(),
            region: "US".parse().unwrap(),
        }
    }

    #[test]
    fn writes_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let writer = CsvRecordWriter::new(dir.path());
        let records = vec![record(1, "a", "A", Some(7)), record(2, "b", "B", Some(9))];

        let outcome = writer.write(&TrendingQuery::default(), &records).unwrap();
        assert_eq!(outcome.rows, 2);

        let mut reader = csv::Reader::from_path(writer.path_for(&TrendingQuery::default())).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
        assert_eq!(headers, HEADER.to_vec());

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][2], "A");
        assert_eq!(&rows[1][5], "9");
        assert_eq!(&rows[0][8], "2024-05-01T12:00:00Z");
    }

    #[test]
    fn missing_counts_are_written_as_na() {
        let dir = TempDir::new().unwrap();
        let writer = CsvRecordWriter::new(dir.path());
        writer
            .write(&TrendingQuery::default(), &[record(1, "a", "A", None)])
            .unwrap();

        let text = fs::read_to_string(writer.path_for(&TrendingQuery::default())).unwrap();
        assert!(text.lines().nth(1).unwrap().contains(",N/A,3,N/A,"), "got: {text}");
    }

    #[test]
    fn titles_with_commas_and_quotes_are_quoted() {
        let dir = TempDir::new().unwrap();
        let writer = CsvRecordWriter::new(dir.path());
        let tricky = "Live, \"loud\" and proud";
        writer
            .write(&TrendingQuery::default(), &[record(1, "a", tricky, Some(1))])
            .unwrap();

        let mut reader = csv::Reader::from_path(writer.path_for(&TrendingQuery::default())).unwrap();
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[2], tricky);
    }

    #[test]
    fn empty_batch_still_has_header() {
        let dir = TempDir::new().unwrap();
        let writer = CsvRecordWriter::new(dir.path());
        writer.write(&TrendingQuery::default(), &[]).unwrap();

        let text = fs::read_to_string(writer.path_for(&TrendingQuery::default())).unwrap();
        assert_eq!(text, format!("{}\n", HEADER.join(",")));
    }

    #[test]
    fn same_input_gives_byte_identical_file() {
        let dir = TempDir::new().unwrap();
        let writer = CsvRecordWriter::new(dir.path());
        let query = TrendingQuery::default();
        let records = vec![record(1, "a", "A", Some(7))];

        writer.write(&query, &records).unwrap();
        let first = fs::read(writer.path_for(&query)).unwrap();
        writer.write(&query, &records).unwrap();
        assert_eq!(first, fs::read(writer.path_for(&query)).unwrap());
    }
}
