use std::fs;
use std::path::{Path, PathBuf};
use trending_core::domain::{TrendingQuery, VideoRecord};
use trending_core::error::PipelineError;
use trending_core::ports::{RecordWriter, Result, WriteOutcome};
use trending_core::utils::output_file_name;

/// Markdown report writer adapter implementation
pub struct MarkdownWriterAdapter {
    output_folder: PathBuf,
}

impl MarkdownWriterAdapter {
    pub fn new(output_folder: impl Into<PathBuf>) -> Self {
        Self {
            output_folder: output_folder.into(),
        }
    }

    pub fn path_for(&self, query: &TrendingQuery) -> PathBuf {
        self.output_folder.join(output_file_name(&query.region, "md"))
    }

    /// Makes text safe to place inside a table cell
    fn escape_cell(&self, text: &str) -> String {
        text.chars()
            .map(|c| match c {
                '\\' => "\\\\".to_string(),
                '|' => "\\|".to_string(),
                c if c.is_control() => " ".to_string(),
                c => c.to_string(),
            })
            .collect::<String>()
            .trim()
            .to_string()
    }

    fn watch_url(&self, video_id: &str) -> String {
        let id: String = url::form_urlencoded::byte_serialize(video_id.as_bytes()).collect();
        format!("https://www.youtube.com/watch?v={id}")
    }

    /// Formats a count with thousands separators, "N/A" when hidden
    fn format_count(&self, count: Option<u64>) -> String {
        let Some(count) = count else {
            return "N/A".to_string();
        };
        let digits = count.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        grouped
    }

    /// Formats the report for one region
    fn format_markdown(&self, query: &TrendingQuery, records: &[VideoRecord]) -> String {
        let mut output = String::new();
        output.push_str(&format!("# Trending videos: {}\n\n", query.region));
        output.push_str(&format!("*{} videos*\n\n", records.len()));

        if records.is_empty() {
            output.push_str("*[No videos]*\n");
            return output;
        }

        output.push_str("| Rank | Title | Channel | Views | Published |\n");
        output.push_str("|---:|---|---|---:|---|\n");

        for record in records {
            output.push_str(&format!(
                "| {} | [{}]({}) | {} | {} | {} |\n",
                record.rank,
                self.escape_cell(&record.title).replace('[', "\\[").replace(']', "\\]"),
                self.watch_url(&record.video_id),
                self.escape_cell(&record.channel_title),
                self.format_count(record.view_count),
                record.published_at.format("%Y-%m-%d %H:%M UTC"),
            ));
        }

        output
    }
}

impl RecordWriter for MarkdownWriterAdapter {
    fn write(&self, query: &TrendingQuery, records: &[VideoRecord]) -> Result<WriteOutcome> {
        // Create output directory if it doesn't exist
        let output_dir = Path::new(&self.output_folder);
        let file_path = self.path_for(query);
        let destination = file_path.display().to_string();
        fs::create_dir_all(output_dir).map_err(|e| PipelineError::write(&destination, e))?;

        let markdown_content = self.format_markdown(query, records);
        fs::write(&file_path, markdown_content).map_err(|e| PipelineError::write(&destination, e))?;

        Ok(WriteOutcome {
            destination,
            rows: records.len(),
        })
    }
}
