use chrono::SecondsFormat;
use rusqlite::{params, Connection, Row};
use std::path::PathBuf;
use trending_core::domain::{RegionCode, TrendingQuery, VideoRecord};
use trending_core::error::PipelineError;
use trending_core::ports::{RecordWriter, Result, WriteOutcome};
use trending_core::utils::parse_timestamp;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS trending_videos (
        region        TEXT    NOT NULL,
        video_id      TEXT    NOT NULL,
        rank          INTEGER NOT NULL,
        title         TEXT    NOT NULL,
        channel_id    TEXT    NOT NULL,
        channel_title TEXT    NOT NULL,
        view_count    INTEGER,
        like_count    INTEGER,
        comment_count INTEGER,
        published_at  TEXT    NOT NULL,
        PRIMARY KEY (region, video_id)
    )
"#;

/// SQLite implementation of the RecordWriter trait
pub struct SqliteRecordWriter {
    db_path: PathBuf,
}

impl SqliteRecordWriter {
    /// Creates a new SqliteRecordWriter with the given database path
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    fn open(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn)
    }

    fn upsert(&self, records: &[VideoRecord]) -> rusqlite::Result<()> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO trending_videos (
                    region, video_id, rank, title, channel_id, channel_title,
                    view_count, like_count, comment_count, published_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(region, video_id) DO UPDATE SET
                    rank = excluded.rank,
                    title = excluded.title,
                    channel_id = excluded.channel_id,
                    channel_title = excluded.channel_title,
                    view_count = excluded.view_count,
                    like_count = excluded.like_count,
                    comment_count = excluded.comment_count,
                    published_at = excluded.published_at
                "#,
            )?;

            for record in records {
                stmt.execute(params![
                    record.region.as_str(),
                    record.video_id,
                    record.rank,
                    record.title,
                    record.channel_id,
                    record.channel_title,
                    to_sql_count(record.view_count),
                    to_sql_count(record.like_count),
                    to_sql_count(record.comment_count),
                    record.published_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                ])?;
            }
        }
        tx.commit()
    }

    /// Reads back the stored records for a region, ordered by rank
    pub fn fetch_region(&self, region: &RegionCode) -> Result<Vec<VideoRecord>> {
        let location = self.db_path.display().to_string();
        let conn = self.open().map_err(|e| PipelineError::read(&location, e))?;

        let mut stmt = conn
            .prepare(
                r#"
                SELECT region, video_id, rank, title, channel_id, channel_title,
                       view_count, like_count, comment_count, published_at
                FROM trending_videos
                WHERE region = ?1
                ORDER BY rank ASC, video_id ASC
                "#,
            )
            .map_err(|e| PipelineError::read(&location, e))?;

        // Map rows to VideoRecord using rusqlite's row mapping
        let records = stmt
            .query_map([region.as_str()], |row: &Row| {
                let raw_region: String = row.get(0)?;
                let raw_published: String = row.get(9)?;
                Ok(VideoRecord {
                    region: raw_region.parse().map_err(|e| conversion_error(0, e))?,
                    video_id: row.get(1)?,
                    rank: row.get(2)?,
                    title: row.get(3)?,
                    channel_id: row.get(4)?,
                    channel_title: row.get(5)?,
                    view_count: from_sql_count(row.get(6)?),
                    like_count: from_sql_count(row.get(7)?),
                    comment_count: from_sql_count(row.get(8)?),
                    published_at: parse_timestamp(&raw_published).ok_or_else(|| {
                        conversion_error(9, format!("bad timestamp {raw_published:?}"))
                    })?,
                })
            })
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| PipelineError::read(&location, e))?;

        Ok(records)
    }
}

impl RecordWriter for SqliteRecordWriter {
    fn write(&self, _query: &TrendingQuery, records: &[VideoRecord]) -> Result<WriteOutcome> {
        let destination = self.db_path.display().to_string();
        self.upsert(records)
            .map_err(|e| PipelineError::write(&destination, e))?;

        Ok(WriteOutcome {
            destination,
            rows: records.len(),
        })
    }
}

// SQLite integers are signed; counts beyond i64::MAX are not real view counts
fn to_sql_count(count: Option<u64>) -> Option<i64> {
    count.and_then(|n| i64::try_from(n).ok())
}

fn from_sql_count(count: Option<i64>) -> Option<u64> {
    count.and_then(|n| u64::try_from(n).ok())
}

fn conversion_error(column: usize, error: impl ToString) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        error.to_string().into(),
    )
}
