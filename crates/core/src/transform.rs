use std::collections::HashSet;

use chrono::{DateTime, SubsecRound, Utc};

use crate::domain::VideoRecord;
use crate::utils::collapse_whitespace;
use crate::validation::{Problem, RecordIssue};

/// Normalizes validated records into their stored shape.
///
/// Text fields get their whitespace collapsed, timestamps are truncated to
/// whole seconds, repeated video ids keep only their first occurrence and
/// ranks are renumbered from 1. Running it on its own output changes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transformer;

/// Normalized records plus the repeats that were dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub records: Vec<VideoRecord>,
    /// One issue per dropped repeat, indexed by its payload position.
    pub duplicates: Vec<RecordIssue>,
}

impl Transformer {
    pub fn new() -> Self {
        Self
    }

    pub fn transform(&self, records: Vec<VideoRecord>) -> Transformed {
        let mut seen = HashSet::with_capacity(records.len());
        let mut kept = Vec::with_capacity(records.len());
        let mut duplicates = Vec::new();

        for record in records {
            if !seen.insert(record.video_id.clone()) {
                // Ranks still hold payload positions at this point
                duplicates.push(RecordIssue {
                    index: record.rank.saturating_sub(1) as usize,
                    video_id: Some(record.video_id),
                    problem: Problem::Duplicate,
                });
                continue;
            }
            kept.push(record);
        }

        let records = kept
            .into_iter()
            .enumerate()
            .map(|(position, record)| VideoRecord {
                rank: position as u32 + 1,
                title: collapse_whitespace(&record.title),
                channel_title: collapse_whitespace(&record.channel_title),
                published_at: whole_seconds(record.published_at),
                ..record
            })
            .collect();

        Transformed { records, duplicates }
    }
}

fn whole_seconds(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp.trunc_subsecs(0)
}
