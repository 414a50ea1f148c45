//! Completed session records

use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One completed timed question/task interval
///
/// Serialized with the keys used by earlier exports
/// (`task`, `question`, `time`, `timestamp`, `date`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Task label at the moment the timer stopped
    pub task: String,
    /// Question number within the current run of questions
    pub question: u32,
    /// Whole seconds spent, floored
    #[serde(rename = "time")]
    pub time_seconds: u64,
    /// Completion instant, RFC 3339 UTC with milliseconds
    #[serde(rename = "timestamp")]
    pub timestamp_iso: String,
    /// Completion day in local time, `YYYY-MM-DD`
    #[serde(rename = "date")]
    pub date_local: String,
}

impl Record {
    /// Build a record completed at `now_ms` (milliseconds since the Unix epoch)
    pub fn new(task: impl Into<String>, question: u32, time_seconds: u64, now_ms: i64) -> Self {
        let utc = DateTime::<Utc>::from_timestamp_millis(now_ms).unwrap_or_default();
        let local = utc.with_timezone(&Local);

        Self {
            task: task.into(),
            question,
            time_seconds,
            timestamp_iso: utc.to_rfc3339_opts(SecondsFormat::Millis, true),
            date_local: local.format("%Y-%m-%d").to_string(),
        }
    }
}
