//! Reporting data for history, export, certificate and analysis views
//!
//! Only the data is produced here; rendering and file encoding belong to
//! whichever client consumes it.

mod coach;
mod stats;

use chrono::{Local, NaiveDate, SecondsFormat};
use serde::{Deserialize, Serialize};

use crate::store::Record;

pub use coach::{pick_motivation, Analysis, Certificate};
pub use stats::{format_clock, Stats};

#[cfg(test)]
pub use coach::MOTIVATIONAL_MESSAGES;

/// Longest task label printed in a report row
const REPORT_TASK_WIDTH: usize = 15;

/// The current local calendar day
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// One line of an exported report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub task: String,
    pub question: u32,
    /// `MM:SS`
    pub time: String,
    pub date: String,
}

impl From<&Record> for ReportRow {
    fn from(record: &Record) -> Self {
        Self {
            task: record.task.chars().take(REPORT_TASK_WIDTH).collect(),
            question: record.question,
            time: format_clock(record.time_seconds),
            date: record.date_local.clone(),
        }
    }
}

/// Everything an exported study report contains
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReport {
    /// Generation time, RFC 3339 local
    pub generated: String,
    pub stats: Stats,
    /// Records in completion order
    pub rows: Vec<ReportRow>,
}

impl ExportReport {
    /// Build a report, or `None` when there is no data to export
    pub fn build(records: &[Record], today: NaiveDate) -> Option<Self> {
        if records.is_empty() {
            return None;
        }

        Some(Self {
            generated: Local::now().to_rfc3339_opts(SecondsFormat::Secs, false),
            stats: Stats::from_records(records, today),
            rows: records.iter().map(ReportRow::from).collect(),
        })
    }
}
