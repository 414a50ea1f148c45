//! Aggregate statistics over the record log

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::store::Record;

/// Time spent on one task label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskBreakdown {
    pub task: String,
    pub count: usize,
    pub total_seconds: u64,
}

/// Totals, averages and streak for a set of records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub sessions: usize,
    pub total_seconds: u64,
    /// Floored mean over all sessions
    pub average_seconds: u64,
    /// Consecutive days with at least one record, ending today
    pub streak_days: u32,
    /// Per-task totals in first-seen order
    pub tasks: Vec<TaskBreakdown>,
}

impl Stats {
    /// Compute statistics relative to the local calendar day `today`
    pub fn from_records(records: &[Record], today: NaiveDate) -> Self {
        let sessions = records.len();
        let total_seconds: u64 = records.iter().map(|r| r.time_seconds).sum();
        let average_seconds = if sessions == 0 {
            0
        } else {
            total_seconds / sessions as u64
        };

        let mut tasks: Vec<TaskBreakdown> = Vec::new();
        for record in records {
            match tasks.iter_mut().find(|t| t.task == record.task) {
                Some(entry) => {
                    entry.count += 1;
                    entry.total_seconds += record.time_seconds;
                }
                None => tasks.push(TaskBreakdown {
                    task: record.task.clone(),
                    count: 1,
                    total_seconds: record.time_seconds,
                }),
            }
        }

        Self {
            sessions,
            total_seconds,
            average_seconds,
            streak_days: streak(records, today),
            tasks,
        }
    }

    /// Total time as `Hh Mm`
    pub fn total_display(&self) -> String {
        format_hours_minutes(self.total_seconds)
    }

    /// Average time as `M:SS`
    pub fn average_display(&self) -> String {
        format!("{}:{:02}", self.average_seconds / 60, self.average_seconds % 60)
    }
}

/// Format whole seconds as `MM:SS`
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Format whole seconds as `Hh Mm`
pub fn format_hours_minutes(seconds: u64) -> String {
    format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
}

/// Count consecutive days with records, walking back from `today`
///
/// Distinct record days are visited newest first; each must be exactly as
/// many days before `today` as the streak counted so far.
pub fn streak(records: &[Record], today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = records
        .iter()
        .filter_map(|r| NaiveDate::parse_from_str(&r.date_local, "%Y-%m-%d").ok())
        .collect();

    let mut streak = 0u32;
    for day in days.iter().rev() {
        if (today - *day).num_days() == i64::from(streak) {
            streak += 1;
        } else {
            break;
        }
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(task: &str, seconds: u64, date: &str) -> Record {
        Record {
            task: task.to_string(),
            question: 1,
            time_seconds: seconds,
            timestamp_iso: String::new(),
            date_local: date.to_string(),
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(3599), "59:59");
        assert_eq!(format_clock(6000), "100:00");
    }

    #[test]
    fn test_format_hours_minutes() {
        assert_eq!(format_hours_minutes(0), "0h 0m");
        assert_eq!(format_hours_minutes(3_725), "1h 2m");
    }

    #[test]
    fn test_empty_stats() {
        let stats = Stats::from_records(&[], day("2024-05-10"));
        assert_eq!(stats.sessions, 0);
        assert_eq!(stats.total_display(), "0h 0m");
        assert_eq!(stats.average_display(), "0:00");
        assert_eq!(stats.streak_days, 0);
    }

    #[test]
    fn test_totals_and_breakdown() {
        let records = vec![
            record("Algebra", 60, "2024-05-10"),
            record("Physics", 125, "2024-05-10"),
            record("Algebra", 30, "2024-05-10"),
        ];
        let stats = Stats::from_records(&records, day("2024-05-10"));

        assert_eq!(stats.sessions, 3);
        assert_eq!(stats.total_seconds, 215);
        assert_eq!(stats.average_seconds, 71);
        assert_eq!(stats.average_display(), "1:11");
        assert_eq!(stats.tasks[0].task, "Algebra");
        assert_eq!(stats.tasks[0].count, 2);
        assert_eq!(stats.tasks[0].total_seconds, 90);
        assert_eq!(stats.tasks[1].task, "Physics");
    }

    #[test]
    fn test_streak_consecutive_days() {
        let records = vec![
            record("A", 1, "2024-05-08"),
            record("A", 1, "2024-05-09"),
            record("A", 1, "2024-05-10"),
            record("A", 1, "2024-05-10"),
        ];
        assert_eq!(streak(&records, day("2024-05-10")), 3);
    }

    #[test]
    fn test_streak_broken_by_gap() {
        let records = vec![record("A", 1, "2024-05-07"), record("A", 1, "2024-05-10")];
        assert_eq!(streak(&records, day("2024-05-10")), 1);
    }

    #[test]
    fn test_streak_requires_today() {
        let records = vec![record("A", 1, "2024-05-09")];
        assert_eq!(streak(&records, day("2024-05-10")), 0);
    }
}
