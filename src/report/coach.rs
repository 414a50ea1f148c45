//! Rule-based coaching text and achievement summaries

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::stats::Stats;

/// Messages spoken on motivation ticks
pub const MOTIVATIONAL_MESSAGES: [&str; 8] = [
    "Great job! Keep up the excellent work!",
    "You're making amazing progress. Stay focused!",
    "Every question solved brings you closer to your goal!",
    "Your dedication is impressive. Keep going!",
    "Consistency is key. You're doing wonderfully!",
    "Believe in yourself. You've got this!",
    "Your effort today shapes your success tomorrow!",
    "Stay motivated. Your hard work will pay off!",
];

/// Pick one motivational message at random
pub fn pick_motivation<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    MOTIVATIONAL_MESSAGES
        .choose(rng)
        .copied()
        .unwrap_or(MOTIVATIONAL_MESSAGES[0])
}

/// Study-pattern feedback derived from the record log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub insights: String,
    pub improvements: String,
    pub motivation: String,
}

impl Analysis {
    /// Build an analysis, or `None` when there is nothing to analyze
    pub fn from_stats(stats: &Stats) -> Option<Self> {
        if stats.sessions == 0 {
            return None;
        }

        let avg = stats.average_seconds;
        let pace = if avg < 120 {
            "Your speed is excellent! "
        } else if avg < 300 {
            "Your pace is good and consistent. "
        } else {
            "Take your time to understand each concept thoroughly. "
        };

        let insights = format!(
            "You've completed {} questions with an average time of {} per question. {}",
            stats.sessions,
            stats.average_display(),
            pace
        );

        let improvements = concat!(
            "Focus on maintaining consistency in your study sessions. ",
            "Try to identify patterns in questions that take longer and practice similar problems. ",
            "Consider using the Pomodoro technique with 25-minute focused sessions."
        )
        .to_string();

        let motivation = format!(
            "Great progress! Every question solved is a step closer to your goal. \
             You've shown dedication with {} completed sessions. \
             Keep this momentum going and success will follow!",
            stats.sessions
        );

        Some(Self {
            insights,
            improvements,
            motivation,
        })
    }
}

/// Data printed on an achievement certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub sessions: usize,
    pub hours: u64,
    pub minutes: u64,
    pub date: String,
}

impl Certificate {
    /// Certificate for the current totals, or `None` before any session completes
    pub fn from_stats(stats: &Stats, today: NaiveDate) -> Option<Self> {
        if stats.sessions == 0 {
            return None;
        }

        Some(Self {
            sessions: stats.sessions,
            hours: stats.total_seconds / 3600,
            minutes: (stats.total_seconds % 3600) / 60,
            date: today.format("%Y-%m-%d").to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn stats(sessions: usize, total_seconds: u64) -> Stats {
        Stats {
            sessions,
            total_seconds,
            average_seconds: if sessions == 0 { 0 } else { total_seconds / sessions as u64 },
            streak_days: 0,
            tasks: Vec::new(),
        }
    }

    #[test]
    fn test_pick_motivation_is_from_list() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert!(MOTIVATIONAL_MESSAGES.contains(&pick_motivation(&mut rng)));
        }
    }

    #[test]
    fn test_no_analysis_without_sessions() {
        assert!(Analysis::from_stats(&stats(0, 0)).is_none());
    }

    #[test]
    fn test_analysis_pace_bands() {
        let fast = Analysis::from_stats(&stats(2, 200)).unwrap();
        assert!(fast.insights.contains("average time of 1:40"));
        assert!(fast.insights.contains("excellent"));

        let steady = Analysis::from_stats(&stats(1, 120)).unwrap();
        assert!(steady.insights.contains("good and consistent"));

        let slow = Analysis::from_stats(&stats(1, 300)).unwrap();
        assert!(slow.insights.contains("Take your time"));
        assert!(slow.motivation.contains("1 completed sessions"));
    }

    #[test]
    fn test_certificate() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        assert!(Certificate::from_stats(&stats(0, 0), today).is_none());

        let cert = Certificate::from_stats(&stats(4, 7_380), today).unwrap();
        assert_eq!(cert.sessions, 4);
        assert_eq!(cert.hours, 2);
        assert_eq!(cert.minutes, 3);
        assert_eq!(cert.date, "2024-05-10");
    }
}
