//! Timer and session bookkeeping
//!
//! Pure state: every transition takes the current wall-clock time as an
//! argument and reports what changed. Guarded transitions are no-ops.

use crate::store::Record;

/// Task label used before any task is set and after a reset
pub const DEFAULT_TASK: &str = "General";

/// The two timer states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    /// Timer stopped, waiting for Start
    #[default]
    Idle,
    /// Timer counting
    Running,
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            State::Idle => write!(f, "Idle"),
            State::Running => write!(f, "Running"),
        }
    }
}

/// Timer state, current task and question counter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    running: bool,
    /// Wall-clock origin, shifted back by any carried-over elapsed time
    start_epoch_ms: i64,
    /// Authoritative only while idle; refreshed by ticks while running
    elapsed_ms: i64,
    current_task: String,
    question_number: u32,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            running: false,
            start_epoch_ms: 0,
            elapsed_ms: 0,
            current_task: DEFAULT_TASK.to_string(),
            question_number: 1,
        }
    }

    pub fn state(&self) -> State {
        if self.running {
            State::Running
        } else {
            State::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn current_task(&self) -> &str {
        &self.current_task
    }

    pub fn question_number(&self) -> u32 {
        self.question_number
    }

    /// Elapsed milliseconds as of `now_ms`
    pub fn elapsed_ms(&self, now_ms: i64) -> i64 {
        if self.running {
            (now_ms - self.start_epoch_ms).max(0)
        } else {
            self.elapsed_ms
        }
    }

    /// Start the timer, resuming from any residual elapsed time
    ///
    /// Returns `false` if already running.
    pub fn start(&mut self, now_ms: i64) -> bool {
        if self.running {
            return false;
        }

        self.running = true;
        self.start_epoch_ms = now_ms - self.elapsed_ms;
        true
    }

    /// Refresh elapsed time; `None` while idle
    pub fn tick(&mut self, now_ms: i64) -> Option<i64> {
        if !self.running {
            return None;
        }

        self.elapsed_ms = self.elapsed_ms(now_ms);
        Some(self.elapsed_ms)
    }

    /// Stop the timer and produce the completed record
    ///
    /// Returns `None` if already idle.
    pub fn stop(&mut self, now_ms: i64) -> Option<Record> {
        if !self.running {
            return None;
        }

        let elapsed = self.elapsed_ms(now_ms);
        let time_seconds = (elapsed / 1000) as u64;
        let record = Record::new(
            self.current_task.clone(),
            self.question_number,
            time_seconds,
            now_ms,
        );

        self.question_number += 1;
        self.elapsed_ms = 0;
        self.running = false;
        Some(record)
    }

    /// Stop if running, then return to the initial counters
    ///
    /// A reset while running still records the interrupted session.
    pub fn reset(&mut self, now_ms: i64) -> Option<Record> {
        let record = self.stop(now_ms);

        self.elapsed_ms = 0;
        self.question_number = 1;
        self.current_task = DEFAULT_TASK.to_string();
        record
    }

    /// Set the task label, capitalizing its first letter
    pub fn set_task(&mut self, name: &str) -> &str {
        self.current_task = capitalize_first(name);
        &self.current_task
    }
}

/// Uppercase the first character, leave the rest untouched
fn capitalize_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000_000;

    #[test]
    fn test_initial_state() {
        let session = SessionState::new();
        assert_eq!(session.state(), State::Idle);
        assert_eq!(session.elapsed_ms(T0), 0);
        assert_eq!(session.question_number(), 1);
        assert_eq!(session.current_task(), "General");
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut session = SessionState::new();
        assert!(session.start(T0));
        assert!(!session.start(T0 + 5_000));
        // Second start did not move the origin
        assert_eq!(session.elapsed_ms(T0 + 8_000), 8_000);
    }

    #[test]
    fn test_tick_tracks_elapsed() {
        let mut session = SessionState::new();
        assert_eq!(session.tick(T0), None);
        session.start(T0);
        assert_eq!(session.tick(T0 + 100), Some(100));
        assert_eq!(session.tick(T0 + 1_250), Some(1_250));
    }

    #[test]
    fn test_stop_records_floored_seconds() {
        let mut session = SessionState::new();
        session.start(T0);
        let record = session.stop(T0 + 125_999).unwrap();

        assert_eq!(record.time_seconds, 125);
        assert_eq!(record.question, 1);
        assert_eq!(record.task, "General");
        assert_eq!(session.question_number(), 2);
        assert_eq!(session.elapsed_ms(T0 + 200_000), 0);
        assert_eq!(session.state(), State::Idle);
    }

    #[test]
    fn test_stop_while_idle_is_noop() {
        let mut session = SessionState::new();
        assert!(session.stop(T0).is_none());
        assert_eq!(session.question_number(), 1);
    }

    #[test]
    fn test_reset_while_running_records_once() {
        let mut session = SessionState::new();
        session.set_task("physics");
        session.start(T0);
        session.stop(T0 + 1_000);
        session.start(T0 + 2_000);

        let record = session.reset(T0 + 12_000).unwrap();
        assert_eq!(record.time_seconds, 10);
        assert_eq!(record.question, 2);
        assert_eq!(record.task, "Physics");

        assert_eq!(session.question_number(), 1);
        assert_eq!(session.current_task(), "General");
        assert!(!session.is_running());
    }

    #[test]
    fn test_reset_while_idle() {
        let mut session = SessionState::new();
        session.set_task("chemistry");
        session.start(T0);
        session.stop(T0 + 3_000);

        assert!(session.reset(T0 + 4_000).is_none());
        assert_eq!(session.question_number(), 1);
        assert_eq!(session.current_task(), "General");
    }

    #[test]
    fn test_set_task_capitalizes() {
        let mut session = SessionState::new();
        assert_eq!(session.set_task("algebra"), "Algebra");
        assert_eq!(session.set_task("linear algebra"), "Linear algebra");
        assert_eq!(session.set_task("élan"), "Élan");
    }

    #[test]
    fn test_set_task_while_running_keeps_timer() {
        let mut session = SessionState::new();
        session.start(T0);
        session.set_task("history");
        assert!(session.is_running());
        assert_eq!(session.elapsed_ms(T0 + 2_000), 2_000);
    }

    #[test]
    fn test_clock_going_backwards_clamps() {
        let mut session = SessionState::new();
        session.start(T0);
        let record = session.stop(T0 - 5_000).unwrap();
        assert_eq!(record.time_seconds, 0);
    }
}
