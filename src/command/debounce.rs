//! Duplicate command suppression
//!
//! Continuous recognition re-emits the same final result for a single
//! utterance. Identical consecutive text inside the window is dropped.

/// Window during which an identical repeated command is ignored
pub const DEBOUNCE_WINDOW_MS: i64 = 3000;

/// Tracks the last accepted command
#[derive(Debug, Clone, Default)]
pub struct Debouncer {
    last_command: String,
    last_command_at_ms: i64,
}

impl Debouncer {
    /// Create a debouncer that has not yet accepted anything
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether a normalized command should be processed
    ///
    /// A suppressed command leaves the bookkeeping untouched; an accepted one
    /// (known or not) becomes the new reference point.
    pub fn should_process(&mut self, normalized: &str, now_ms: i64) -> bool {
        let within_window = now_ms - self.last_command_at_ms < DEBOUNCE_WINDOW_MS;
        if within_window && normalized == self.last_command {
            return false;
        }

        self.last_command.clear();
        self.last_command.push_str(normalized);
        self.last_command_at_ms = now_ms;
        true
    }

    /// Last accepted command text
    #[cfg(test)]
    pub fn last_command(&self) -> &str {
        &self.last_command
    }
}
