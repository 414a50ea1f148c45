//! Voice command interpretation
//!
//! Raw transcript -> normalize -> debounce (may drop) -> classify -> Intent.

mod classify;
mod debounce;

pub use classify::Intent;

use classify::classify;
use debounce::Debouncer;

use tracing::debug;

/// Canonical form of a recognized utterance: lowercase, trimmed
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Turns raw transcripts into intents, dropping re-emitted duplicates
#[derive(Debug, Default)]
pub struct CommandInterpreter {
    debouncer: Debouncer,
}

impl CommandInterpreter {
    /// Create a new interpreter
    pub fn new() -> Self {
        Self {
            debouncer: Debouncer::new(),
        }
    }

    /// Interpret a raw transcript received at `now_ms`
    ///
    /// Returns `None` when the command was debounced.
    pub fn interpret(&mut self, raw: &str, now_ms: i64) -> Option<Intent> {
        let normalized = normalize(raw);

        if !self.debouncer.should_process(&normalized, now_ms) {
            debug!(command = %normalized, "command ignored (debounced)");
            return None;
        }

        Some(classify(&normalized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Start Now \n"), "start now");
        assert_eq!(normalize("TASK Algebra"), "task algebra");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_duplicate_within_window_reaches_classifier_once() {
        let mut interpreter = CommandInterpreter::new();
        assert_eq!(interpreter.interpret("Start", 10_000), Some(Intent::Start));
        assert_eq!(interpreter.interpret(" start ", 11_000), None);
    }

    #[test]
    fn test_distinct_commands_back_to_back() {
        let mut interpreter = CommandInterpreter::new();
        assert_eq!(interpreter.interpret("start", 10_000), Some(Intent::Start));
        assert_eq!(interpreter.interpret("stop", 10_001), Some(Intent::Stop));
    }

    #[test]
    fn test_unknown_is_not_dropped() {
        let mut interpreter = CommandInterpreter::new();
        assert_eq!(
            interpreter.interpret("what time is it", 10_000),
            Some(Intent::Unknown)
        );
    }
}
