//! Events module for session notifications
//!
//! The dispatcher broadcasts these to every collaborator (IPC clients,
//! loggers). Delivery is fire-and-forget.

use serde::{Deserialize, Serialize};

use crate::command::Intent;
use crate::report::format_clock;
use crate::settings::Settings;
use crate::store::Record;

/// Which sound cue to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    Start,
    Stop,
}

/// Events emitted by the session machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// An intent the state machine does not handle itself
    IntentUnhandled { intent: Intent },

    /// Periodic elapsed-time update while running
    TimerTick {
        /// Milliseconds elapsed in the current run
        elapsed_ms: i64,
    },

    /// A session was completed and recorded
    RecordAppended { record: Record },

    /// Current task label changed
    TaskChanged { name: String },

    /// Timer started or stopped
    StateChanged { running: bool },

    /// Question counter changed
    QuestionChanged { number: u32 },

    /// Spoken confirmation (voice feedback enabled)
    Announcement { text: String },

    /// Sound cue (sound notifications enabled)
    Chime { cue: Cue },

    /// Periodic encouragement
    Motivation { message: String },

    /// Settings were replaced
    SettingsChanged { settings: Settings },

    /// Voice control cannot work (permission denied, source gone)
    RecognitionUnavailable { reason: String },
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEvent::IntentUnhandled { intent } => write!(f, "INTENT_UNHANDLED ({})", intent),
            SessionEvent::TimerTick { elapsed_ms } => {
                let seconds = (*elapsed_ms).max(0) as u64 / 1000;
                write!(f, "TIMER_TICK ({})", format_clock(seconds))
            }
            SessionEvent::RecordAppended { record } => write!(
                f,
                "RECORD_APPENDED ({} Q{} {}s)",
                record.task, record.question, record.time_seconds
            ),
            SessionEvent::TaskChanged { name } => write!(f, "TASK_CHANGED ({})", name),
            SessionEvent::StateChanged { running } => {
                write!(f, "STATE_CHANGED ({})", if *running { "running" } else { "idle" })
            }
            SessionEvent::QuestionChanged { number } => write!(f, "QUESTION_CHANGED ({})", number),
            SessionEvent::Announcement { text } => write!(f, "ANNOUNCEMENT ({})", text),
            SessionEvent::Chime { cue } => write!(f, "CHIME ({:?})", cue),
            SessionEvent::Motivation { message } => write!(f, "MOTIVATION ({})", message),
            SessionEvent::SettingsChanged { .. } => write!(f, "SETTINGS_CHANGED"),
            SessionEvent::RecognitionUnavailable { reason } => {
                write!(f, "RECOGNITION_UNAVAILABLE ({})", reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = SessionEvent::TimerTick { elapsed_ms: 1500 };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("timer_tick"));
        assert!(json.contains("1500"));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"state_changed","running":true}"#;
        let event: SessionEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, SessionEvent::StateChanged { running: true });
    }

    #[test]
    fn test_unhandled_intent_nests_tag() {
        let event = SessionEvent::IntentUnhandled {
            intent: Intent::Export,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"intent_unhandled""#));
        assert!(json.contains(r#""intent":{"type":"export"}"#));
    }

    #[test]
    fn test_display() {
        let tick = SessionEvent::TimerTick { elapsed_ms: 65_400 };
        assert_eq!(tick.to_string(), "TIMER_TICK (01:05)");
        let chime = SessionEvent::Chime { cue: Cue::Stop };
        assert_eq!(chime.to_string(), "CHIME (Stop)");
    }
}
