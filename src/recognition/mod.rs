//! Speech recognition plumbing
//!
//! Speech-to-text itself is external. A [`TranscriptSource`] delivers
//! recognition events; the [`RecognitionSupervisor`] keeps the stream alive
//! and forwards finalized transcripts to the session machine.

mod line;
mod supervisor;

use tokio::sync::mpsc;

pub use line::LineSource;
pub use supervisor::RecognitionSupervisor;

/// Events produced by a recognition session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Partial hypothesis, never acted upon
    Interim(String),
    /// Finalized utterance
    Final(String),
    /// The session reported an error
    Error(RecognitionError),
    /// The session ended and may be restarted
    Ended,
}

/// Errors that can occur during recognition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecognitionError {
    #[error("microphone access denied")]
    NotAllowed,

    #[error("no speech detected")]
    NoSpeech,

    #[error("recognition is already active")]
    AlreadyActive,

    #[error("speech recognition not available")]
    Unavailable,

    #[error("recognition error: {0}")]
    Other(String),
}

impl RecognitionError {
    /// Errors after which voice control cannot work at all
    pub fn is_fatal(&self) -> bool {
        matches!(self, RecognitionError::NotAllowed | RecognitionError::Unavailable)
    }
}

/// A restartable producer of recognition events
pub trait TranscriptSource: Send {
    /// Begin a recognition session delivering events to `events`
    ///
    /// Starting a session that is already active returns
    /// [`RecognitionError::AlreadyActive`].
    fn start(&mut self, events: mpsc::Sender<RecognitionEvent>) -> Result<(), RecognitionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors() {
        assert!(RecognitionError::NotAllowed.is_fatal());
        assert!(RecognitionError::Unavailable.is_fatal());
        assert!(!RecognitionError::NoSpeech.is_fatal());
        assert!(!RecognitionError::AlreadyActive.is_fatal());
        assert!(!RecognitionError::Other("network".into()).is_fatal());
    }
}
