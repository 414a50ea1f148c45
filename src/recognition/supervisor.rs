//! Keeps a transcript source running
//!
//! Sessions end on their own (silence, stream end); the supervisor restarts
//! them after a short delay so the transcript stream is logically unbounded.
//! Permission and availability failures are reported once and end supervision.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::events::SessionEvent;

use super::{RecognitionError, RecognitionEvent, TranscriptSource};

/// Pause before restarting an ended session
pub const RESTART_DELAY: Duration = Duration::from_millis(100);

/// Restarts a [`TranscriptSource`] and forwards its final transcripts
pub struct RecognitionSupervisor<S> {
    source: S,
    transcript_tx: mpsc::Sender<String>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl<S: TranscriptSource> RecognitionSupervisor<S> {
    pub fn new(
        source: S,
        transcript_tx: mpsc::Sender<String>,
        event_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            source,
            transcript_tx,
            event_tx,
        }
    }

    /// Run until recognition becomes unavailable or the dispatcher goes away
    pub async fn run(mut self) {
        let (events_tx, mut events_rx) = mpsc::channel(32);

        loop {
            match self.source.start(events_tx.clone()) {
                Ok(()) => debug!("recognition session started"),
                Err(RecognitionError::AlreadyActive) => {
                    debug!("recognition restart skipped, already active");
                }
                Err(e) if e.is_fatal() => {
                    self.surface(e);
                    return;
                }
                Err(e) => {
                    warn!(error = %e, "failed to start recognition, retrying");
                    tokio::time::sleep(RESTART_DELAY).await;
                    continue;
                }
            }

            // Pump events until the session needs a restart
            loop {
                let Some(event) = events_rx.recv().await else {
                    return;
                };

                match event {
                    RecognitionEvent::Interim(text) => {
                        debug!(%text, "interim result ignored");
                    }
                    RecognitionEvent::Final(text) => {
                        debug!(%text, "final transcript");
                        if self.transcript_tx.send(text).await.is_err() {
                            info!("transcript channel closed, recognition supervisor exiting");
                            return;
                        }
                    }
                    RecognitionEvent::Ended => {
                        debug!("recognition session ended");
                        break;
                    }
                    RecognitionEvent::Error(RecognitionError::NoSpeech) => {
                        debug!("no speech detected, restarting");
                        break;
                    }
                    RecognitionEvent::Error(e) if e.is_fatal() => {
                        self.surface(e);
                        return;
                    }
                    RecognitionEvent::Error(e) => {
                        warn!(error = %e, "recognition error");
                    }
                }
            }

            tokio::time::sleep(RESTART_DELAY).await;
        }
    }

    /// Report that voice control cannot function
    fn surface(&self, e: RecognitionError) {
        error!(error = %e, "voice control unavailable");
        let _ = self.event_tx.send(SessionEvent::RecognitionUnavailable {
            reason: e.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    type Script = Result<Vec<RecognitionEvent>, RecognitionError>;

    /// Plays one scripted session per start; runs out as `Unavailable`
    struct ScriptedSource {
        sessions: VecDeque<Script>,
        starts: Arc<AtomicUsize>,
    }

    impl ScriptedSource {
        fn new(sessions: Vec<Script>) -> (Self, Arc<AtomicUsize>) {
            let starts = Arc::new(AtomicUsize::new(0));
            let source = Self {
                sessions: sessions.into(),
                starts: Arc::clone(&starts),
            };
            (source, starts)
        }
    }

    impl TranscriptSource for ScriptedSource {
        fn start(
            &mut self,
            events: mpsc::Sender<RecognitionEvent>,
        ) -> Result<(), RecognitionError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            let script = self
                .sessions
                .pop_front()
                .unwrap_or(Err(RecognitionError::Unavailable))?;
            tokio::spawn(async move {
                for event in script {
                    if events.send(event).await.is_err() {
                        break;
                    }
                }
            });
            Ok(())
        }
    }

    fn final_(text: &str) -> RecognitionEvent {
        RecognitionEvent::Final(text.to_string())
    }

    async fn collect(mut rx: mpsc::Receiver<String>) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(text) = rx.recv().await {
            out.push(text);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn test_forwards_finals_and_restarts_after_end() {
        let (source, starts) = ScriptedSource::new(vec![
            Ok(vec![
                RecognitionEvent::Interim("sta".into()),
                final_("start"),
                RecognitionEvent::Ended,
            ]),
            Ok(vec![final_("stop"), RecognitionEvent::Ended]),
        ]);
        let (transcript_tx, transcript_rx) = mpsc::channel(8);
        let (event_tx, mut event_rx) = broadcast::channel(8);

        RecognitionSupervisor::new(source, transcript_tx, event_tx).run().await;

        assert_eq!(collect(transcript_rx).await, vec!["start", "stop"]);
        assert_eq!(starts.load(Ordering::SeqCst), 3);
        assert!(matches!(
            event_rx.try_recv(),
            Ok(SessionEvent::RecognitionUnavailable { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permission_denied_is_not_retried() {
        let (source, starts) = ScriptedSource::new(vec![Ok(vec![
            final_("start"),
            RecognitionEvent::Error(RecognitionError::NotAllowed),
            RecognitionEvent::Ended,
        ])]);
        let (transcript_tx, transcript_rx) = mpsc::channel(8);
        let (event_tx, mut event_rx) = broadcast::channel(8);

        RecognitionSupervisor::new(source, transcript_tx, event_tx).run().await;

        assert_eq!(collect(transcript_rx).await, vec!["start"]);
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(
            event_rx.try_recv().unwrap(),
            SessionEvent::RecognitionUnavailable {
                reason: "microphone access denied".to_string()
            }
        );
        assert!(event_rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_speech_and_transient_errors_recover() {
        let (source, starts) = ScriptedSource::new(vec![
            Ok(vec![RecognitionEvent::Error(RecognitionError::NoSpeech)]),
            Ok(vec![
                RecognitionEvent::Error(RecognitionError::Other("network".into())),
                final_("reset"),
                RecognitionEvent::Ended,
            ]),
            Err(RecognitionError::AlreadyActive),
        ]);
        let (transcript_tx, transcript_rx) = mpsc::channel(8);
        let (event_tx, _event_rx) = broadcast::channel(8);

        let supervisor = RecognitionSupervisor::new(source, transcript_tx, event_tx);
        let handle = tokio::spawn(supervisor.run());

        let mut transcript_rx = transcript_rx;
        assert_eq!(transcript_rx.recv().await.as_deref(), Some("reset"));

        // Third start is "already active": tolerated, the supervisor keeps waiting
        tokio::time::sleep(RESTART_DELAY * 5).await;
        assert_eq!(starts.load(Ordering::SeqCst), 3);
        assert!(!handle.is_finished());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_exits_when_dispatcher_gone() {
        let (source, _starts) = ScriptedSource::new(vec![Ok(vec![final_("start")])]);
        let (transcript_tx, transcript_rx) = mpsc::channel(8);
        let (event_tx, mut event_rx) = broadcast::channel(8);
        drop(transcript_rx);

        RecognitionSupervisor::new(source, transcript_tx, event_tx).run().await;
        assert!(event_rx.try_recv().is_err());
    }
}
