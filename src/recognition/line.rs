//! Line-delimited transcript source
//!
//! Reads one finalized transcript per line from any async reader, typically
//! stdin with an external speech-to-text process piped in.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{RecognitionError, RecognitionEvent, TranscriptSource};

/// Transcript source over newline-delimited text
///
/// The reader can only be consumed once; restarting after it is exhausted
/// reports [`RecognitionError::Unavailable`].
pub struct LineSource<R> {
    reader: Option<R>,
    active: Arc<AtomicBool>,
}

impl<R> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check if a session is currently reading
    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl<R> TranscriptSource for LineSource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    fn start(&mut self, events: mpsc::Sender<RecognitionEvent>) -> Result<(), RecognitionError> {
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(RecognitionError::AlreadyActive);
        }

        let Some(reader) = self.reader.take() else {
            self.active.store(false, Ordering::SeqCst);
            return Err(RecognitionError::Unavailable);
        };

        let active = Arc::clone(&self.active);
        tokio::spawn(async move {
            info!("transcript reader started");
            let mut lines = reader.lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let text = line.trim();
                        if text.is_empty() {
                            continue;
                        }
                        if events.send(RecognitionEvent::Final(text.to_string())).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("transcript reader reached end of input");
                        break;
                    }
                    Err(e) => {
                        let _ = events
                            .send(RecognitionEvent::Error(RecognitionError::Other(e.to_string())))
                            .await;
                        break;
                    }
                }
            }

            active.store(false, Ordering::SeqCst);
            let _ = events.send(RecognitionEvent::Ended).await;
        });

        Ok(())
    }
}
