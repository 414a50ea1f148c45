//! Session dispatcher
//!
//! Single owner of the session state, debounce state and record log.
//! Transcripts, settings updates and clock ticks arrive on separate inputs
//! and are applied one at a time, so no locking is needed.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::command::{CommandInterpreter, Intent};
use crate::events::{Cue, SessionEvent};
use crate::report;
use crate::settings::Settings;
use crate::store::{Record, RecordLog};

use super::clock::Clock;
use super::session::{SessionState, DEFAULT_TASK};

/// Cadence of elapsed-time updates while running
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Spoken once when the dispatcher starts
const WELCOME: &str = "Welcome to the voice timer. Voice commands are ready. Say start to begin.";

/// Applies intents to the session and publishes the results
pub struct SessionMachine {
    session: SessionState,
    interpreter: CommandInterpreter,
    records: RecordLog,
    settings: Settings,
    /// Where settings updates are persisted, if anywhere
    settings_path: Option<PathBuf>,
    clock: Arc<dyn Clock>,
    event_tx: broadcast::Sender<SessionEvent>,
    /// Present only while running
    ticker: Option<Interval>,
    /// Present only while motivational messages are enabled
    motivation: Option<(Duration, Interval)>,
}

impl SessionMachine {
    /// Create a new session machine
    pub fn new(
        records: RecordLog,
        settings: Settings,
        clock: Arc<dyn Clock>,
        event_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            session: SessionState::new(),
            interpreter: CommandInterpreter::new(),
            records,
            settings,
            settings_path: None,
            clock,
            event_tx,
            ticker: None,
            motivation: None,
        }
    }

    /// Persist settings updates to `path`
    pub fn with_settings_path(mut self, path: PathBuf) -> Self {
        self.settings_path = Some(path);
        self
    }

    /// Run the dispatcher until the transcript channel closes
    pub async fn run(
        &mut self,
        mut transcript_rx: mpsc::Receiver<String>,
        mut settings_rx: mpsc::Receiver<Settings>,
    ) {
        info!(records = self.records.len(), "session machine started in Idle state");
        self.announce(WELCOME.to_string());
        self.sync_timers();

        loop {
            tokio::select! {
                transcript = transcript_rx.recv() => {
                    let Some(transcript) = transcript else {
                        break;
                    };
                    let now = self.clock.now_ms();
                    self.handle_transcript(&transcript, now);
                }

                Some(settings) = settings_rx.recv() => {
                    self.apply_settings(settings);
                }

                _ = next_tick(&mut self.ticker), if self.ticker.is_some() => {
                    let now = self.clock.now_ms();
                    self.on_tick(now);
                }

                _ = next_motivation(&mut self.motivation), if self.motivation.is_some() => {
                    self.on_motivation();
                }
            }

            self.sync_timers();
        }

        self.ticker = None;
        self.motivation = None;
        info!("session machine stopped");
    }

    /// Interpret a raw transcript and apply the resulting intent
    ///
    /// Returns the intent, or `None` if the transcript was debounced.
    pub fn handle_transcript(&mut self, raw: &str, now_ms: i64) -> Option<Intent> {
        let intent = self.interpreter.interpret(raw, now_ms)?;
        self.apply(intent.clone(), now_ms);
        Some(intent)
    }

    /// Apply a classified intent
    pub fn apply(&mut self, intent: Intent, now_ms: i64) {
        match intent {
            Intent::Start => self.start(now_ms),
            Intent::Stop => self.stop(now_ms),
            Intent::Reset => {
                info!("RESET command executed");
                self.reset(now_ms, false);
            }
            Intent::SetTask { name } => {
                let task = self.session.set_task(&name).to_string();
                info!(task = %task, "TASK command executed");
                self.emit(SessionEvent::TaskChanged { name: task.clone() });
                self.announce(format!("set to {}", task));
            }
            other if other.is_pass_through() => self.forward(other, now_ms),
            _ => debug!("unknown command ignored"),
        }
    }

    /// Refresh and publish elapsed time
    pub fn on_tick(&mut self, now_ms: i64) {
        if let Some(elapsed_ms) = self.session.tick(now_ms) {
            self.emit(SessionEvent::TimerTick { elapsed_ms });
        }
    }

    /// Publish a motivational message if there is any progress to cheer
    pub fn on_motivation(&mut self) {
        if self.records.is_empty() {
            return;
        }

        let message = report::pick_motivation(&mut rand::thread_rng());
        self.emit(SessionEvent::Motivation {
            message: message.to_string(),
        });
    }

    /// Replace the settings, persisting them if configured
    pub fn apply_settings(&mut self, settings: Settings) {
        if settings == self.settings {
            return;
        }

        info!(?settings, "settings updated");
        if let Some(path) = &self.settings_path {
            if let Err(e) = settings.save(path) {
                error!(error = %e, "failed to persist settings");
            }
        }

        self.settings = settings.clone();
        self.emit(SessionEvent::SettingsChanged { settings });
    }

    fn start(&mut self, now_ms: i64) {
        if !self.session.start(now_ms) {
            debug!("timer already running");
            return;
        }

        info!(
            state = %self.session.state(),
            task = %self.session.current_task(),
            question = self.session.question_number(),
            "START command executed"
        );
        self.emit(SessionEvent::StateChanged { running: true });
        self.announce("Timer started".to_string());
        self.chime(Cue::Start);
    }

    fn stop(&mut self, now_ms: i64) {
        let Some(record) = self.session.stop(now_ms) else {
            debug!("timer not running");
            return;
        };

        info!(
            state = %self.session.state(),
            seconds = record.time_seconds,
            "STOP command executed"
        );
        self.complete(record);
        self.emit(SessionEvent::QuestionChanged {
            number: self.session.question_number(),
        });
    }

    fn reset(&mut self, now_ms: i64, silent: bool) {
        if let Some(record) = self.session.reset(now_ms) {
            self.complete(record);
        }

        self.emit(SessionEvent::QuestionChanged { number: 1 });
        self.emit(SessionEvent::TaskChanged {
            name: DEFAULT_TASK.to_string(),
        });
        if !silent {
            self.announce("Timer reset".to_string());
        }
    }

    /// Record a completed session and announce it
    fn complete(&mut self, record: Record) {
        let seconds = record.time_seconds;
        self.records.append(record.clone());

        self.emit(SessionEvent::RecordAppended { record });
        self.emit(SessionEvent::StateChanged { running: false });
        self.announce(format!(
            "Timer stopped. Time taken: {} minutes {} seconds",
            seconds / 60,
            seconds % 60
        ));
        self.chime(Cue::Stop);
    }

    /// Hand an intent the machine does not own to collaborators
    fn forward(&mut self, intent: Intent, now_ms: i64) {
        info!(%intent, "command forwarded");

        if self.records.is_empty() {
            match intent {
                Intent::Export => self.announce("No data to export".to_string()),
                Intent::Certificate => self.announce(
                    "Complete some study sessions first to earn a certificate".to_string(),
                ),
                _ => {}
            }
        } else {
            match intent {
                Intent::Analysis => {
                    let stats =
                        report::Stats::from_records(self.records.records(), report::today());
                    if let Some(analysis) = report::Analysis::from_stats(&stats) {
                        self.announce(analysis.motivation);
                    }
                }
                Intent::Export => self.announce("Report exported successfully".to_string()),
                Intent::Certificate => {
                    self.announce("Certificate generated successfully".to_string())
                }
                _ => {}
            }
        }

        let export = intent == Intent::Export;
        self.emit(SessionEvent::IntentUnhandled { intent });

        if export && self.settings.auto_reset && !self.records.is_empty() {
            debug!("auto reset after export");
            self.reset(now_ms, true);
        }
    }

    fn announce(&self, text: String) {
        if self.settings.voice_feedback {
            self.emit(SessionEvent::Announcement { text });
        }
    }

    fn chime(&self, cue: Cue) {
        if self.settings.sound_notifications {
            self.emit(SessionEvent::Chime { cue });
        }
    }

    fn emit(&self, event: SessionEvent) {
        debug!(%event, "emitting event");
        let _ = self.event_tx.send(event);
    }

    /// Create or drop the recurring timers to match current state
    fn sync_timers(&mut self) {
        match (self.session.is_running(), self.ticker.is_some()) {
            (true, false) => {
                let mut ticker = time::interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                self.ticker = Some(ticker);
            }
            (false, true) => {
                self.ticker = None;
            }
            _ => {}
        }

        let wanted = self
            .settings
            .motivational_messages
            .then(|| self.settings.motivation_period());
        let current = self.motivation.as_ref().map(|(period, _)| *period);

        if wanted != current {
            self.motivation = wanted.map(|period| {
                debug!(?period, "motivation timer scheduled");
                let mut interval = time::interval_at(Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                (period, interval)
            });
        }
    }
}

#[cfg(test)]
impl SessionMachine {
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn records(&self) -> &[Record] {
        self.records.records()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn next_motivation(motivation: &mut Option<(Duration, Interval)>) {
    match motivation {
        Some((_, interval)) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
