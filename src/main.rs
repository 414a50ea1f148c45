//! voice-timer-daemon: voice-controlled study timer
//!
//! Spoken commands ("start", "stop", "task X", "reset", ...) drive a
//! stopwatch-style session tracker. The daemon provides:
//! - Transcript intake from an external speech-to-text process (stdin)
//! - Debounced command classification
//! - A single-writer session state machine with persisted records
//! - IPC server for status, reports, settings and event subscriptions
//!
//! Speech-to-text, rendering and file export encoding live outside.

mod command;
mod config;
mod events;
mod ipc;
mod lifecycle;
mod recognition;
mod report;
mod settings;
mod state;
mod store;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::events::SessionEvent;
use crate::ipc::{DispatcherHandle, Server};
use crate::lifecycle::ShutdownSignal;
use crate::recognition::{LineSource, RecognitionSupervisor};
use crate::settings::Settings;
use crate::state::{SessionMachine, SystemClock};
use crate::store::{JsonlRecordStore, RecordLog, RecordSink};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "voice-timer-daemon starting"
    );

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(?config.data_dir, ?config.socket_path, "configuration loaded");

    let settings = Settings::load(&config.settings_path);
    let records = RecordLog::open(Box::new(JsonlRecordStore::new(&config.records_path)))
        .context("failed to load records")?;
    info!(records = records.len(), ?settings, "session data loaded");

    // Create shutdown signal handler
    let shutdown = ShutdownSignal::new();

    // Create channels for inter-component communication
    // Recognition + IPC -> session machine
    let (transcript_tx, transcript_rx) = mpsc::channel::<String>(32);
    let (settings_tx, settings_rx) = mpsc::channel::<Settings>(8);
    // Session machine -> IPC server and subscribers
    let (event_tx, _event_rx) = broadcast::channel::<SessionEvent>(1024);

    // Create IPC server before the machine takes ownership of the records
    let dispatcher = DispatcherHandle {
        transcript_tx: transcript_tx.clone(),
        settings_tx,
        event_tx: event_tx.clone(),
    };
    let server = Server::new(
        &config.socket_path,
        dispatcher,
        records.records().to_vec(),
        settings.clone(),
    )?;

    // Create the session machine
    let mut session_machine =
        SessionMachine::new(records, settings, Arc::new(SystemClock), event_tx.clone())
            .with_settings_path(config.settings_path.clone());

    // Subscribe to session events for IPC updates
    let mut ipc_event_rx = event_tx.subscribe();
    let server_for_events = &server;
    let records_path = config.records_path.clone();

    // Recognition supervisor reads finalized transcripts from stdin
    let supervisor = RecognitionSupervisor::new(
        LineSource::new(BufReader::new(tokio::io::stdin())),
        transcript_tx,
        event_tx.clone(),
    );
    let recognition = tokio::spawn(supervisor.run());

    info!("daemon initialized, entering main loop");

    // Main event loop
    tokio::select! {
        // Run the session machine (processes transcripts, settings, ticks)
        _ = session_machine.run(transcript_rx, settings_rx) => {
            info!("session machine exited");
        }

        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Keep the IPC read model in sync with session events
        _ = async {
            loop {
                match ipc_event_rx.recv().await {
                    Ok(event) => {
                        if !matches!(event, SessionEvent::TimerTick { .. }) {
                            info!(%event, "session event");
                        }
                        server_for_events.apply_event(&event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Missed appends would leave history stale; reload it
                        warn!(skipped = n, "session event receiver lagged");
                        match JsonlRecordStore::new(&records_path).load() {
                            Ok(records) => server_for_events.resync_records(records).await,
                            Err(e) => error!(error = %e, "failed to reload records"),
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        } => {
            info!("session event handler exited");
        }

        // Wait for shutdown signal
        result = shutdown.wait() => {
            match result {
                Ok(()) => info!("shutdown signal received"),
                Err(e) => error!(?e, "shutdown signal handler failed"),
            }
        }
    }

    // Cleanup
    info!("shutting down...");

    recognition.abort();
    server.shutdown().await;

    info!("voice-timer-daemon stopped");

    Ok(())
}
