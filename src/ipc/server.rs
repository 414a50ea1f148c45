//! Unix domain socket server for IPC
//!
//! Provides request-response communication and push notifications of
//! session events to subscribed clients. The server only keeps a read
//! model; every change goes through the session machine's channels.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, error, info, warn};

use crate::events::SessionEvent;
use crate::report::{self, Analysis, Certificate, ExportReport, Stats};
use crate::settings::Settings;
use crate::state::State;
use crate::store::Record;

use super::protocol::{DaemonStatus, Request, Response, MAX_MESSAGE_LEN};

/// Channels into the session machine
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    pub transcript_tx: mpsc::Sender<String>,
    pub settings_tx: mpsc::Sender<Settings>,
    pub event_tx: broadcast::Sender<SessionEvent>,
}

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    state: Arc<RwLock<ServerState>>,
    dispatcher: DispatcherHandle,
    shutdown_tx: broadcast::Sender<()>,
}

/// Read model kept in sync with session events
struct ServerState {
    status: DaemonStatus,
    start_time: std::time::Instant,
    records: Vec<Record>,
    settings: Settings,
}

impl ServerState {
    fn apply(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::StateChanged { running } => {
                let state = if *running { State::Running } else { State::Idle };
                self.status.mode = state.into();
                if !running {
                    self.status.elapsed_ms = 0;
                }
            }
            SessionEvent::TimerTick { elapsed_ms } => self.status.elapsed_ms = *elapsed_ms,
            SessionEvent::TaskChanged { name } => self.status.current_task = name.clone(),
            SessionEvent::QuestionChanged { number } => self.status.question_number = *number,
            SessionEvent::RecordAppended { record } => {
                self.records.push(record.clone());
                self.status.record_count = self.records.len();
            }
            SessionEvent::SettingsChanged { settings } => self.settings = settings.clone(),
            SessionEvent::RecognitionUnavailable { .. } => self.status.voice_available = false,
            SessionEvent::IntentUnhandled { .. }
            | SessionEvent::Announcement { .. }
            | SessionEvent::Chime { .. }
            | SessionEvent::Motivation { .. } => {}
        }
    }

    fn stats(&self) -> Stats {
        Stats::from_records(&self.records, report::today())
    }
}

impl Server {
    /// Create a new IPC server seeded with the persisted records and settings
    pub fn new(
        socket_path: &Path,
        dispatcher: DispatcherHandle,
        records: Vec<Record>,
        settings: Settings,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        let status = DaemonStatus {
            record_count: records.len(),
            ..DaemonStatus::default()
        };
        let state = Arc::new(RwLock::new(ServerState {
            status,
            start_time: std::time::Instant::now(),
            records,
            settings,
        }));

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener: Some(listener),
            state,
            dispatcher,
            shutdown_tx,
        })
    }

    /// Fold a session event into the read model
    pub async fn apply_event(&self, event: &SessionEvent) {
        self.state.write().await.apply(event);
    }

    /// Replace the cached records after events were missed
    pub async fn resync_records(&self, records: Vec<Record>) {
        let mut state = self.state.write().await;
        debug!(
            cached = state.records.len(),
            persisted = records.len(),
            "resyncing record cache"
        );
        state.status.record_count = records.len();
        state.records = records;
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        let listener = self.listener.as_ref().context("server not initialized")?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let state = Arc::clone(&self.state);
                    let dispatcher = self.dispatcher.clone();
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, state, dispatcher) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client(
        stream: UnixStream,
        state: Arc<RwLock<ServerState>>,
        dispatcher: DispatcherHandle,
    ) -> Result<()> {
        let (mut reader, mut writer) = stream.into_split();

        // Reads run in their own task so a pushed notification never
        // interrupts a partially received frame
        let (request_tx, mut request_rx) = mpsc::channel::<Result<Request, serde_json::Error>>(8);
        let read_task = tokio::spawn(async move {
            loop {
                match read_message(&mut reader).await {
                    Ok(Some(body)) => {
                        let parsed = serde_json::from_slice::<Request>(&body);
                        if request_tx.send(parsed).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("client disconnected");
                        break;
                    }
                    Err(e) => {
                        warn!(?e, "failed to read request");
                        break;
                    }
                }
            }
        });

        let mut events: Option<broadcast::Receiver<SessionEvent>> = None;
        let result = loop {
            tokio::select! {
                request = request_rx.recv() => {
                    let Some(request) = request else {
                        break Ok(());
                    };

                    let response = match request {
                        Ok(request) => {
                            debug!(?request, "received request");
                            let subscribe = matches!(request, Request::Subscribe);
                            if subscribe && events.is_none() {
                                events = Some(dispatcher.event_tx.subscribe());
                                debug!("client subscribed to notifications");
                            }
                            Self::process_request(request, &state, &dispatcher).await
                        }
                        Err(e) => Response::error("invalid_request", e.to_string()),
                    };

                    if let Err(e) = send_message(&mut writer, &response).await {
                        break Err(e);
                    }
                }

                event = next_event(&mut events), if events.is_some() => {
                    match event {
                        Ok(event) => {
                            let notification = Response::Notification { event };
                            if let Err(e) = send_message(&mut writer, &notification).await {
                                break Err(e);
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(skipped = n, "subscriber lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            events = None;
                        }
                    }
                }
            }
        };

        read_task.abort();
        result
    }

    /// Process a request and return a response
    async fn process_request(
        request: Request,
        state: &Arc<RwLock<ServerState>>,
        dispatcher: &DispatcherHandle,
    ) -> Response {
        match request {
            Request::Ping => Response::Pong,

            Request::GetStatus => {
                let mut state = state.write().await;
                state.status.uptime_secs = state.start_time.elapsed().as_secs();
                Response::Status(state.status.clone())
            }

            Request::Transcript { text } => {
                info!(%text, "transcript received via IPC");
                match dispatcher.transcript_tx.send(text).await {
                    Ok(()) => Response::Accepted,
                    Err(_) => Response::error("unavailable", "session machine is not running"),
                }
            }

            Request::GetHistory => Response::History {
                records: state.read().await.records.clone(),
            },

            Request::GetStats => {
                let stats = state.read().await.stats();
                Response::Stats {
                    total: stats.total_display(),
                    average: stats.average_display(),
                    stats,
                }
            }

            Request::GetAnalysis => {
                let stats = state.read().await.stats();
                Response::Analysis {
                    analysis: Analysis::from_stats(&stats),
                }
            }

            Request::GetCertificate => {
                let stats = state.read().await.stats();
                Response::Certificate {
                    certificate: Certificate::from_stats(&stats, report::today()),
                }
            }

            Request::GetReport => {
                let state = state.read().await;
                Response::Report {
                    report: ExportReport::build(&state.records, report::today()),
                }
            }

            Request::GetSettings => Response::Settings {
                settings: state.read().await.settings.clone(),
            },

            Request::UpdateSettings { settings } => {
                match dispatcher.settings_tx.send(settings).await {
                    Ok(()) => Response::Accepted,
                    Err(_) => Response::error("unavailable", "session machine is not running"),
                }
            }

            Request::Subscribe => Response::Subscribed,
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

async fn next_event(
    events: &mut Option<broadcast::Receiver<SessionEvent>>,
) -> Result<SessionEvent, broadcast::error::RecvError> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Read one length-prefixed frame; `None` on clean disconnect
async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_LEN {
        bail!("message too large ({len} bytes)");
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

/// Send a length-prefixed JSON message
async fn send_message<W, T>(writer: &mut W, msg: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: serde::Serialize,
{
    let msg_bytes = serde_json::to_vec(msg)?;
    let msg_len = (msg_bytes.len() as u32).to_le_bytes();

    writer.write_all(&msg_len).await?;
    writer.write_all(&msg_bytes).await?;

    Ok(())
}
