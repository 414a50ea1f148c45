//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::events::SessionEvent;
use crate::report::{Analysis, Certificate, ExportReport, Stats};
use crate::settings::Settings;
use crate::state::{State, DEFAULT_TASK};
use crate::store::Record;

/// Largest accepted message body
pub const MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// Timer mode as seen by clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Timer stopped
    #[default]
    Idle,
    /// Timer counting
    Running,
}

/// Convert internal State to IPC Mode
impl From<State> for Mode {
    fn from(state: State) -> Self {
        match state {
            State::Idle => Mode::Idle,
            State::Running => Mode::Running,
        }
    }
}

/// Requests from clients to the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Ping to check connectivity
    Ping,

    /// Request current daemon status
    GetStatus,

    /// Inject a transcript as if it had been spoken
    Transcript { text: String },

    /// All completed records
    GetHistory,

    /// Aggregate statistics
    GetStats,

    /// Coaching feedback
    GetAnalysis,

    /// Achievement certificate data
    GetCertificate,

    /// Full export report data
    GetReport,

    /// Current settings
    GetSettings,

    /// Replace the settings
    UpdateSettings { settings: Settings },

    /// Subscribe to session event notifications
    Subscribe,
}

/// Responses from the daemon to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Pong response to ping
    Pong,

    /// Current daemon status
    Status(DaemonStatus),

    /// Input forwarded to the session machine
    Accepted,

    History { records: Vec<Record> },

    Stats {
        stats: Stats,
        /// `Hh Mm`
        total: String,
        /// `M:SS`
        average: String,
    },

    /// `None` until at least one session is recorded
    Analysis { analysis: Option<Analysis> },

    Certificate { certificate: Option<Certificate> },

    Report { report: Option<ExportReport> },

    Settings { settings: Settings },

    /// Subscription confirmed
    Subscribed,

    /// Pushed to subscribed clients
    Notification { event: SessionEvent },

    /// Error response
    Error { code: String, message: String },
}

impl Response {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Response::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Full daemon status snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Daemon version
    pub version: String,

    /// Timer mode
    pub mode: Mode,

    /// Elapsed milliseconds in the current run (as of the last tick)
    pub elapsed_ms: i64,

    pub current_task: String,

    pub question_number: u32,

    /// Completed records so far
    pub record_count: usize,

    /// Whether voice input is still usable
    pub voice_available: bool,

    /// Uptime in seconds
    pub uptime_secs: u64,
}

impl Default for DaemonStatus {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            mode: Mode::default(),
            elapsed_ms: 0,
            current_task: DEFAULT_TASK.to_string(),
            question_number: 1,
            record_count: 0,
            voice_available: true,
            uptime_secs: 0,
        }
    }
}
