//! Transcript classification
//!
//! Maps a normalized transcript to a single [`Intent`] using an ordered rule
//! list. The first matching rule wins, so earlier rules shadow later ones.

use serde::{Deserialize, Serialize};

/// A discrete user action derived from a spoken command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    Start,
    Stop,
    Reset,
    /// Change the current task label
    SetTask { name: String },
    Certificate,
    Fullscreen,
    Analysis,
    Export,
    Settings,
    ToggleTheme,
    Unknown,
}

impl Intent {
    /// Whether the intent is forwarded to external collaborators
    /// instead of being handled by the session state machine
    pub fn is_pass_through(&self) -> bool {
        matches!(
            self,
            Intent::Certificate
                | Intent::Fullscreen
                | Intent::Analysis
                | Intent::Export
                | Intent::Settings
                | Intent::ToggleTheme
        )
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::Start => write!(f, "START"),
            Intent::Stop => write!(f, "STOP"),
            Intent::Reset => write!(f, "RESET"),
            Intent::SetTask { name } => write!(f, "TASK ({})", name),
            Intent::Certificate => write!(f, "CERTIFICATE"),
            Intent::Fullscreen => write!(f, "FULLSCREEN"),
            Intent::Analysis => write!(f, "ANALYSIS"),
            Intent::Export => write!(f, "EXPORT"),
            Intent::Settings => write!(f, "SETTINGS"),
            Intent::ToggleTheme => write!(f, "THEME"),
            Intent::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Prefix that introduces a task name
const TASK_PREFIX: &str = "task ";

/// Classify a normalized transcript
///
/// Total over all inputs: anything that matches no rule is [`Intent::Unknown`].
pub fn classify(normalized: &str) -> Intent {
    let text = normalized;
    let first = first_word(text);

    if text == "start" || first == "start" {
        Intent::Start
    } else if text == "stop" || first == "stop" {
        Intent::Stop
    } else if text == "reset" || first == "reset" {
        Intent::Reset
    } else if let Some(rest) = text.strip_prefix(TASK_PREFIX) {
        let name = rest.trim();
        if name.is_empty() {
            Intent::Unknown
        } else {
            Intent::SetTask {
                name: name.to_string(),
            }
        }
    } else if text == "certificate" || first == "certificate" || text == "download certificate" {
        Intent::Certificate
    } else if text == "full" || text == "fullscreen" || first == "full" {
        Intent::Fullscreen
    } else if text.contains("analysis") || text.contains("analyze") {
        Intent::Analysis
    } else if text == "export" || first == "export" {
        Intent::Export
    } else if text == "settings" || first == "settings" {
        Intent::Settings
    } else if text.contains("theme") || text.contains("toggle") {
        Intent::ToggleTheme
    } else {
        Intent::Unknown
    }
}

/// The substring before the first space, or the whole string
fn first_word(text: &str) -> &str {
    text.split(' ').next().unwrap_or(text)
}
