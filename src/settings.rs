//! User-facing settings persisted as a flat JSON object

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Toggles consumed by the feedback and motivation features
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Speak confirmations for timer and task commands
    pub voice_feedback: bool,
    /// Reset the session after a report export
    pub auto_reset: bool,
    /// Play start/stop cues
    pub sound_notifications: bool,
    /// Periodic encouragement while records exist
    pub motivational_messages: bool,
    /// Minutes between motivational messages
    #[serde(alias = "motivationFrequency")]
    pub motivation_frequency_minutes: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            voice_feedback: true,
            auto_reset: false,
            sound_notifications: true,
            motivational_messages: true,
            motivation_frequency_minutes: 15,
        }
    }
}

impl Settings {
    /// Load settings, merging stored keys over defaults
    ///
    /// A missing or unreadable file yields the defaults.
    pub fn load(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(?path, "no settings file, using defaults");
                return Self::default();
            }
            Err(e) => {
                warn!(?path, error = %e, "failed to read settings, using defaults");
                return Self::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(?path, error = %e, "corrupt settings file, using defaults");
                Self::default()
            }
        }
    }

    /// Write settings atomically (temp file, then rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to encode settings")?;
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, path).with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }

    /// Period between motivational messages, at least one minute
    pub fn motivation_period(&self) -> Duration {
        Duration::from_secs(u64::from(self.motivation_frequency_minutes.max(1)) * 60)
    }
}
