//! Configuration loading and management

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Environment variable overriding the data directory
const DATA_DIR_ENV: &str = "VOICE_TIMER_DATA_DIR";
/// Environment variable overriding the IPC socket path
const SOCKET_ENV: &str = "VOICE_TIMER_SOCKET";

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for records and settings
    pub data_dir: PathBuf,

    /// Append-only record log
    pub records_path: PathBuf,

    /// Persisted user settings
    pub settings_path: PathBuf,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        let data_dir = match std::env::var_os(DATA_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir()
                .context("could not determine home directory")?
                .join(".local")
                .join("share")
                .join("voice-timer"),
        };

        let socket_path = std::env::var_os(SOCKET_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("daemon.sock"));

        Ok(Self::with_paths(data_dir, socket_path))
    }

    /// Build a configuration rooted at `data_dir`
    pub fn with_paths(data_dir: PathBuf, socket_path: PathBuf) -> Self {
        Self {
            records_path: data_dir.join("records.jsonl"),
            settings_path: data_dir.join("settings.json"),
            socket_path,
            data_dir,
        }
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("failed to create {}", self.data_dir.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_paths() {
        let config = Config::with_paths(PathBuf::from("/tmp/vt"), PathBuf::from("/tmp/vt.sock"));
        assert_eq!(config.records_path, PathBuf::from("/tmp/vt/records.jsonl"));
        assert_eq!(config.settings_path, PathBuf::from("/tmp/vt/settings.json"));
        assert_eq!(config.socket_path, PathBuf::from("/tmp/vt.sock"));
    }

    #[test]
    fn test_ensure_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let data_dir = dir.path().join("nested").join("data");
        let config = Config::with_paths(data_dir.clone(), data_dir.join("daemon.sock"));
        config.ensure_dirs().unwrap();
        assert!(data_dir.is_dir());
    }
}
