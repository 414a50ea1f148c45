//! Newline-delimited JSON record file
//!
//! Each completed record is appended as a single line, so a crash mid-write
//! can lose at most the line being written.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::record::Record;
use super::{RecordSink, StoreError};

/// Record sink backed by a `.jsonl` file
#[derive(Debug, Clone)]
pub struct JsonlRecordStore {
    path: PathBuf,
}

impl JsonlRecordStore {
    /// Create a store at `path`; the file is created on first append
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file
    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl RecordSink for JsonlRecordStore {
    fn load(&self) -> Result<Vec<Record>, StoreError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = ?self.path, "no record file yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let mut records = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| self.io_error(e))?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<Record>(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(
                        path = ?self.path,
                        line = index + 1,
                        error = %e,
                        "skipping corrupt record"
                    );
                }
            }
        }

        Ok(records)
    }

    fn append(&mut self, record: &Record) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(record).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;

        file.write_all(line.as_bytes()).map_err(|e| self.io_error(e))?;
        file.flush().map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonlRecordStore::new(dir.path().join("records.jsonl"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_append_preserves_order() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonlRecordStore::new(dir.path().join("records.jsonl"));

        store.append(&Record::new("Algebra", 1, 30, 1_000)).unwrap();
        store.append(&Record::new("Algebra", 2, 45, 2_000)).unwrap();
        store.append(&Record::new("Physics", 3, 60, 3_000)).unwrap();

        let reopened = JsonlRecordStore::new(store.path());
        let records = reopened.load().unwrap();
        let questions: Vec<u32> = records.iter().map(|r| r.question).collect();
        assert_eq!(questions, vec![1, 2, 3]);
        assert_eq!(records[2].task, "Physics");
    }

    #[test]
    fn test_corrupt_line_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.jsonl");
        let good = serde_json::to_string(&Record::new("General", 1, 5, 0)).unwrap();
        fs::write(&path, format!("{good}\nnot json\n\n{good}\n")).unwrap();

        let records = JsonlRecordStore::new(&path).load().unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_append_to_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonlRecordStore::new(dir.path().join("nope").join("records.jsonl"));
        let err = store.append(&Record::new("General", 1, 5, 0)).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
