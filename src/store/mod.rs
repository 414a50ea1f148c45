//! Durable record storage
//!
//! The in-memory [`RecordLog`] is the source of truth while the daemon runs;
//! the [`RecordSink`] mirrors every append to disk.

mod jsonl;
mod record;

use std::path::PathBuf;

use tracing::error;

pub use jsonl::JsonlRecordStore;
pub use record::Record;

/// Errors raised by record persistence
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode record for {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Append-only persistence for completed records
pub trait RecordSink: Send {
    /// Load every previously persisted record, in completion order
    fn load(&self) -> Result<Vec<Record>, StoreError>;

    /// Persist one newly completed record
    fn append(&mut self, record: &Record) -> Result<(), StoreError>;
}

/// Ordered, append-only log of completed records
pub struct RecordLog {
    records: Vec<Record>,
    sink: Box<dyn RecordSink>,
}

impl RecordLog {
    /// Open a log, loading existing records from the sink
    pub fn open(sink: Box<dyn RecordSink>) -> Result<Self, StoreError> {
        let records = sink.load()?;
        Ok(Self { records, sink })
    }

    /// Append a record; a persistence failure is logged and the record is kept in memory
    pub fn append(&mut self, record: Record) {
        if let Err(e) = self.sink.append(&record) {
            error!(error = %e, question = record.question, "failed to persist record");
        }
        self.records.push(record);
    }

    /// All records in completion order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl std::fmt::Debug for RecordLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordLog")
            .field("records", &self.records.len())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::memory::MemorySink;
    use super::*;

    struct FailingSink;

    impl RecordSink for FailingSink {
        fn load(&self) -> Result<Vec<Record>, StoreError> {
            Ok(Vec::new())
        }

        fn append(&mut self, _record: &Record) -> Result<(), StoreError> {
            Err(StoreError::Io {
                path: PathBuf::from("/dev/full"),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            })
        }
    }

    #[test]
    fn test_open_loads_existing() {
        let sink = MemorySink::default();
        sink.persisted
            .lock()
            .unwrap()
            .push(Record::new("General", 1, 10, 0));

        let log = RecordLog::open(Box::new(sink)).unwrap();
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_append_mirrors_to_sink() {
        let sink = MemorySink::default();
        let persisted = sink.persisted.clone();
        let mut log = RecordLog::open(Box::new(sink)).unwrap();

        log.append(Record::new("General", 1, 10, 0));
        log.append(Record::new("General", 2, 20, 0));

        assert_eq!(log.len(), 2);
        assert_eq!(persisted.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_sink_failure_keeps_record() {
        let mut log = RecordLog::open(Box::new(FailingSink)).unwrap();
        log.append(Record::new("General", 1, 10, 0));
        assert_eq!(log.records()[0].time_seconds, 10);
    }
}
