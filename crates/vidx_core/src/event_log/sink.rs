//! Event log sinks.

use super::EventLogRecord;
use crate::error::{CoreError, CoreResult};
use parking_lot::{Mutex, RwLock};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

/// Destination of event log records.
///
/// Implementations must be append-only: a record, once accepted, is never
/// modified or reordered.
pub trait EventLogSink: Send + Sync {
    /// Appends one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be stored.
    fn add(&self, record: EventLogRecord) -> CoreResult<()>;
}

/// An event log held in memory.
///
/// Keeps a bounded history and forwards every record to subscribers.
pub struct MemoryEventLog {
    history: RwLock<Vec<EventLogRecord>>,
    subscribers: RwLock<Vec<Sender<EventLogRecord>>>,
    max_history: usize,
}

impl MemoryEventLog {
    /// Creates an event log with the default history limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_history(10_000)
    }

    /// Creates an event log keeping at most `max_history` records.
    #[must_use]
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            history: RwLock::new(Vec::new()),
            subscribers: RwLock::new(Vec::new()),
            max_history,
        }
    }

    /// Subscribes to records appended from now on.
    pub fn subscribe(&self) -> Receiver<EventLogRecord> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Returns a copy of the retained records, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<EventLogRecord> {
        self.history.read().clone()
    }

    /// Returns records stamped strictly after `since_micros`, up to `limit`.
    #[must_use]
    pub fn poll(&self, since_micros: u64, limit: usize) -> Vec<EventLogRecord> {
        self.history
            .read()
            .iter()
            .filter(|r| r.event_time_microseconds > since_micros)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Number of retained records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.read().len()
    }

    /// Returns true if no record is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLogSink for MemoryEventLog {
    fn add(&self, record: EventLogRecord) -> CoreResult<()> {
        {
            let mut history = self.history.write();
            history.push(record.clone());
            if history.len() > self.max_history {
                let excess = history.len() - self.max_history;
                history.drain(0..excess);
            }
        }

        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(record.clone()).is_ok());
        Ok(())
    }
}

/// An event log appended to a file, one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesEventLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesEventLog {
    /// Opens (or creates) the log file for appending.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or its parent directory cannot be created.
    pub fn open(path: &Path) -> CoreResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every record from a log file.
    ///
    /// Blank lines are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a line is not a record.
    pub fn read_all(path: &Path) -> CoreResult<Vec<EventLogRecord>> {
        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|e| {
                CoreError::event_log(format!("{}:{}: {e}", path.display(), number + 1))
            })?;
            records.push(record);
        }
        Ok(records)
    }
}

impl EventLogSink for JsonLinesEventLog {
    fn add(&self, record: EventLogRecord) -> CoreResult<()> {
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let mut file = self.file.lock();
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_log::{EventType, ExecutionStatus};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};
    use tempfile::tempdir;

    fn event(micros: u64, event_type: EventType) -> EventLogRecord {
        EventLogRecord::at(
            UNIX_EPOCH + Duration::from_micros(micros),
            "db",
            "t",
            "all_1_1_0",
            "all",
            event_type,
            &ExecutionStatus::ok(),
        )
    }

    #[test]
    fn history_is_bounded() {
        let log = MemoryEventLog::with_max_history(3);
        for i in 1..=5 {
            log.add(event(i * 1_000_000, EventType::LoadStart)).unwrap();
        }
        let records = log.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].event_time, 3);
    }

    #[test]
    fn poll_after_cursor() {
        let log = MemoryEventLog::new();
        for i in 1..=5 {
            log.add(event(i, EventType::LoadStart)).unwrap();
        }
        let polled = log.poll(2, 2);
        assert_eq!(polled.len(), 2);
        assert_eq!(polled[0].event_time_microseconds, 3);
    }

    #[test]
    fn subscribers_receive_records() {
        let log = Arc::new(MemoryEventLog::new());
        let rx = log.subscribe();

        let writer = Arc::clone(&log);
        let handle = thread::spawn(move || {
            writer.add(event(1, EventType::BuildSucceed)).unwrap();
        });

        let received = rx.recv_timeout(Duration::from_millis(500)).unwrap();
        assert_eq!(received.event_type, EventType::BuildSucceed);
        handle.join().unwrap();

        drop(rx);
        log.add(event(2, EventType::Unload)).unwrap();
        assert_eq!(log.subscribers.read().len(), 0);
    }

    #[test]
    fn json_lines_append_and_read() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("logs/events.jsonl");

        {
            let log = JsonLinesEventLog::open(&path).unwrap();
            log.add(event(1, EventType::BuildStart)).unwrap();
        }
        {
            let log = JsonLinesEventLog::open(&path).unwrap();
            let rec = EventLogRecord::at(
                SystemTime::now(),
                "db",
                "t",
                "all_1_1_0",
                "all",
                EventType::BuildError,
                &ExecutionStatus::error(49, "logical error"),
            );
            log.add(rec).unwrap();
        }

        let records = JsonLinesEventLog::read_all(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event_type, EventType::BuildStart);
        assert_eq!(records[1].error, 49);
        assert_eq!(records[1].exception, "logical error");
    }

    #[test]
    fn malformed_line_is_reported() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("events.jsonl");
        fs::write(&path, "{\"database\":1}\n").unwrap();

        assert!(matches!(
            JsonLinesEventLog::read_all(&path),
            Err(CoreError::EventLog { .. })
        ));
    }

    #[test]
    fn columns_follow_field_order() {
        let json = serde_json::to_string(&event(1, EventType::Cleared)).unwrap();
        let mut last = 0;
        for column in crate::event_log::COLUMNS {
            let pos = json.find(&format!("\"{column}\"")).unwrap();
            assert!(pos >= last);
            last = pos;
        }
    }
}
