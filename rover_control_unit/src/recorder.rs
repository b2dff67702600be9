//! Per-tick record sinks.
//!
//! The tick hands every [`LogRecord`] to a [`RecordSink`] and moves on;
//! a sink must never block it.
//!
//! - [`RecordLog`] keeps records in memory (tests, runs without a file).
//! - [`LogWriter`] queues records on a bounded channel drained by a writer
//!   thread appending JSON Lines. A full queue drops the record and counts it.

use crossbeam_channel::{Sender, TrySendError, bounded};
use rover_common::control_unit::record::LogRecord;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

use crate::cycle::CycleError;

/// Destination of per-tick log records.
pub trait RecordSink {
    /// Accept one record. Must not block.
    fn record(&mut self, record: LogRecord);

    /// Records lost so far.
    fn dropped(&self) -> u64 {
        0
    }
}

// ─── In-memory ──────────────────────────────────────────────────────

/// In-memory record list, optionally keeping only the newest `limit`.
#[derive(Debug, Default)]
pub struct RecordLog {
    records: VecDeque<LogRecord>,
    limit: Option<usize>,
    evicted: u64,
}

impl RecordLog {
    /// Keep at most `limit` records, oldest evicted first.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(limit),
            limit: Some(limit),
            evicted: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records older than the limit that were discarded.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<LogRecord> {
        self.records.into()
    }

    /// Write every record as JSON Lines.
    pub fn write_jsonl(&self, path: &Path) -> Result<(), CycleError> {
        let sink_err = |e: io::Error| CycleError::LogSink(format!("{}: {e}", path.display()));
        let mut out = BufWriter::new(File::create(path).map_err(sink_err)?);
        for record in &self.records {
            let line = record
                .to_json_line()
                .map_err(|e| CycleError::LogSink(e.to_string()))?;
            writeln!(out, "{line}").map_err(sink_err)?;
        }
        out.flush().map_err(sink_err)
    }
}

impl RecordSink for RecordLog {
    fn record(&mut self, record: LogRecord) {
        if let Some(limit) = self.limit {
            if self.records.len() >= limit && self.records.pop_front().is_some() {
                self.evicted += 1;
            }
        }
        self.records.push_back(record);
    }
}

// ─── JSON Lines writer ──────────────────────────────────────────────

/// Totals reported when a [`LogWriter`] is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterSummary {
    pub written: u64,
    pub dropped: u64,
}

/// Asynchronous JSON Lines writer.
pub struct LogWriter {
    path: PathBuf,
    tx: Option<Sender<LogRecord>>,
    handle: Option<JoinHandle<io::Result<u64>>>,
    dropped: u64,
}

impl LogWriter {
    /// Create (truncate) `path` and start the writer thread.
    ///
    /// # Errors
    /// `CycleError::LogSink` if the file or the thread cannot be created.
    pub fn create(path: &Path, capacity: usize) -> Result<Self, CycleError> {
        let file = File::create(path)
            .map_err(|e| CycleError::LogSink(format!("{}: {e}", path.display())))?;
        let (tx, rx) = bounded::<LogRecord>(capacity);

        let handle = thread::Builder::new()
            .name("rover-log".to_string())
            .spawn(move || -> io::Result<u64> {
                let mut out = BufWriter::new(file);
                let mut written = 0u64;
                for record in rx {
                    let line = record.to_json_line().map_err(io::Error::other)?;
                    writeln!(out, "{line}")?;
                    written += 1;
                }
                out.flush()?;
                Ok(written)
            })
            .map_err(|e| CycleError::LogSink(format!("writer thread: {e}")))?;

        info!("Recording to {} (queue {capacity})", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            tx: Some(tx),
            handle: Some(handle),
            dropped: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the queue, wait for the writer to drain it and report totals.
    ///
    /// # Errors
    /// `CycleError::LogSink` if the writer hit an I/O error or panicked.
    pub fn finish(mut self) -> Result<WriterSummary, CycleError> {
        self.tx = None;
        let handle = self
            .handle
            .take()
            .ok_or_else(|| CycleError::LogSink("writer already closed".to_string()))?;
        let written = handle
            .join()
            .map_err(|_| CycleError::LogSink("writer thread panicked".to_string()))?
            .map_err(|e| CycleError::LogSink(format!("{}: {e}", self.path.display())))?;
        if self.dropped > 0 {
            warn!("{} log records dropped (queue full)", self.dropped);
        }
        Ok(WriterSummary {
            written,
            dropped: self.dropped,
        })
    }
}

impl RecordSink for LogWriter {
    fn record(&mut self, record: LogRecord) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped += 1;
                if self.dropped <= 10 || self.dropped % 1000 == 0 {
                    warn!("Log record dropped ({} total)", self.dropped);
                }
            }
        }
    }

    fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        self.tx = None;
        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(Ok(written)) => debug!("Log writer closed after {written} records"),
                Ok(Err(e)) => warn!("Log writer failed: {e}"),
                Err(_) => warn!("Log writer thread panicked"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rover_common::control_unit::record::MechanismId;
    use rover_common::control_unit::state::{ControllerState, DriveMode};
    use rover_common::hal::types::{GroupReadings, InputSnapshot, OutputCommand, Setpoint, TickStamp};
    use rover_hal::Recording;

    fn record(tick: u64) -> LogRecord {
        LogRecord::new(
            MechanismId::Drive,
            InputSnapshot::new(TickStamp::new(tick, 20_000), GroupReadings::new(), Setpoint::default()),
            OutputCommand::neutral(2),
            ControllerState::Drive {
                mode: DriveMode::OpenLoop,
            },
        )
    }

    #[test]
    fn bounded_log_evicts_oldest() {
        let mut log = RecordLog::with_limit(3);
        for tick in 0..5 {
            log.record(record(tick));
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.evicted(), 2);
        assert_eq!(log.iter().next().unwrap().tick(), 2);
    }

    #[test]
    fn writer_produces_loadable_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.jsonl");
        let mut writer = LogWriter::create(&path, 64).unwrap();
        for tick in 0..10 {
            writer.record(record(tick));
        }
        let summary = writer.finish().unwrap();
        assert_eq!(summary, WriterSummary { written: 10, dropped: 0 });

        let recording = Recording::load(&path).unwrap();
        assert_eq!(recording.records(MechanismId::Drive).len(), 10);
        assert_eq!(recording.records(MechanismId::Drive)[9], record(9));
    }

    #[test]
    fn unwritable_path_is_a_sink_error() {
        assert!(matches!(
            LogWriter::create(Path::new("/nonexistent/dir/run.jsonl"), 8),
            Err(CycleError::LogSink(_))
        ));
    }

    #[test]
    fn in_memory_log_dumps_kept_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tail.jsonl");
        let mut log = RecordLog::with_limit(4);
        for tick in 0..6 {
            log.record(record(tick));
        }
        log.write_jsonl(&path).unwrap();

        let drive = Recording::load(&path).unwrap().take(MechanismId::Drive);
        assert_eq!(drive.len(), 4);
        assert_eq!(drive[0], record(2));
        assert_eq!(drive[3], record(5));
    }

    #[test]
    fn dump_to_missing_directory_fails() {
        let mut log = RecordLog::default();
        log.record(record(0));
        assert!(matches!(
            log.write_jsonl(Path::new("/nonexistent/dir/tail.jsonl")),
            Err(CycleError::LogSink(_))
        ));
    }
}
