//! Recorded log reader.
//!
//! A recording is the JSON Lines file the scheduler writes: one
//! [`LogRecord`] per mechanism per tick. Loading splits it into one stream
//! per mechanism, each in tick order.

use rover_common::control_unit::record::{LogRecord, MechanismId};
use rover_common::hal::driver::HalError;
use std::path::Path;
use tracing::info;

/// Per-mechanism record streams of one recorded run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recording {
    drive: Vec<LogRecord>,
    arm: Vec<LogRecord>,
}

impl Recording {
    /// Read a JSON Lines recording from disk.
    ///
    /// # Errors
    /// `HalError::RecordingError` if the file cannot be read or a line does
    /// not parse as a log record.
    pub fn load(path: &Path) -> Result<Self, HalError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HalError::RecordingError(format!("cannot read {}: {e}", path.display()))
        })?;
        let recording = Self::parse(&content)?;
        info!(
            "Loaded recording {}: {} drive, {} arm records",
            path.display(),
            recording.drive.len(),
            recording.arm.len()
        );
        Ok(recording)
    }

    /// Parse JSON Lines content. Blank lines are skipped.
    pub fn parse(content: &str) -> Result<Self, HalError> {
        let mut records = Vec::new();
        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record = LogRecord::from_json_line(line)
                .map_err(|e| HalError::RecordingError(format!("line {}: {e}", index + 1)))?;
            records.push(record);
        }
        Ok(Self::from_records(records))
    }

    /// Split records by mechanism, keeping their relative order.
    pub fn from_records(records: impl IntoIterator<Item = LogRecord>) -> Self {
        let mut recording = Self::default();
        for record in records {
            match record.mechanism {
                MechanismId::Drive => recording.drive.push(record),
                MechanismId::Arm => recording.arm.push(record),
            }
        }
        recording
    }

    /// Records of one mechanism.
    pub fn records(&self, mechanism: MechanismId) -> &[LogRecord] {
        match mechanism {
            MechanismId::Drive => &self.drive,
            MechanismId::Arm => &self.arm,
        }
    }

    /// Move one mechanism's stream out of the recording.
    pub fn take(&mut self, mechanism: MechanismId) -> Vec<LogRecord> {
        match mechanism {
            MechanismId::Drive => std::mem::take(&mut self.drive),
            MechanismId::Arm => std::mem::take(&mut self.arm),
        }
    }

    /// Total records across mechanisms.
    pub fn len(&self) -> usize {
        self.drive.len() + self.arm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
