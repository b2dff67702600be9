//! Per-tick log record.
//!
//! One record per mechanism per tick, serialized as one JSON line. The
//! replay backend re-ingests exactly this schema, so every field a
//! snapshot carries is present here.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::control_unit::state::ControllerState;
use crate::hal::types::{GroupReading, InputSnapshot, OutputCommand, Setpoint};

/// Mechanism a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MechanismId {
    Drive,
    Arm,
}

impl MechanismId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Drive => "drive",
            Self::Arm => "arm",
        }
    }
}

impl fmt::Display for MechanismId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot, commanded output and controller state of one mechanism for one tick.
///
/// The output is what the controller commanded, whether or not the port
/// was connected to apply it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub mechanism: MechanismId,
    #[serde(flatten)]
    pub snapshot: InputSnapshot,
    pub output: OutputCommand,
    pub controller_state: ControllerState,
}

impl LogRecord {
    pub fn new(
        mechanism: MechanismId,
        snapshot: InputSnapshot,
        output: OutputCommand,
        controller_state: ControllerState,
    ) -> Self {
        Self {
            mechanism,
            snapshot,
            output,
            controller_state,
        }
    }

    #[inline]
    pub fn tick(&self) -> u64 {
        self.snapshot.tick()
    }

    #[inline]
    pub fn timestamp_us(&self) -> u64 {
        self.snapshot.timestamp_us()
    }

    #[inline]
    pub fn groups(&self) -> &[GroupReading] {
        self.snapshot.groups()
    }

    #[inline]
    pub fn setpoint(&self) -> Setpoint {
        self.snapshot.setpoint()
    }

    /// Serialize as one JSON line (no trailing newline).
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse one JSON line.
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}
