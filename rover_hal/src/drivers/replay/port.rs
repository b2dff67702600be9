//! Replay port.
//!
//! Serves one recorded record per tick in place of hardware. The cursor
//! advances in `tick_internal`, so the snapshot captured in tick `n` holds
//! exactly the readings recorded in tick `n`. Commands are not applied to
//! anything; they are compared with the recorded output and every mismatch
//! is counted as a divergence.

use rover_common::control_unit::record::{LogRecord, MechanismId};
use rover_common::hal::driver::{HalError, HardwarePort};
use rover_common::hal::types::{GroupReadings, OutputCommand, Setpoint};
use std::time::Duration;
use tracing::{info, warn};

/// Recorded readings behind the port capability.
#[derive(Debug, Clone)]
pub struct ReplayPort {
    mechanism: MechanismId,
    records: Vec<LogRecord>,
    cursor: Option<usize>,
    exhausted: bool,
    divergences: u64,
}

impl ReplayPort {
    /// # Errors
    /// `HalError::RecordingError` if the stream is empty.
    pub fn new(mechanism: MechanismId, records: Vec<LogRecord>) -> Result<Self, HalError> {
        if records.is_empty() {
            return Err(HalError::RecordingError(format!(
                "recording has no {mechanism} records"
            )));
        }
        info!("Replay port for {mechanism}: {} records", records.len());
        Ok(Self {
            mechanism,
            records,
            cursor: None,
            exhausted: false,
            divergences: 0,
        })
    }

    fn current(&self) -> &LogRecord {
        // `new` guarantees at least one record.
        &self.records[self.cursor.unwrap_or(0).min(self.records.len() - 1)]
    }

    /// Record served for the current tick.
    pub fn current_record(&self) -> &LogRecord {
        self.current()
    }

    /// Dispatched outputs that differed from the recorded ones.
    pub fn divergences(&self) -> u64 {
        self.divergences
    }

    /// The recording ran out; the last record is being repeated.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Records not yet served.
    pub fn remaining(&self) -> usize {
        match self.cursor {
            None => self.records.len(),
            Some(i) => self.records.len() - 1 - i.min(self.records.len() - 1),
        }
    }
}

impl HardwarePort for ReplayPort {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn group_count(&self) -> usize {
        self.current().groups().len()
    }

    fn tick_internal(&mut self, _dt: Duration) {
        self.cursor = Some(match self.cursor {
            None => 0,
            Some(i) if i + 1 < self.records.len() => i + 1,
            Some(i) => {
                if !self.exhausted {
                    warn!(
                        "Replay of {} exhausted after {} records; repeating the last one",
                        self.mechanism,
                        self.records.len()
                    );
                    self.exhausted = true;
                }
                i
            }
        });
    }

    fn read(&mut self) -> GroupReadings {
        let mut readings = GroupReadings::new();
        for group in self.current().groups() {
            let _ = readings.push(group.clone());
        }
        readings
    }

    fn set_voltage(&mut self, _group: usize, _volts: f64) {}

    fn set_velocity(&mut self, _group: usize, _reference: f64, _feedforward_volts: f64) {}

    fn recorded_setpoint(&self) -> Option<Setpoint> {
        Some(self.current().setpoint())
    }

    fn dispatch(&mut self, output: &OutputCommand) {
        let expected = &self.current().output;
        if expected == output {
            return;
        }
        let tick = self.current().tick();
        self.divergences += 1;
        if self.divergences <= 10 || self.divergences % 1000 == 0 {
            warn!(
                "Replay divergence #{} on {} at tick {tick}: recorded {:?}, dispatched {:?}",
                self.divergences,
                self.mechanism,
                self.current().output,
                output
            );
        }
    }
}
