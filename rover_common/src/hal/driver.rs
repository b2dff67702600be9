//! Hardware port capability and error types.
//!
//! This module defines:
//! - `HardwarePort` trait - Interface every backend (real, simulation, replay) implements
//! - `HalError` enum - Error types for HAL operations
//! - `PortKind` enum - Backend selected once at start-up

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::consts::NOMINAL_BUS_VOLTAGE;
use crate::hal::types::{GroupReadings, InputSnapshot, OutputCommand, Setpoint, TickStamp};

/// Error types for HAL operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HalError {
    /// Device or backend initialization failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Hardware communication error
    #[error("Hardware communication error: {0}")]
    CommunicationError(String),

    /// Recorded log could not be read or parsed
    #[error("Recording error: {0}")]
    RecordingError(String),
}

/// Backend behind every port of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PortKind {
    /// Physical motor controllers and encoders.
    Real,
    /// Physics model integrated with the logical period.
    #[default]
    Simulation,
    /// Readings served from a recorded log.
    Replay,
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Real => "real",
            Self::Simulation => "simulation",
            Self::Replay => "replay",
        })
    }
}

impl FromStr for PortKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "real" => Ok(Self::Real),
            "sim" | "simulation" => Ok(Self::Simulation),
            "replay" => Ok(Self::Replay),
            other => Err(format!(
                "unknown backend '{other}' (expected real, simulation or replay)"
            )),
        }
    }
}

/// Raw actuator and sensor operations for one mechanism.
///
/// A port drives one or more motor groups (the arm has one, the drivetrain
/// two). Controllers never call `read` themselves: the scheduler captures
/// one [`InputSnapshot`] per tick and that snapshot is the only view of
/// hardware state the control logic gets.
///
/// # Per-tick contract
///
/// | Call | When | May block |
/// |------|------|-----------|
/// | `tick_internal()` | first, exactly once per period | no |
/// | `capture_snapshot()` | after `tick_internal` | no |
/// | `dispatch()` | after the controller ran | no |
///
/// No method returns an error. A backend that loses its hardware reports
/// the last-known readings and drops commands; the tick always completes.
pub trait HardwarePort: Send {
    /// Backend identifier used in logs ("real", "simulation", "replay").
    fn name(&self) -> &'static str;

    /// Number of motor groups driven by this port.
    fn group_count(&self) -> usize;

    /// Advance backend-local state (physics, onboard servos, replay cursor)
    /// by one period.
    fn tick_internal(&mut self, dt: Duration);

    /// Current readings of every group. Never blocks; returns last-known
    /// data while the hardware is unreachable.
    fn read(&mut self) -> GroupReadings;

    /// Open-loop voltage for one group, clamped to the hardware-safe range.
    fn set_voltage(&mut self, group: usize, volts: f64);

    /// Closed-loop velocity reference (mechanism units/s) plus feedforward.
    fn set_velocity(&mut self, group: usize, reference: f64, feedforward_volts: f64);

    /// Whether the last hardware access succeeded.
    fn is_connected(&self) -> bool {
        true
    }

    /// Highest voltage magnitude the port will apply.
    fn max_voltage(&self) -> f64 {
        NOMINAL_BUS_VOLTAGE
    }

    /// Setpoint recorded for the current tick, when the port replays a log.
    fn recorded_setpoint(&self) -> Option<Setpoint> {
        None
    }

    /// Capture the snapshot for this tick. Has no effect on the actuators.
    fn capture_snapshot(&mut self, stamp: TickStamp, setpoint: Setpoint) -> InputSnapshot {
        InputSnapshot::new(stamp, self.read(), setpoint)
    }

    /// Send one tick's output to every group in the same call.
    fn dispatch(&mut self, output: &OutputCommand) {
        match output {
            OutputCommand::Voltage { volts } => {
                for (group, v) in volts.iter().enumerate() {
                    self.set_voltage(group, *v);
                }
            }
            OutputCommand::Velocity {
                reference,
                feedforward_volts,
            } => {
                for (group, r) in reference.iter().enumerate() {
                    let ff = feedforward_volts.get(group).copied().unwrap_or(0.0);
                    self.set_velocity(group, *r, ff);
                }
            }
        }
    }
}

/// Clamp a voltage to `±limit`; NaN maps to zero.
#[inline]
pub fn clamp_voltage(volts: f64, limit: f64) -> f64 {
    if volts.is_nan() {
        return 0.0;
    }
    volts.clamp(-limit.abs(), limit.abs())
}
