//! Per-tick data exchanged across the hardware port boundary.
//!
//! - [`GroupReading`] - Sensed state of one motor group
//! - [`InputSnapshot`] - Everything a controller may observe in one tick
//! - [`Setpoint`] - Commander target held by a mechanism
//! - [`OutputCommand`] - What a controller asks the port to do this tick
//!
//! All containers are fixed-capacity (`heapless`) so capturing a snapshot
//! never allocates inside the tick.

use heapless::Vec as HVec;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::consts::{MAX_GROUPS, MAX_MOTORS_PER_GROUP};

/// Per-motor current readings of one group, leader first.
pub type MotorCurrents = HVec<f64, MAX_MOTORS_PER_GROUP>;

/// Readings of every group of one port, in group order.
pub type GroupReadings = HVec<GroupReading, MAX_GROUPS>;

/// One value per motor group.
pub type Channels = HVec<f64, MAX_GROUPS>;

/// Sensed state of one motor group.
///
/// Position and velocity come from the leader's encoder only; followers
/// contribute nothing but their current draw.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupReading {
    /// Mechanism position (degrees for the arm, radians for a wheel).
    pub position: f64,
    /// Mechanism velocity per second.
    pub velocity: f64,
    /// Leader duty cycle × bus voltage.
    pub applied_volts: f64,
    /// One entry per physical motor, leader first.
    pub current_amps: MotorCurrents,
}

/// Logical time of one tick.
///
/// Timestamps are `tick × period`, never wall-clock, so two runs of the
/// same scenario stamp identical records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickStamp {
    pub tick: u64,
    pub period_us: u64,
}

impl TickStamp {
    /// Stamp for tick number `tick` at a fixed period.
    pub const fn new(tick: u64, period_us: u64) -> Self {
        Self { tick, period_us }
    }

    /// Logical timestamp in microseconds.
    #[inline]
    pub const fn timestamp_us(&self) -> u64 {
        self.tick.saturating_mul(self.period_us)
    }

    /// The fixed period as a `Duration`.
    #[inline]
    pub const fn period(&self) -> Duration {
        Duration::from_micros(self.period_us)
    }

    /// Elapsed logical time since tick 0, in seconds.
    #[inline]
    pub fn seconds(&self) -> f64 {
        self.timestamp_us() as f64 * 1e-6
    }
}

/// Target value set by the external commander.
///
/// Holds its last value until overwritten; nothing decays it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Setpoint {
    /// Arm joint angle.
    Position { degrees: f64 },
    /// Open-loop drive axes in `[-1, 1]`.
    Arcade { forward: f64, rotate: f64 },
    /// Closed-loop wheel speeds in rad/s.
    WheelVelocity { left: f64, right: f64 },
}

impl Default for Setpoint {
    fn default() -> Self {
        Self::Position { degrees: 0.0 }
    }
}

/// Immutable record of one mechanism's sensed state for one tick.
///
/// Built only through [`InputSnapshot::new`], which takes every field at
/// once: a snapshot is never partially updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    tick: u64,
    timestamp_us: u64,
    groups: GroupReadings,
    setpoint: Setpoint,
}

impl InputSnapshot {
    pub fn new(stamp: TickStamp, groups: GroupReadings, setpoint: Setpoint) -> Self {
        Self {
            tick: stamp.tick,
            timestamp_us: stamp.timestamp_us(),
            groups,
            setpoint,
        }
    }

    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    #[inline]
    pub fn timestamp_us(&self) -> u64 {
        self.timestamp_us
    }

    #[inline]
    pub fn groups(&self) -> &[GroupReading] {
        &self.groups
    }

    #[inline]
    pub fn setpoint(&self) -> Setpoint {
        self.setpoint
    }

    /// Reading of group `index`, if the port has that many groups.
    #[inline]
    pub fn group(&self, index: usize) -> Option<&GroupReading> {
        self.groups.get(index)
    }

    /// Position of group `index`.
    #[inline]
    pub fn position(&self, index: usize) -> Option<f64> {
        self.group(index).map(|g| g.position)
    }

    /// Velocity of group `index`.
    #[inline]
    pub fn velocity(&self, index: usize) -> Option<f64> {
        self.group(index).map(|g| g.velocity)
    }
}

/// Output requested by a controller for one tick, one channel per group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OutputCommand {
    /// Open-loop voltage per group.
    Voltage { volts: Channels },
    /// Onboard velocity servo: mechanism velocity reference plus feedforward volts.
    Velocity {
        reference: Channels,
        feedforward_volts: Channels,
    },
}

impl OutputCommand {
    /// Voltage command from a slice; channels beyond `MAX_GROUPS` are ignored.
    pub fn voltage(volts: &[f64]) -> Self {
        Self::Voltage {
            volts: channels(volts),
        }
    }

    /// Zero volts on `groups` channels.
    pub fn neutral(groups: usize) -> Self {
        let mut volts = Channels::new();
        for _ in 0..groups.min(MAX_GROUPS) {
            let _ = volts.push(0.0);
        }
        Self::Voltage { volts }
    }

    /// Velocity command; both slices are expected to have the same length.
    pub fn velocity(reference: &[f64], feedforward_volts: &[f64]) -> Self {
        Self::Velocity {
            reference: channels(reference),
            feedforward_volts: channels(feedforward_volts),
        }
    }

    /// Voltage of channel `index` for an open-loop command.
    pub fn volts(&self, index: usize) -> Option<f64> {
        match self {
            Self::Voltage { volts } => volts.get(index).copied(),
            Self::Velocity { .. } => None,
        }
    }

    /// Number of channels carried.
    pub fn channel_count(&self) -> usize {
        match self {
            Self::Voltage { volts } => volts.len(),
            Self::Velocity { reference, .. } => reference.len(),
        }
    }

    /// True when every channel commands zero volts.
    pub fn is_neutral(&self) -> bool {
        matches!(self, Self::Voltage { volts } if volts.iter().all(|v| *v == 0.0))
    }
}

/// Copy up to `MAX_GROUPS` values into a fixed-capacity channel vector.
pub fn channels(values: &[f64]) -> Channels {
    let mut out = Channels::new();
    for v in values.iter().take(MAX_GROUPS) {
        let _ = out.push(*v);
    }
    out
}
