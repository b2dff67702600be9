//! Controller state enums.
//!
//! Every tick each mechanism reports one [`ControllerState`]; it travels in
//! the log record next to the snapshot and the output it produced.

use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Arm ────────────────────────────────────────────────────────────

/// Output decision of the arm threshold controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ArmOutputState {
    /// Below the setpoint by more than the dead zone: `+applied_volts`.
    DrivePositive,
    /// Above the setpoint by more than the dead zone: `-applied_volts`.
    DriveNegative,
    /// Within the dead zone: zero output.
    #[default]
    Hold,
}

impl ArmOutputState {
    /// Sign of the voltage this state commands.
    #[inline]
    pub const fn sign(self) -> f64 {
        match self {
            Self::DrivePositive => 1.0,
            Self::DriveNegative => -1.0,
            Self::Hold => 0.0,
        }
    }
}

/// Travel limit that suppressed an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitClamp {
    /// Positive voltage refused at or above the upper limit.
    Upper,
    /// Negative voltage refused at or below the lower limit.
    Lower,
}

// ─── Drive ──────────────────────────────────────────────────────────

/// Which drivetrain path produced the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DriveMode {
    /// Arcade axes scaled to voltage.
    #[default]
    OpenLoop,
    /// Velocity reference to the onboard servo.
    ClosedLoop,
}

// ─── Characterization ───────────────────────────────────────────────

/// Direction of a characterization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    #[inline]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Forward => 1.0,
            Self::Reverse => -1.0,
        }
    }
}

/// Excitation shape of a characterization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SysIdMode {
    /// Voltage ramps from zero at a fixed rate.
    Quasistatic,
    /// Voltage steps to a fixed magnitude and holds.
    Dynamic,
}

/// Characterization state label, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SysIdLabel {
    #[default]
    Idle,
    QuasistaticForward,
    QuasistaticReverse,
    DynamicForward,
    DynamicReverse,
}

impl SysIdLabel {
    pub const fn running(mode: SysIdMode, direction: Direction) -> Self {
        match (mode, direction) {
            (SysIdMode::Quasistatic, Direction::Forward) => Self::QuasistaticForward,
            (SysIdMode::Quasistatic, Direction::Reverse) => Self::QuasistaticReverse,
            (SysIdMode::Dynamic, Direction::Forward) => Self::DynamicForward,
            (SysIdMode::Dynamic, Direction::Reverse) => Self::DynamicReverse,
        }
    }

    #[inline]
    pub const fn is_running(self) -> bool {
        !matches!(self, Self::Idle)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::QuasistaticForward => "quasistatic-forward",
            Self::QuasistaticReverse => "quasistatic-reverse",
            Self::DynamicForward => "dynamic-forward",
            Self::DynamicReverse => "dynamic-reverse",
        }
    }
}

impl fmt::Display for SysIdLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Per-tick report ────────────────────────────────────────────────

/// What produced a mechanism's output this tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "controller", rename_all = "snake_case")]
pub enum ControllerState {
    /// Arm threshold controller.
    Arm {
        state: ArmOutputState,
        /// `position - setpoint` [deg].
        error_deg: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        clamp: Option<LimitClamp>,
    },
    /// Drivetrain controller.
    Drive { mode: DriveMode },
    /// Characterization routine overriding the mechanism's controller.
    Characterization {
        label: SysIdLabel,
        commanded_volts: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        clamp: Option<LimitClamp>,
    },
}

impl ControllerState {
    /// Travel-limit clamp applied this tick, if any.
    pub fn clamp(&self) -> Option<LimitClamp> {
        match self {
            Self::Arm { clamp, .. } | Self::Characterization { clamp, .. } => *clamp,
            Self::Drive { .. } => None,
        }
    }
}
