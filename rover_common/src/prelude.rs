//! Prelude module for common re-exports.
//!
//! ```rust
//! use rover_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig, Validate};
pub use crate::control_unit::config::{
    ArmConfig, CharacterizationConfig, CycleConfig, DriveConfig, FeedforwardConfig, LogConfig,
    PdGains, RobotConfig,
};
pub use crate::hal::config::{
    ArmSimConfig, DcMotorConfig, DriveSimConfig, FollowerConfig, IdleMode, MotorGroupConfig,
    PortConfig,
};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{DEFAULT_PERIOD_US, MAX_GROUPS, NOMINAL_BUS_VOLTAGE};

// ─── Hardware Port ──────────────────────────────────────────────────
pub use crate::hal::driver::{HalError, HardwarePort, PortKind, clamp_voltage};
pub use crate::hal::types::{
    Channels, GroupReading, GroupReadings, InputSnapshot, MotorCurrents, OutputCommand, Setpoint,
    TickStamp,
};
pub use crate::hal::units::{MechanismUnit, UnitConversion};

// ─── Controller State & Records ─────────────────────────────────────
pub use crate::control_unit::record::{LogRecord, MechanismId};
pub use crate::control_unit::state::{
    ArmOutputState, ControllerState, Direction, DriveMode, LimitClamp, SysIdLabel, SysIdMode,
};
