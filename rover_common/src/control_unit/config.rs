//! Robot configuration.
//!
//! All start-up constants in one TOML document (`robot.toml`). Every section
//! has defaults matching the competition robot, so an empty file is a valid
//! simulation configuration. Immutable once the scheduler is built.
//!
//! ```toml
//! [cycle]
//! period_us = 20000
//!
//! [port]
//! backend = "simulation"
//!
//! [arm]
//! dead_zone_deg = 3.0
//! applied_volts = 1.0
//! lower_limit_deg = -5.0
//! upper_limit_deg = 185.0
//!
//! [drive.left_gains]
//! kp = 0.0002
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::config::{ConfigError, SharedConfig, Validate, require_non_negative, require_positive};
use crate::consts::{DEFAULT_PERIOD_US, NOMINAL_BUS_VOLTAGE, PERIOD_US_MAX, PERIOD_US_MIN};
use crate::hal::config::{ArmSimConfig, DriveSimConfig, MotorGroupConfig, PortConfig};
use crate::hal::units::{MechanismUnit, UnitConversion};

// ─── Top-Level Config ───────────────────────────────────────────────

/// Top-level robot configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RobotConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub cycle: CycleConfig,
    #[serde(default)]
    pub port: PortConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub arm: ArmConfig,
    #[serde(default)]
    pub drive: DriveConfig,
    #[serde(default)]
    pub characterization: CharacterizationConfig,
}

impl Validate for RobotConfig {
    /// Validate every section, then cross-section constraints.
    ///
    /// # Errors
    /// The first `ConfigError::ValidationError` found.
    fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.cycle.validate()?;
        self.port.validate()?;
        self.log.validate()?;
        self.arm.validate()?;
        self.drive.validate()?;
        self.characterization.validate()?;

        // Opening the log truncates it before the recording is read.
        if let (Some(log), Some(replay)) = (&self.log.path, &self.port.replay_log) {
            if log == replay {
                return Err(ConfigError::ValidationError(format!(
                    "log.path and port.replay_log are the same file: {}",
                    log.display()
                )));
            }
        }

        let mut seen = HashSet::new();
        let groups = [&self.arm.motor, &self.drive.left, &self.drive.right];
        for id in groups.iter().flat_map(|g| g.can_ids()) {
            if !seen.insert(id) {
                return Err(ConfigError::ValidationError(format!(
                    "CAN id {id} is assigned to more than one motor controller"
                )));
            }
        }
        Ok(())
    }
}

// ─── Cycle ──────────────────────────────────────────────────────────

fn default_period_us() -> u64 {
    DEFAULT_PERIOD_US
}

/// `[cycle]`: tick cadence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleConfig {
    /// Tick period [µs] (default: 20 000 = 50 Hz).
    #[serde(default = "default_period_us")]
    pub period_us: u64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            period_us: default_period_us(),
        }
    }
}

impl CycleConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(PERIOD_US_MIN..=PERIOD_US_MAX).contains(&self.period_us) {
            return Err(ConfigError::ValidationError(format!(
                "cycle.period_us {} out of range [{PERIOD_US_MIN}, {PERIOD_US_MAX}]",
                self.period_us
            )));
        }
        Ok(())
    }

    /// Period in seconds.
    #[inline]
    pub fn period_s(&self) -> f64 {
        self.period_us as f64 * 1e-6
    }
}

// ─── Log ────────────────────────────────────────────────────────────

fn default_channel_capacity() -> usize {
    1024
}

/// `[log]`: per-tick record output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    /// JSON Lines output file. Records stay in memory when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Records buffered between the tick and the writer thread.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: None,
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl LogConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "log.channel_capacity must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── Arm ────────────────────────────────────────────────────────────

fn default_arm_gear_ratio() -> f64 {
    // Empirically corrected 90·100/130, truncated as on the robot.
    69.0
}
fn default_dead_zone() -> f64 {
    3.0
}
fn default_applied_volts() -> f64 {
    1.0
}
fn default_lower_limit() -> f64 {
    -5.0
}
fn default_upper_limit() -> f64 {
    185.0
}
fn default_arm_motor() -> MotorGroupConfig {
    MotorGroupConfig::single(9, 4.0).inverted()
}

/// `[arm]`: single-joint arm and its threshold controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArmConfig {
    /// Motor rotations per arm rotation.
    #[serde(default = "default_arm_gear_ratio")]
    pub gear_ratio: f64,

    /// Tolerance band around the setpoint [deg].
    #[serde(default = "default_dead_zone")]
    pub dead_zone_deg: f64,

    /// Magnitude of the correcting voltage [V].
    #[serde(default = "default_applied_volts")]
    pub applied_volts: f64,

    /// Physical travel limits [deg].
    #[serde(default = "default_lower_limit")]
    pub lower_limit_deg: f64,
    #[serde(default = "default_upper_limit")]
    pub upper_limit_deg: f64,

    /// Setpoint held until the commander sets another [deg].
    #[serde(default)]
    pub initial_setpoint_deg: f64,

    #[serde(default = "default_arm_motor")]
    pub motor: MotorGroupConfig,

    #[serde(default)]
    pub sim: ArmSimConfig,
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            gear_ratio: default_arm_gear_ratio(),
            dead_zone_deg: default_dead_zone(),
            applied_volts: default_applied_volts(),
            lower_limit_deg: default_lower_limit(),
            upper_limit_deg: default_upper_limit(),
            initial_setpoint_deg: 0.0,
            motor: default_arm_motor(),
            sim: ArmSimConfig::default(),
        }
    }
}

impl ArmConfig {
    /// Encoder conversion for the arm joint.
    pub fn units(&self) -> Result<UnitConversion, ConfigError> {
        UnitConversion::new(self.gear_ratio, MechanismUnit::Degrees)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.units()?;
        require_positive("arm.dead_zone_deg", self.dead_zone_deg)?;
        require_positive("arm.applied_volts", self.applied_volts)?;
        if self.applied_volts > self.motor.voltage_compensation {
            return Err(ConfigError::ValidationError(format!(
                "arm.applied_volts {} exceeds voltage compensation {}",
                self.applied_volts, self.motor.voltage_compensation
            )));
        }
        if !self.lower_limit_deg.is_finite()
            || !self.upper_limit_deg.is_finite()
            || self.lower_limit_deg >= self.upper_limit_deg
        {
            return Err(ConfigError::ValidationError(format!(
                "arm travel limits must satisfy lower < upper (got {} .. {})",
                self.lower_limit_deg, self.upper_limit_deg
            )));
        }
        if !self.initial_setpoint_deg.is_finite() {
            return Err(ConfigError::ValidationError(
                "arm.initial_setpoint_deg must be finite".to_string(),
            ));
        }
        self.motor.validate("arm.motor")?;
        self.sim.validate()
    }
}

// ─── Drive ──────────────────────────────────────────────────────────

fn default_drive_gear_ratio() -> f64 {
    10.0
}
fn default_max_volts() -> f64 {
    NOMINAL_BUS_VOLTAGE
}
fn default_wheel_radius() -> f64 {
    0.0762
}
fn default_track_width() -> f64 {
    0.55
}
fn default_left_group() -> MotorGroupConfig {
    MotorGroupConfig::single(8, 20.0)
        .with_follower(7)
        .with_follower(6)
}
fn default_right_group() -> MotorGroupConfig {
    MotorGroupConfig::single(1, 20.0)
        .inverted()
        .with_follower(2)
        .with_follower(3)
}

fn default_kp() -> f64 {
    2e-4
}

/// Onboard velocity servo gains, duty cycle per motor RPM of error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PdGains {
    #[serde(default = "default_kp")]
    pub kp: f64,
    #[serde(default)]
    pub kd: f64,
}

impl Default for PdGains {
    fn default() -> Self {
        Self {
            kp: default_kp(),
            kd: 0.0,
        }
    }
}

impl PdGains {
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        require_non_negative(&format!("{name}.kp"), self.kp)?;
        require_non_negative(&format!("{name}.kd"), self.kd)
    }
}

fn default_kv() -> f64 {
    0.2
}

/// Feedforward for closed-loop wheel velocity: `ks·sign(ω) + kv·ω`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FeedforwardConfig {
    /// Static friction voltage [V].
    #[serde(default)]
    pub ks: f64,
    /// [V per rad/s]
    #[serde(default = "default_kv")]
    pub kv: f64,
}

impl Default for FeedforwardConfig {
    fn default() -> Self {
        Self {
            ks: 0.0,
            kv: default_kv(),
        }
    }
}

/// `[drive]`: differential drivetrain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriveConfig {
    /// Motor rotations per wheel rotation.
    #[serde(default = "default_drive_gear_ratio")]
    pub gear_ratio: f64,

    /// Voltage at full arcade deflection [V].
    #[serde(default = "default_max_volts")]
    pub max_volts: f64,

    #[serde(default = "default_wheel_radius")]
    pub wheel_radius_m: f64,

    #[serde(default = "default_track_width")]
    pub track_width_m: f64,

    #[serde(default = "default_left_group")]
    pub left: MotorGroupConfig,

    #[serde(default = "default_right_group")]
    pub right: MotorGroupConfig,

    #[serde(default)]
    pub left_gains: PdGains,

    #[serde(default)]
    pub right_gains: PdGains,

    #[serde(default)]
    pub feedforward: FeedforwardConfig,

    #[serde(default)]
    pub sim: DriveSimConfig,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            gear_ratio: default_drive_gear_ratio(),
            max_volts: default_max_volts(),
            wheel_radius_m: default_wheel_radius(),
            track_width_m: default_track_width(),
            left: default_left_group(),
            right: default_right_group(),
            left_gains: PdGains::default(),
            right_gains: PdGains::default(),
            feedforward: FeedforwardConfig::default(),
            sim: DriveSimConfig::default(),
        }
    }
}

impl DriveConfig {
    /// Encoder conversion shared by both sides.
    pub fn units(&self) -> Result<UnitConversion, ConfigError> {
        UnitConversion::new(self.gear_ratio, MechanismUnit::Radians)
    }

    /// Gains of side `index` (0 = left, 1 = right).
    pub fn gains(&self, index: usize) -> PdGains {
        if index == 0 {
            self.left_gains
        } else {
            self.right_gains
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.units()?;
        require_positive("drive.max_volts", self.max_volts)?;
        if self.max_volts > NOMINAL_BUS_VOLTAGE {
            return Err(ConfigError::ValidationError(format!(
                "drive.max_volts {} exceeds bus voltage {NOMINAL_BUS_VOLTAGE}",
                self.max_volts
            )));
        }
        require_positive("drive.wheel_radius_m", self.wheel_radius_m)?;
        require_positive("drive.track_width_m", self.track_width_m)?;
        self.left.validate("drive.left")?;
        self.right.validate("drive.right")?;
        self.left_gains.validate("drive.left_gains")?;
        self.right_gains.validate("drive.right_gains")?;
        require_non_negative("drive.feedforward.ks", self.feedforward.ks)?;
        require_non_negative("drive.feedforward.kv", self.feedforward.kv)?;
        self.sim.validate()
    }
}

// ─── Characterization ───────────────────────────────────────────────

fn default_ramp_rate() -> f64 {
    1.0
}
fn default_step_volts() -> f64 {
    4.0
}
fn default_timeout_s() -> f64 {
    10.0
}

/// `[characterization]`: excitation profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CharacterizationConfig {
    /// Quasistatic ramp [V/s].
    #[serde(default = "default_ramp_rate")]
    pub ramp_rate_v_per_s: f64,

    /// Dynamic step magnitude [V].
    #[serde(default = "default_step_volts")]
    pub step_volts: f64,

    /// A run stops itself after this long [s].
    #[serde(default = "default_timeout_s")]
    pub timeout_s: f64,
}

impl Default for CharacterizationConfig {
    fn default() -> Self {
        Self {
            ramp_rate_v_per_s: default_ramp_rate(),
            step_volts: default_step_volts(),
            timeout_s: default_timeout_s(),
        }
    }
}

impl CharacterizationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("characterization.ramp_rate_v_per_s", self.ramp_rate_v_per_s)?;
        require_positive("characterization.step_volts", self.step_volts)?;
        require_positive("characterization.timeout_s", self.timeout_s)?;
        if self.step_volts > NOMINAL_BUS_VOLTAGE {
            return Err(ConfigError::ValidationError(format!(
                "characterization.step_volts {} exceeds bus voltage {NOMINAL_BUS_VOLTAGE}",
                self.step_volts
            )));
        }
        Ok(())
    }

    /// Ticks a full-length run lasts at `period_s`.
    pub fn max_ticks(&self, period_s: f64) -> usize {
        (self.timeout_s / period_s).ceil() as usize + 1
    }
}
