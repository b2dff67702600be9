//! HAL configuration types.
//!
//! This module contains configuration types for the hardware ports:
//! - `PortConfig` - Backend selection and replay source
//! - `MotorGroupConfig` - Leader, followers and shared motor-controller settings
//! - `DcMotorConfig` - Motor constants used by the physics model
//! - `ArmSimConfig` / `DriveSimConfig` - Simulated plant parameters

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::{ConfigError, require_non_negative, require_positive};
use crate::consts::{DEFAULT_CAN_TIMEOUT_MS, MAX_FOLLOWERS, NOMINAL_BUS_VOLTAGE};
use crate::hal::driver::PortKind;

fn default_voltage_compensation() -> f64 {
    NOMINAL_BUS_VOLTAGE
}

fn default_can_timeout_ms() -> u32 {
    DEFAULT_CAN_TIMEOUT_MS
}

/// `[port]` section: which backend every mechanism port uses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PortConfig {
    /// Backend, selected once at start-up.
    #[serde(default)]
    pub backend: PortKind,

    /// JSON Lines log replayed by the `replay` backend.
    #[serde(default)]
    pub replay_log: Option<PathBuf>,
}

impl PortConfig {
    /// # Errors
    /// `ValidationError` if the replay backend has no log to replay.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == PortKind::Replay && self.replay_log.is_none() {
            return Err(ConfigError::ValidationError(
                "port.backend = \"replay\" requires port.replay_log".to_string(),
            ));
        }
        Ok(())
    }
}

/// Motor behaviour at zero command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IdleMode {
    /// Windings shorted: back-EMF resists motion.
    #[default]
    Brake,
    /// Windings open: the mechanism spins freely.
    Coast,
}

/// A follower mirrors its own group's leader with a fixed sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowerConfig {
    pub can_id: u8,
    /// Follower output is the negated leader output.
    #[serde(default)]
    pub inverted: bool,
}

impl FollowerConfig {
    pub const fn new(can_id: u8) -> Self {
        Self {
            can_id,
            inverted: false,
        }
    }
}

/// One leader plus its followers, sharing one current limit and one
/// voltage-compensation setting.
///
/// Followers are configured once and never receive independent commands.
/// Only the leader's encoder is read for position and velocity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MotorGroupConfig {
    /// CAN id of the leader controller.
    pub leader_id: u8,

    /// Leader output direction is reversed.
    #[serde(default)]
    pub inverted: bool,

    #[serde(default)]
    pub followers: Vec<FollowerConfig>,

    /// Smart current limit applied to every motor of the group [A].
    pub current_limit_amps: f64,

    /// Nominal voltage the controller compensates to [V].
    #[serde(default = "default_voltage_compensation")]
    pub voltage_compensation: f64,

    #[serde(default)]
    pub idle_mode: IdleMode,

    /// Bus timeout set on every controller of the group.
    #[serde(default = "default_can_timeout_ms")]
    pub can_timeout_ms: u32,
}

impl MotorGroupConfig {
    /// A leader with no followers.
    pub fn single(leader_id: u8, current_limit_amps: f64) -> Self {
        Self {
            leader_id,
            inverted: false,
            followers: Vec::new(),
            current_limit_amps,
            voltage_compensation: default_voltage_compensation(),
            idle_mode: IdleMode::Brake,
            can_timeout_ms: default_can_timeout_ms(),
        }
    }

    /// Add a non-inverted follower.
    pub fn with_follower(mut self, can_id: u8) -> Self {
        self.followers.push(FollowerConfig::new(can_id));
        self
    }

    /// Mark the leader inverted.
    pub fn inverted(mut self) -> Self {
        self.inverted = true;
        self
    }

    /// Leader plus followers.
    pub fn motor_count(&self) -> usize {
        1 + self.followers.len()
    }

    /// CAN ids of every controller in the group, leader first.
    pub fn can_ids(&self) -> impl Iterator<Item = u8> + '_ {
        std::iter::once(self.leader_id).chain(self.followers.iter().map(|f| f.can_id))
    }

    /// Validate one group; `name` prefixes the error message.
    ///
    /// # Errors
    /// `ValidationError` on a non-positive current limit or voltage
    /// compensation, a zero CAN timeout, or too many followers.
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        require_positive(&format!("{name}.current_limit_amps"), self.current_limit_amps)?;
        require_positive(
            &format!("{name}.voltage_compensation"),
            self.voltage_compensation,
        )?;
        if self.can_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(format!(
                "{name}.can_timeout_ms must be > 0"
            )));
        }
        if self.followers.len() > MAX_FOLLOWERS {
            return Err(ConfigError::ValidationError(format!(
                "{name}: too many followers: {} (max {MAX_FOLLOWERS})",
                self.followers.len()
            )));
        }
        Ok(())
    }
}

fn default_nominal_volts() -> f64 {
    NOMINAL_BUS_VOLTAGE
}
fn default_stall_torque() -> f64 {
    2.6
}
fn default_stall_current() -> f64 {
    105.0
}
fn default_free_current() -> f64 {
    1.8
}
fn default_free_speed_rpm() -> f64 {
    5676.0
}

/// Brushed-equivalent DC motor constants (defaults: NEO brushless).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DcMotorConfig {
    #[serde(default = "default_nominal_volts")]
    pub nominal_volts: f64,
    /// [N·m]
    #[serde(default = "default_stall_torque")]
    pub stall_torque_nm: f64,
    /// [A]
    #[serde(default = "default_stall_current")]
    pub stall_current_amps: f64,
    /// [A]
    #[serde(default = "default_free_current")]
    pub free_current_amps: f64,
    #[serde(default = "default_free_speed_rpm")]
    pub free_speed_rpm: f64,
}

impl Default for DcMotorConfig {
    fn default() -> Self {
        Self {
            nominal_volts: default_nominal_volts(),
            stall_torque_nm: default_stall_torque(),
            stall_current_amps: default_stall_current(),
            free_current_amps: default_free_current(),
            free_speed_rpm: default_free_speed_rpm(),
        }
    }
}

impl DcMotorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("motor.nominal_volts", self.nominal_volts)?;
        require_positive("motor.stall_torque_nm", self.stall_torque_nm)?;
        require_positive("motor.free_speed_rpm", self.free_speed_rpm)?;
        require_non_negative("motor.free_current_amps", self.free_current_amps)?;
        if self.stall_current_amps <= self.free_current_amps {
            return Err(ConfigError::ValidationError(format!(
                "motor.stall_current_amps ({}) must exceed free_current_amps ({})",
                self.stall_current_amps, self.free_current_amps
            )));
        }
        Ok(())
    }
}

fn default_arm_inertia() -> f64 {
    0.43
}
fn default_arm_length() -> f64 {
    0.8
}
fn default_arm_mass() -> f64 {
    2.0
}

/// Simulated single-jointed arm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArmSimConfig {
    /// Moment of inertia about the joint [kg·m²].
    #[serde(default = "default_arm_inertia")]
    pub moment_of_inertia: f64,
    /// [m]
    #[serde(default = "default_arm_length")]
    pub arm_length_m: f64,
    /// [kg]
    #[serde(default = "default_arm_mass")]
    pub mass_kg: f64,
    /// Apply gravity torque `m·g·(L/2)·cos θ`.
    #[serde(default)]
    pub gravity: bool,
    /// Joint angle at start-up [deg].
    #[serde(default)]
    pub start_position_deg: f64,
    #[serde(default)]
    pub motor: DcMotorConfig,
}

impl Default for ArmSimConfig {
    fn default() -> Self {
        Self {
            moment_of_inertia: default_arm_inertia(),
            arm_length_m: default_arm_length(),
            mass_kg: default_arm_mass(),
            gravity: false,
            start_position_deg: 0.0,
            motor: DcMotorConfig::default(),
        }
    }
}

impl ArmSimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("arm.sim.moment_of_inertia", self.moment_of_inertia)?;
        require_positive("arm.sim.arm_length_m", self.arm_length_m)?;
        require_non_negative("arm.sim.mass_kg", self.mass_kg)?;
        if !self.start_position_deg.is_finite() {
            return Err(ConfigError::ValidationError(
                "arm.sim.start_position_deg must be finite".to_string(),
            ));
        }
        self.motor.validate()
    }
}

fn default_side_inertia() -> f64 {
    0.15
}

/// Simulated drivetrain side (wheels plus the share of robot mass they move).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriveSimConfig {
    /// Equivalent inertia at the wheel axle, per side [kg·m²].
    #[serde(default = "default_side_inertia")]
    pub side_inertia: f64,
    #[serde(default)]
    pub motor: DcMotorConfig,
}

impl Default for DriveSimConfig {
    fn default() -> Self {
        Self {
            side_inertia: default_side_inertia(),
            motor: DcMotorConfig::default(),
        }
    }
}

impl DriveSimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("drive.sim.side_inertia", self.side_inertia)?;
        self.motor.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_builder_and_ids() {
        let group = MotorGroupConfig::single(8, 20.0)
            .with_follower(7)
            .with_follower(6);
        assert_eq!(group.motor_count(), 3);
        assert_eq!(group.can_ids().collect::<Vec<_>>(), vec![8, 7, 6]);
        assert!(group.validate("drive.left").is_ok());
    }

    #[test]
    fn group_rejects_bad_limits() {
        let mut group = MotorGroupConfig::single(9, 0.0);
        assert!(group.validate("arm.motor").is_err());
        group.current_limit_amps = 4.0;
        for id in 10..14 {
            group.followers.push(FollowerConfig::new(id));
        }
        let err = group.validate("arm.motor").unwrap_err();
        assert!(err.to_string().contains("too many followers"));
    }

    #[test]
    fn replay_requires_log() {
        let cfg = PortConfig {
            backend: PortKind::Replay,
            replay_log: None,
        };
        assert!(cfg.validate().is_err());
        assert!(PortConfig::default().validate().is_ok());
    }

    #[test]
    fn motor_defaults_are_neo() {
        let motor = DcMotorConfig::default();
        assert_eq!(motor.free_speed_rpm, 5676.0);
        assert!(motor.validate().is_ok());
        assert!(ArmSimConfig::default().validate().is_ok());
        assert!(DriveSimConfig::default().validate().is_ok());
    }
}
