//! Gear ratio and unit conversion.
//!
//! Encoders report motor-shaft rotations and RPM. Every backend turns
//! those into mechanism units through one [`UnitConversion`], so a log
//! recorded on real hardware and one recorded in simulation carry the
//! same units.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::config::{ConfigError, require_positive};

/// Physical unit of a mechanism's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MechanismUnit {
    /// Angle in degrees (arm joint).
    #[default]
    Degrees,
    /// Angle in radians (drive wheels).
    Radians,
}

impl MechanismUnit {
    /// Mechanism units per output-shaft revolution.
    #[inline]
    pub const fn per_revolution(self) -> f64 {
        match self {
            Self::Degrees => 360.0,
            Self::Radians => TAU,
        }
    }

    /// Convert a value in this unit to radians.
    #[inline]
    pub fn to_radians(self, value: f64) -> f64 {
        match self {
            Self::Degrees => value.to_radians(),
            Self::Radians => value,
        }
    }

    /// Convert radians to this unit.
    #[inline]
    pub fn from_radians(self, radians: f64) -> f64 {
        match self {
            Self::Degrees => radians.to_degrees(),
            Self::Radians => radians,
        }
    }
}

/// Constant scalar relation between motor rotations and mechanism units.
///
/// `gear_ratio` is motor rotations per output rotation. It is checked on
/// construction; a zero or non-finite ratio is a start-up configuration
/// error and never reaches a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConversion {
    gear_ratio: f64,
    unit: MechanismUnit,
}

impl UnitConversion {
    /// Create a conversion.
    ///
    /// # Errors
    /// `ConfigError::ValidationError` if `gear_ratio` is zero, negative or not finite.
    pub fn new(gear_ratio: f64, unit: MechanismUnit) -> Result<Self, ConfigError> {
        require_positive("gear_ratio", gear_ratio)?;
        Ok(Self { gear_ratio, unit })
    }

    /// Motor rotations per output rotation.
    #[inline]
    pub fn gear_ratio(&self) -> f64 {
        self.gear_ratio
    }

    /// Mechanism position unit.
    #[inline]
    pub fn unit(&self) -> MechanismUnit {
        self.unit
    }

    /// Motor-shaft rotations → mechanism position.
    #[inline]
    pub fn position_from_rotations(&self, rotations: f64) -> f64 {
        rotations / self.gear_ratio * self.unit.per_revolution()
    }

    /// Mechanism position → motor-shaft rotations.
    #[inline]
    pub fn rotations_from_position(&self, position: f64) -> f64 {
        position / self.unit.per_revolution() * self.gear_ratio
    }

    /// Motor RPM → mechanism velocity per second.
    #[inline]
    pub fn velocity_from_rpm(&self, rpm: f64) -> f64 {
        rpm / self.gear_ratio * self.unit.per_revolution() / 60.0
    }

    /// Mechanism velocity per second → motor RPM.
    #[inline]
    pub fn rpm_from_velocity(&self, velocity: f64) -> f64 {
        velocity / self.unit.per_revolution() * 60.0 * self.gear_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_gear_ratio_is_rejected() {
        assert!(UnitConversion::new(0.0, MechanismUnit::Degrees).is_err());
        assert!(UnitConversion::new(-3.0, MechanismUnit::Degrees).is_err());
        assert!(UnitConversion::new(f64::INFINITY, MechanismUnit::Radians).is_err());
    }

    #[test]
    fn arm_ratio_converts_rotations_to_degrees() {
        let conv = UnitConversion::new(69.0, MechanismUnit::Degrees).unwrap();
        // 69 motor rotations = one full arm revolution.
        assert!((conv.position_from_rotations(69.0) - 360.0).abs() < 1e-9);
        assert!((conv.position_from_rotations(17.25) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn position_rotation_round_trip() {
        let conv = UnitConversion::new(69.0, MechanismUnit::Degrees).unwrap();
        assert!((conv.rotations_from_position(90.0) - 17.25).abs() < 1e-9);
        for deg in [-5.0, 0.0, 42.5, 185.0] {
            let back = conv.position_from_rotations(conv.rotations_from_position(deg));
            assert!((back - deg).abs() < 1e-9, "{deg} -> {back}");
        }
    }

    #[test]
    fn drive_ratio_converts_rpm_to_rad_per_sec() {
        let conv = UnitConversion::new(10.0, MechanismUnit::Radians).unwrap();
        // 600 motor RPM = 60 wheel RPM = 1 rev/s = 2π rad/s.
        assert!((conv.velocity_from_rpm(600.0) - TAU).abs() < 1e-9);
        assert!((conv.rpm_from_velocity(TAU) - 600.0).abs() < 1e-9);
    }

    #[test]
    fn unit_radian_helpers() {
        assert!((MechanismUnit::Degrees.to_radians(180.0) - std::f64::consts::PI).abs() < 1e-12);
        assert!((MechanismUnit::Radians.from_radians(1.5) - 1.5).abs() < 1e-12);
    }
}
