//! Single-jointed arm simulator.
//!
//! The arm is a rigid link on a geared joint. State is kept at the joint
//! (radians) and exposed at the motor shaft (rotations, RPM), which is
//! what an encoder on the leader reports.

use rover_common::consts::GRAVITY;
use rover_common::hal::config::{ArmSimConfig, IdleMode, MotorGroupConfig};
use std::f64::consts::TAU;
use tracing::trace;

use super::motor::DcMotor;

/// Arm joint driven through a gearbox, with hard stops at the travel limits.
#[derive(Debug, Clone)]
pub struct ArmSim {
    motor: DcMotor,
    gear_ratio: f64,
    inertia: f64,
    /// `m·g·L/2`, zero when gravity is disabled.
    gravity_torque: f64,
    lower: f64,
    upper: f64,
    current_limit: f64,
    idle: IdleMode,
    angle: f64,
    omega: f64,
    current: f64,
}

impl ArmSim {
    /// Build the plant. Limits are the physical hard stops [deg].
    pub fn new(
        sim: &ArmSimConfig,
        group: &MotorGroupConfig,
        gear_ratio: f64,
        lower_limit_deg: f64,
        upper_limit_deg: f64,
    ) -> Self {
        let gravity_torque = if sim.gravity {
            sim.mass_kg * GRAVITY * sim.arm_length_m / 2.0
        } else {
            0.0
        };
        Self {
            motor: DcMotor::new(&sim.motor, group.motor_count()),
            gear_ratio,
            inertia: sim.moment_of_inertia,
            gravity_torque,
            lower: lower_limit_deg.to_radians(),
            upper: upper_limit_deg.to_radians(),
            current_limit: group.current_limit_amps,
            idle: group.idle_mode,
            angle: sim.start_position_deg.to_radians().clamp(
                lower_limit_deg.to_radians(),
                upper_limit_deg.to_radians(),
            ),
            omega: 0.0,
            current: 0.0,
        }
    }

    /// Integrate one substep with `volts` applied to the motors.
    pub fn step(&mut self, volts: f64, dt: f64) {
        let motor_omega = self.omega * self.gear_ratio;
        self.current = self
            .motor
            .limited_current(motor_omega, volts, self.idle, self.current_limit);
        let drive_torque = self.motor.torque(self.current) * self.gear_ratio;
        let load_torque = self.gravity_torque * self.angle.cos();
        let alpha = (drive_torque - load_torque) / self.inertia;

        self.omega += alpha * dt;
        self.angle += self.omega * dt;
        self.check_hard_stops();

        trace!(
            "Arm sim: angle={:.4}deg, omega={:.4}rad/s, i={:.3}A",
            self.angle.to_degrees(),
            self.omega,
            self.current
        );
    }

    /// Stop at the hard stops: position pinned, velocity into the stop zeroed.
    fn check_hard_stops(&mut self) {
        if self.angle > self.upper {
            self.angle = self.upper;
            if self.omega > 0.0 {
                self.omega = 0.0;
            }
        }
        if self.angle < self.lower {
            self.angle = self.lower;
            if self.omega < 0.0 {
                self.omega = 0.0;
            }
        }
    }

    /// Leader encoder position [motor rotations].
    #[inline]
    pub fn motor_rotations(&self) -> f64 {
        self.angle / TAU * self.gear_ratio
    }

    /// Leader encoder velocity [motor RPM].
    #[inline]
    pub fn motor_rpm(&self) -> f64 {
        self.omega * self.gear_ratio * 60.0 / TAU
    }

    /// Total current of the last substep, as a magnitude [A].
    #[inline]
    pub fn current_amps(&self) -> f64 {
        self.current.abs()
    }

    /// Number of motors on the joint.
    #[inline]
    pub fn motor_count(&self) -> usize {
        self.motor.count()
    }

    /// Joint angle [deg].
    #[inline]
    pub fn angle_deg(&self) -> f64 {
        self.angle.to_degrees()
    }

    /// Joint velocity [deg/s].
    #[inline]
    pub fn velocity_deg(&self) -> f64 {
        self.omega.to_degrees()
    }
}
