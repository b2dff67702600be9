//! Drivetrain side simulator.
//!
//! One side of a differential drive: the ganged motors of a group turn the
//! wheels through the gearbox against the equivalent inertia of the side.

use rover_common::hal::config::{DriveSimConfig, IdleMode, MotorGroupConfig};
use std::f64::consts::TAU;

use super::motor::DcMotor;

/// Wheel shaft of one drivetrain side.
#[derive(Debug, Clone)]
pub struct DriveSideSim {
    motor: DcMotor,
    gear_ratio: f64,
    inertia: f64,
    current_limit: f64,
    idle: IdleMode,
    angle: f64,
    omega: f64,
    current: f64,
}

impl DriveSideSim {
    pub fn new(sim: &DriveSimConfig, group: &MotorGroupConfig, gear_ratio: f64) -> Self {
        Self {
            motor: DcMotor::new(&sim.motor, group.motor_count()),
            gear_ratio,
            inertia: sim.side_inertia,
            current_limit: group.current_limit_amps,
            idle: group.idle_mode,
            angle: 0.0,
            omega: 0.0,
            current: 0.0,
        }
    }

    /// Integrate one substep with `volts` applied to every motor of the side.
    pub fn step(&mut self, volts: f64, dt: f64) {
        let motor_omega = self.omega * self.gear_ratio;
        self.current = self
            .motor
            .limited_current(motor_omega, volts, self.idle, self.current_limit);
        let alpha = self.motor.torque(self.current) * self.gear_ratio / self.inertia;
        self.omega += alpha * dt;
        self.angle += self.omega * dt;
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

    #[inline]
    pub fn motor_count(&self) -> usize {
        self.motor.count()
    }

    /// Wheel speed [rad/s].
    #[inline]
    pub fn wheel_omega(&self) -> f64 {
        self.omega
    }
}
