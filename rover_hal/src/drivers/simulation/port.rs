//! Simulated hardware port.
//!
//! Each motor group drives its own plant (arm joint or drivetrain side).
//! `tick_internal` integrates the plants over the logical period in fixed
//! 1 ms substeps, running the onboard velocity servo once per substep the
//! way a motor controller's own loop would. Readings leave through the same
//! [`UnitConversion`] the real backend uses.

use rover_common::consts::MAX_MOTORS_PER_GROUP;
use rover_common::control_unit::config::{ArmConfig, DriveConfig, PdGains};
use rover_common::hal::config::MotorGroupConfig;
use rover_common::hal::driver::{HalError, HardwarePort, clamp_voltage};
use rover_common::hal::types::{GroupReading, GroupReadings, MotorCurrents};
use rover_common::hal::units::UnitConversion;
use std::time::Duration;
use tracing::{debug, info};

use super::physics::{ArmSim, DriveSideSim};
use super::servo::VelocityServo;

/// Physics substep.
pub const SUBSTEP: Duration = Duration::from_millis(1);

/// Plant attached to one motor group.
#[derive(Debug, Clone)]
enum Plant {
    Arm(ArmSim),
    Wheel(DriveSideSim),
}

impl Plant {
    fn step(&mut self, volts: f64, dt: f64) {
        match self {
            Self::Arm(arm) => arm.step(volts, dt),
            Self::Wheel(side) => side.step(volts, dt),
        }
    }

    fn motor_rotations(&self) -> f64 {
        match self {
            Self::Arm(arm) => arm.motor_rotations(),
            Self::Wheel(side) => side.motor_rotations(),
        }
    }

    fn motor_rpm(&self) -> f64 {
        match self {
            Self::Arm(arm) => arm.motor_rpm(),
            Self::Wheel(side) => side.motor_rpm(),
        }
    }

    fn current_amps(&self) -> f64 {
        match self {
            Self::Arm(arm) => arm.current_amps(),
            Self::Wheel(side) => side.current_amps(),
        }
    }

    fn motor_count(&self) -> usize {
        match self {
            Self::Arm(arm) => arm.motor_count(),
            Self::Wheel(side) => side.motor_count(),
        }
    }
}

/// Last command received by a group, applied over the next period.
#[derive(Debug, Clone, Copy, PartialEq)]
enum GroupCommand {
    Voltage(f64),
    Velocity {
        reference_rpm: f64,
        feedforward_volts: f64,
    },
}

#[derive(Debug, Clone)]
struct SimGroup {
    plant: Plant,
    servo: VelocityServo,
    command: GroupCommand,
    voltage_limit: f64,
    applied_volts: f64,
}

impl SimGroup {
    fn new(plant: Plant, group: &MotorGroupConfig, gains: PdGains) -> Self {
        Self {
            plant,
            servo: VelocityServo::new(gains, group.voltage_compensation),
            command: GroupCommand::Voltage(0.0),
            voltage_limit: group.voltage_compensation,
            applied_volts: 0.0,
        }
    }

    fn substep(&mut self, dt: f64) {
        let volts = match self.command {
            GroupCommand::Voltage(v) => v,
            GroupCommand::Velocity {
                reference_rpm,
                feedforward_volts,
            } => self
                .servo
                .output(reference_rpm, self.plant.motor_rpm(), feedforward_volts),
        };
        self.plant.step(volts, dt);
        self.applied_volts = volts;
    }

    fn reading(&self, units: &UnitConversion) -> GroupReading {
        let count = self.plant.motor_count().min(MAX_MOTORS_PER_GROUP);
        let per_motor = self.plant.current_amps() / count as f64;
        let mut current_amps = MotorCurrents::new();
        for _ in 0..count {
            let _ = current_amps.push(per_motor);
        }
        GroupReading {
            position: units.position_from_rotations(self.plant.motor_rotations()),
            velocity: units.velocity_from_rpm(self.plant.motor_rpm()),
            applied_volts: self.applied_volts,
            current_amps,
        }
    }
}

/// Physics-backed port for one mechanism.
#[derive(Debug, Clone)]
pub struct SimulatedPort {
    groups: Vec<SimGroup>,
    units: UnitConversion,
}

fn config_error(e: impl std::fmt::Display) -> HalError {
    HalError::ConfigError(e.to_string())
}

impl SimulatedPort {
    /// Single-jointed arm with hard stops at the configured travel limits.
    pub fn arm(config: &ArmConfig) -> Result<Self, HalError> {
        let units = config.units().map_err(config_error)?;
        config.sim.validate().map_err(config_error)?;
        let plant = Plant::Arm(ArmSim::new(
            &config.sim,
            &config.motor,
            units.gear_ratio(),
            config.lower_limit_deg,
            config.upper_limit_deg,
        ));
        info!(
            "Simulated arm: gear ratio {}, start {:.1} deg, gravity {}",
            units.gear_ratio(),
            config.sim.start_position_deg,
            config.sim.gravity
        );
        Ok(Self {
            groups: vec![SimGroup::new(plant, &config.motor, PdGains::default())],
            units,
        })
    }

    /// Two-sided drivetrain (left, right).
    pub fn drive(config: &DriveConfig) -> Result<Self, HalError> {
        let units = config.units().map_err(config_error)?;
        config.sim.validate().map_err(config_error)?;
        let groups = [&config.left, &config.right]
            .into_iter()
            .enumerate()
            .map(|(index, group)| {
                let plant = Plant::Wheel(DriveSideSim::new(&config.sim, group, units.gear_ratio()));
                SimGroup::new(plant, group, config.gains(index))
            })
            .collect();
        info!(
            "Simulated drivetrain: gear ratio {}, {}+{} motors",
            units.gear_ratio(),
            config.left.motor_count(),
            config.right.motor_count()
        );
        Ok(Self { groups, units })
    }

    /// Conversion applied to every reading.
    pub fn units(&self) -> &UnitConversion {
        &self.units
    }
}

impl HardwarePort for SimulatedPort {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn group_count(&self) -> usize {
        self.groups.len()
    }

    fn tick_internal(&mut self, dt: Duration) {
        let steps = (dt.as_nanos() / SUBSTEP.as_nanos()).max(1);
        let h = dt.as_secs_f64() / steps as f64;
        for group in &mut self.groups {
            for _ in 0..steps {
                group.substep(h);
            }
        }
    }

    fn read(&mut self) -> GroupReadings {
        let mut readings = GroupReadings::new();
        for group in &self.groups {
            let _ = readings.push(group.reading(&self.units));
        }
        readings
    }

    fn set_voltage(&mut self, group: usize, volts: f64) {
        let Some(g) = self.groups.get_mut(group) else {
            debug!("Simulation: voltage for unknown group {group} ignored");
            return;
        };
        if matches!(g.command, GroupCommand::Velocity { .. }) {
            g.servo.reset();
        }
        g.command = GroupCommand::Voltage(clamp_voltage(volts, g.voltage_limit));
    }

    fn set_velocity(&mut self, group: usize, reference: f64, feedforward_volts: f64) {
        let reference_rpm = self.units.rpm_from_velocity(reference);
        let Some(g) = self.groups.get_mut(group) else {
            debug!("Simulation: velocity for unknown group {group} ignored");
            return;
        };
        g.command = GroupCommand::Velocity {
            reference_rpm,
            feedforward_volts: clamp_voltage(feedforward_volts, g.voltage_limit),
        };
    }
}
