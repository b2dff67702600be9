//! Real hardware port.
//!
//! Drives physical motor groups through the [`MotorController`] seam. The
//! leader of each group carries the encoder and receives every command;
//! followers are bound to their own leader at start-up and are only read
//! for current afterwards.
//!
//! # Communication faults
//!
//! A failed read or write marks the port disconnected. While disconnected
//! the port serves the last readings that were read successfully and drops
//! output commands. The next successful read reconnects it. Neither
//! transition ever surfaces as an error to the tick.

use rover_common::consts::MAX_MOTORS_PER_GROUP;
use rover_common::control_unit::config::PdGains;
use rover_common::hal::config::MotorGroupConfig;
use rover_common::hal::driver::{HalError, HardwarePort, clamp_voltage};
use rover_common::hal::types::{GroupReading, GroupReadings, MotorCurrents};
use rover_common::hal::units::UnitConversion;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use super::device::{MotorBus, MotorController, MotorSetup};

/// Static description of one group to open.
#[derive(Debug, Clone, Copy)]
pub struct GroupSpec<'a> {
    pub config: &'a MotorGroupConfig,
    /// Onboard velocity loop gains; `None` for groups only driven by voltage.
    pub gains: Option<PdGains>,
}

struct RealGroup {
    leader: Box<dyn MotorController>,
    followers: Vec<Box<dyn MotorController>>,
    voltage_limit: f64,
}

impl RealGroup {
    fn poll(&self, units: &UnitConversion) -> Result<GroupReading, HalError> {
        let mut current_amps = MotorCurrents::new();
        for motor in std::iter::once(&self.leader)
            .chain(self.followers.iter())
            .take(MAX_MOTORS_PER_GROUP)
        {
            let _ = current_amps.push(motor.output_current()?);
        }
        Ok(GroupReading {
            position: units.position_from_rotations(self.leader.position_rotations()?),
            velocity: units.velocity_from_rpm(self.leader.velocity_rpm()?),
            applied_volts: self.leader.applied_output()? * self.leader.bus_voltage()?,
            current_amps,
        })
    }
}

/// Physical motor controllers behind the port capability.
pub struct RealPort {
    groups: Vec<RealGroup>,
    units: UnitConversion,
    last: GroupReadings,
    connected: bool,
    dropped_commands: u64,
}

fn init_failed(can_id: u8, e: HalError) -> HalError {
    HalError::InitFailed(format!("motor controller {can_id}: {e}"))
}

impl RealPort {
    /// Open and configure every controller of every group.
    ///
    /// Followers are bound to the leader of their own group.
    ///
    /// # Errors
    /// `HalError::InitFailed` if any controller cannot be opened or configured.
    pub fn open(
        bus: &mut dyn MotorBus,
        units: UnitConversion,
        specs: &[GroupSpec<'_>],
    ) -> Result<Self, HalError> {
        let mut groups = Vec::with_capacity(specs.len());
        let mut last = GroupReadings::new();

        for spec in specs {
            let cfg = spec.config;
            let mut leader = bus.open(cfg.leader_id)?;
            leader
                .configure(&MotorSetup::leader(cfg))
                .map_err(|e| init_failed(cfg.leader_id, e))?;
            if let Some(gains) = spec.gains {
                leader
                    .set_pd(gains.kp, gains.kd)
                    .map_err(|e| init_failed(cfg.leader_id, e))?;
            }

            let mut followers = Vec::with_capacity(cfg.followers.len());
            for f in &cfg.followers {
                let mut follower = bus.open(f.can_id)?;
                follower
                    .configure(&MotorSetup::follower(cfg))
                    .map_err(|e| init_failed(f.can_id, e))?;
                follower
                    .follow(cfg.leader_id, f.inverted)
                    .map_err(|e| init_failed(f.can_id, e))?;
                followers.push(follower);
            }

            info!(
                "Motor group: leader {} (inverted: {}), followers {:?}, {} A limit",
                cfg.leader_id,
                cfg.inverted,
                cfg.followers.iter().map(|f| f.can_id).collect::<Vec<_>>(),
                cfg.current_limit_amps
            );

            let mut current_amps = MotorCurrents::new();
            for _ in 0..cfg.motor_count().min(MAX_MOTORS_PER_GROUP) {
                let _ = current_amps.push(0.0);
            }
            let _ = last.push(GroupReading {
                current_amps,
                ..GroupReading::default()
            });
            groups.push(RealGroup {
                leader,
                followers,
                voltage_limit: cfg.voltage_compensation,
            });
        }

        Ok(Self {
            groups,
            units,
            last,
            connected: true,
            dropped_commands: 0,
        })
    }

    /// Output commands dropped while disconnected.
    pub fn dropped_commands(&self) -> u64 {
        self.dropped_commands
    }

    fn mark_disconnected(&mut self, e: &HalError) {
        if self.connected {
            warn!("Real port disconnected, serving last-known readings: {e}");
        }
        self.connected = false;
    }

    /// Drop the command when disconnected; returns whether it may be sent.
    fn accept_command(&mut self, group: usize) -> bool {
        if !self.connected {
            self.dropped_commands += 1;
            trace!("Real port: command for group {group} dropped (disconnected)");
            return false;
        }
        if group >= self.groups.len() {
            debug!("Real port: command for unknown group {group} ignored");
            return false;
        }
        true
    }
}

impl HardwarePort for RealPort {
    fn name(&self) -> &'static str {
        "real"
    }

    fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// The velocity loops run on the controllers themselves.
    fn tick_internal(&mut self, _dt: Duration) {}

    fn read(&mut self) -> GroupReadings {
        let mut readings = GroupReadings::new();
        let mut fault = None;
        for group in &self.groups {
            match group.poll(&self.units) {
                Ok(r) => {
                    let _ = readings.push(r);
                }
                Err(e) => {
                    fault = Some(e);
                    break;
                }
            }
        }

        match fault {
            Some(e) => {
                self.mark_disconnected(&e);
                self.last.clone()
            }
            None => {
                if !self.connected {
                    info!("Real port reconnected");
                    self.connected = true;
                }
                self.last = readings.clone();
                readings
            }
        }
    }

    fn set_voltage(&mut self, group: usize, volts: f64) {
        if !self.accept_command(group) {
            return;
        }
        let g = &mut self.groups[group];
        let volts = clamp_voltage(volts, g.voltage_limit);
        if let Err(e) = g.leader.set_voltage(volts) {
            self.mark_disconnected(&e);
        }
    }

    fn set_velocity(&mut self, group: usize, reference: f64, feedforward_volts: f64) {
        if !self.accept_command(group) {
            return;
        }
        let rpm = self.units.rpm_from_velocity(reference);
        let g = &mut self.groups[group];
        let ff = clamp_voltage(feedforward_volts, g.voltage_limit);
        if let Err(e) = g.leader.set_velocity_reference(rpm, ff) {
            self.mark_disconnected(&e);
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
