//! Closed set of port backends.
//!
//! Every mechanism owns exactly one [`Port`], chosen once at start-up and
//! never swapped. [`PortSet`] builds the pair (drive, arm) for one run.

use rover_common::control_unit::config::RobotConfig;
use rover_common::control_unit::record::MechanismId;
use rover_common::hal::driver::{HalError, HardwarePort, PortKind};
use rover_common::hal::types::{GroupReadings, InputSnapshot, OutputCommand, Setpoint, TickStamp};
use std::time::Duration;
use tracing::info;

use crate::drivers::real::{GroupSpec, MotorBus, RealPort};
use crate::drivers::replay::{Recording, ReplayPort};
use crate::drivers::simulation::SimulatedPort;

/// One mechanism's hardware port.
pub enum Port {
    Real(RealPort),
    Simulated(SimulatedPort),
    Replay(ReplayPort),
}

impl Port {
    /// Backend kind.
    pub fn kind(&self) -> PortKind {
        match self {
            Self::Real(_) => PortKind::Real,
            Self::Simulated(_) => PortKind::Simulation,
            Self::Replay(_) => PortKind::Replay,
        }
    }

    /// Replay port, if this is one.
    pub fn as_replay(&self) -> Option<&ReplayPort> {
        match self {
            Self::Replay(p) => Some(p),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn HardwarePort {
        match self {
            Self::Real(p) => p,
            Self::Simulated(p) => p,
            Self::Replay(p) => p,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn HardwarePort {
        match self {
            Self::Real(p) => p,
            Self::Simulated(p) => p,
            Self::Replay(p) => p,
        }
    }
}

impl HardwarePort for Port {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn group_count(&self) -> usize {
        self.inner().group_count()
    }

    fn tick_internal(&mut self, dt: Duration) {
        self.inner_mut().tick_internal(dt);
    }

    fn read(&mut self) -> GroupReadings {
        self.inner_mut().read()
    }

    fn set_voltage(&mut self, group: usize, volts: f64) {
        self.inner_mut().set_voltage(group, volts);
    }

    fn set_velocity(&mut self, group: usize, reference: f64, feedforward_volts: f64) {
        self.inner_mut().set_velocity(group, reference, feedforward_volts);
    }

    fn is_connected(&self) -> bool {
        self.inner().is_connected()
    }

    fn max_voltage(&self) -> f64 {
        self.inner().max_voltage()
    }

    fn recorded_setpoint(&self) -> Option<Setpoint> {
        self.inner().recorded_setpoint()
    }

    fn capture_snapshot(&mut self, stamp: TickStamp, setpoint: Setpoint) -> InputSnapshot {
        self.inner_mut().capture_snapshot(stamp, setpoint)
    }

    fn dispatch(&mut self, output: &OutputCommand) {
        self.inner_mut().dispatch(output);
    }
}

impl From<RealPort> for Port {
    fn from(p: RealPort) -> Self {
        Self::Real(p)
    }
}

impl From<SimulatedPort> for Port {
    fn from(p: SimulatedPort) -> Self {
        Self::Simulated(p)
    }
}

impl From<ReplayPort> for Port {
    fn from(p: ReplayPort) -> Self {
        Self::Replay(p)
    }
}

/// The ports of one run, one per mechanism.
pub struct PortSet {
    pub drive: Port,
    pub arm: Port,
}

fn config_error(e: impl std::fmt::Display) -> HalError {
    HalError::ConfigError(e.to_string())
}

impl PortSet {
    /// Simulated drivetrain and arm.
    pub fn simulated(config: &RobotConfig) -> Result<Self, HalError> {
        Ok(Self {
            drive: SimulatedPort::drive(&config.drive)?.into(),
            arm: SimulatedPort::arm(&config.arm)?.into(),
        })
    }

    /// Replay both mechanisms from one recording.
    pub fn replay(mut recording: Recording) -> Result<Self, HalError> {
        Ok(Self {
            drive: ReplayPort::new(MechanismId::Drive, recording.take(MechanismId::Drive))?.into(),
            arm: ReplayPort::new(MechanismId::Arm, recording.take(MechanismId::Arm))?.into(),
        })
    }

    /// Open the physical controllers on `bus`.
    pub fn real(bus: &mut dyn MotorBus, config: &RobotConfig) -> Result<Self, HalError> {
        let drive = RealPort::open(
            bus,
            config.drive.units().map_err(config_error)?,
            &[
                GroupSpec {
                    config: &config.drive.left,
                    gains: Some(config.drive.left_gains),
                },
                GroupSpec {
                    config: &config.drive.right,
                    gains: Some(config.drive.right_gains),
                },
            ],
        )?;
        let arm = RealPort::open(
            bus,
            config.arm.units().map_err(config_error)?,
            &[GroupSpec {
                config: &config.arm.motor,
                gains: None,
            }],
        )?;
        Ok(Self {
            drive: drive.into(),
            arm: arm.into(),
        })
    }

    /// Build the ports a configuration selects.
    ///
    /// # Errors
    /// `HalError::InitFailed` for the real backend, which needs a
    /// [`MotorBus`] from a vendor binding (use [`PortSet::real`]);
    /// `HalError::RecordingError` if the replay log cannot be loaded.
    pub fn from_config(config: &RobotConfig) -> Result<Self, HalError> {
        info!("Port backend: {}", config.port.backend);
        match config.port.backend {
            PortKind::Simulation => Self::simulated(config),
            PortKind::Replay => {
                let path = config.port.replay_log.as_deref().ok_or_else(|| {
                    HalError::ConfigError("replay backend requires port.replay_log".to_string())
                })?;
                Self::replay(Recording::load(path)?)
            }
            PortKind::Real => Err(HalError::InitFailed(
                "real backend requires a motor-controller bus".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_set_has_expected_groups() {
        let ports = PortSet::simulated(&RobotConfig::default()).unwrap();
        assert_eq!(ports.drive.kind(), PortKind::Simulation);
        assert_eq!(ports.drive.group_count(), 2);
        assert_eq!(ports.arm.group_count(), 1);
        assert!(ports.arm.as_replay().is_none());
    }

    #[test]
    fn real_backend_needs_a_bus() {
        let mut config = RobotConfig::default();
        config.port.backend = PortKind::Real;
        assert!(matches!(
            PortSet::from_config(&config),
            Err(HalError::InitFailed(_))
        ));
    }

    #[test]
    fn replay_needs_both_mechanisms() {
        assert!(matches!(
            PortSet::replay(Recording::default()),
            Err(HalError::RecordingError(_))
        ));
    }
}
