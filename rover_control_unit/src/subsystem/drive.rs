//! Drive subsystem: differential drivetrain, left group 0, right group 1.

use rover_common::control_unit::config::RobotConfig;
use rover_common::control_unit::record::{LogRecord, MechanismId};
use rover_common::control_unit::state::{ControllerState, Direction};
use rover_common::hal::driver::HardwarePort;
use rover_common::hal::types::{OutputCommand, TickStamp};
use rover_hal::Port;
use tracing::{debug, trace};

use super::{Subsystem, park_completed};
use crate::characterization::{Characterization, CharacterizationRun, SysIdStep};
use crate::control::DriveController;

pub struct DriveSubsystem {
    port: Port,
    controller: DriveController,
    sysid: Characterization,
    completed: Option<CharacterizationRun>,
}

impl DriveSubsystem {
    pub fn new(port: Port, config: &RobotConfig) -> Self {
        Self {
            port,
            controller: DriveController::new(&config.drive),
            sysid: Characterization::new(
                MechanismId::Drive,
                &config.characterization,
                config.cycle.period_s(),
            ),
            completed: None,
        }
    }

    pub fn drive_arcade(&mut self, forward: f64, rotate: f64) {
        self.controller.drive_arcade(forward, rotate);
    }

    /// Wheel speeds [rad/s].
    pub fn set_velocity(&mut self, left: f64, right: f64) {
        self.controller.set_velocity(left, right);
    }

    /// Chassis velocity [m/s, rad/s].
    pub fn drive_velocity(&mut self, linear_mps: f64, angular_radps: f64) {
        self.controller.drive_velocity(linear_mps, angular_radps);
    }

    pub fn stop(&mut self) {
        self.controller.stop();
    }

    pub fn controller(&self) -> &DriveController {
        &self.controller
    }

    pub fn characterization(&self) -> &Characterization {
        &self.sysid
    }

    pub fn start_quasistatic(&mut self, direction: Direction) -> bool {
        self.sysid.start_quasistatic(direction)
    }

    pub fn start_dynamic(&mut self, direction: Direction) -> bool {
        self.sysid.start_dynamic(direction)
    }

    /// End the active run; both sides drop to zero volts at once.
    ///
    /// The neutral command is sent between ticks, so no [`LogRecord`]
    /// carries it; the next record's readings show its effect.
    pub fn stop_characterization(&mut self) -> Option<CharacterizationRun> {
        let run = self.sysid.stop()?;
        debug!("Drive characterization stopped: neutral sent outside the tick");
        self.port.dispatch(&OutputCommand::neutral(2));
        Some(run)
    }

    pub fn take_completed_run(&mut self) -> Option<CharacterizationRun> {
        self.completed.take()
    }
}

impl Subsystem for DriveSubsystem {
    fn mechanism(&self) -> MechanismId {
        MechanismId::Drive
    }

    fn periodic(&mut self, stamp: TickStamp) -> LogRecord {
        self.port.tick_internal(stamp.period());
        if let Some(setpoint) = self.port.recorded_setpoint() {
            self.controller.apply_recorded(setpoint);
        }

        let snapshot = self.port.capture_snapshot(stamp, self.controller.setpoint());

        let mut excitation = self.sysid.step(&snapshot);
        if excitation == Some(SysIdStep::TimedOut) {
            park_completed(&mut self.completed, self.sysid.expire());
            excitation = None;
        }

        let (output, state) = match excitation {
            Some(SysIdStep::Drive(volts)) => {
                self.sysid.record(snapshot.clone(), volts);
                (
                    OutputCommand::voltage(&[volts, volts]),
                    ControllerState::Characterization {
                        label: self.sysid.label(),
                        commanded_volts: volts,
                        clamp: None,
                    },
                )
            }
            _ => {
                let (output, mode) = self.controller.compute();
                (output, ControllerState::Drive { mode })
            }
        };

        trace!("Drive tick {}: {output:?}", stamp.tick);
        self.port.dispatch(&output);
        LogRecord::new(MechanismId::Drive, snapshot, output, state)
    }

    fn port(&self) -> &Port {
        &self.port
    }
}
