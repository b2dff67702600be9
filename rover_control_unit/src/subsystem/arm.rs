//! Arm subsystem: threshold controller behind the travel-limit guard.

use rover_common::control_unit::config::RobotConfig;
use rover_common::control_unit::record::{LogRecord, MechanismId};
use rover_common::control_unit::state::{ControllerState, Direction, LimitClamp};
use rover_common::hal::driver::HardwarePort;
use rover_common::hal::types::{OutputCommand, Setpoint, TickStamp};
use rover_hal::Port;
use tracing::{debug, info, trace};

use super::{Subsystem, park_completed};
use crate::characterization::{Characterization, CharacterizationRun, SysIdStep};
use crate::control::{ArmController, TravelLimits};

/// Single-joint arm.
pub struct ArmSubsystem {
    port: Port,
    controller: ArmController,
    limits: TravelLimits,
    sysid: Characterization,
    clamp: Option<LimitClamp>,
    completed: Option<CharacterizationRun>,
}

impl ArmSubsystem {
    pub fn new(port: Port, config: &RobotConfig) -> Self {
        Self {
            port,
            controller: ArmController::new(&config.arm),
            limits: TravelLimits::new(config.arm.lower_limit_deg, config.arm.upper_limit_deg),
            sysid: Characterization::new(
                MechanismId::Arm,
                &config.characterization,
                config.cycle.period_s(),
            ),
            clamp: None,
            completed: None,
        }
    }

    /// Target angle [deg], effective from the next tick.
    pub fn set_position(&mut self, degrees: f64) {
        self.controller.set_position(degrees);
    }

    pub fn controller(&self) -> &ArmController {
        &self.controller
    }

    pub fn limits(&self) -> TravelLimits {
        self.limits
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

    /// End the active run. Output drops to zero immediately and the
    /// threshold controller takes over again from the next tick.
    ///
    /// The neutral command is sent between ticks, so no [`LogRecord`]
    /// carries it; the next record's readings show its effect.
    pub fn stop_characterization(&mut self) -> Option<CharacterizationRun> {
        let run = self.sysid.stop()?;
        self.release();
        Some(run)
    }

    /// Run that ended on its own timeout, if not yet collected.
    pub fn take_completed_run(&mut self) -> Option<CharacterizationRun> {
        self.completed.take()
    }

    fn release(&mut self) {
        debug!("Arm characterization stopped: neutral sent outside the tick");
        self.port.dispatch(&OutputCommand::neutral(1));
        self.controller.reset();
    }

    fn guard(&mut self, position: f64, volts: f64) -> (f64, Option<LimitClamp>) {
        let (volts, clamp) = self.limits.guard(position, volts);
        if clamp != self.clamp {
            if let Some(limit) = clamp {
                info!("Arm output clamped at {limit:?} travel limit ({position:.2} deg)");
            }
            self.clamp = clamp;
        }
        (volts, clamp)
    }
}

impl Subsystem for ArmSubsystem {
    fn mechanism(&self) -> MechanismId {
        MechanismId::Arm
    }

    fn periodic(&mut self, stamp: TickStamp) -> LogRecord {
        self.port.tick_internal(stamp.period());
        if let Some(Setpoint::Position { degrees }) = self.port.recorded_setpoint() {
            self.controller.set_position(degrees);
        }

        let setpoint = Setpoint::Position {
            degrees: self.controller.setpoint(),
        };
        let snapshot = self.port.capture_snapshot(stamp, setpoint);
        // No reading: NaN holds the arm and trips neither limit.
        let position = snapshot.position(0).unwrap_or(f64::NAN);

        let mut excitation = self.sysid.step(&snapshot);
        if excitation == Some(SysIdStep::TimedOut) {
            park_completed(&mut self.completed, self.sysid.expire());
            self.controller.reset();
            excitation = None;
        }

        let (volts, state) = match excitation {
            Some(SysIdStep::Drive(raw)) => {
                let (volts, clamp) = self.guard(position, raw);
                self.sysid.record(snapshot.clone(), volts);
                (
                    volts,
                    ControllerState::Characterization {
                        label: self.sysid.label(),
                        commanded_volts: volts,
                        clamp,
                    },
                )
            }
            _ => {
                let decision = self.controller.evaluate(position);
                let (volts, clamp) = self.guard(position, decision.volts);
                (
                    volts,
                    ControllerState::Arm {
                        state: decision.state,
                        error_deg: decision.error,
                        clamp,
                    },
                )
            }
        };

        trace!("Arm tick {}: {position:.3} deg -> {volts} V", stamp.tick);
        let output = OutputCommand::voltage(&[volts]);
        self.port.dispatch(&output);
        LogRecord::new(MechanismId::Arm, snapshot, output, state)
    }

    fn port(&self) -> &Port {
        &self.port
    }
}
