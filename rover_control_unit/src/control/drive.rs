//! Drivetrain controller.
//!
//! Two paths, chosen by the held setpoint:
//!
//! | Setpoint                  | Output                                   | Mode         |
//! |---------------------------|------------------------------------------|--------------|
//! | `Arcade{forward, rotate}` | `clamp(f ± r, -1, 1) × max_volts`        | `OpenLoop`   |
//! | `WheelVelocity{l, r}`     | wheel rad/s reference + feedforward volts | `ClosedLoop` |
//!
//! The commanded setpoint holds until overwritten.

use rover_common::control_unit::config::DriveConfig;
use rover_common::control_unit::state::DriveMode;
use rover_common::hal::types::{OutputCommand, Setpoint};
use tracing::{debug, info, warn};

use super::feedforward::SimpleFeedforward;

/// Map arcade axes to per-side duty in `[-1, 1]`.
///
/// Inputs are clamped first, then each side: `left = f + r`,
/// `right = f - r`, clamped again.
#[inline]
pub fn arcade_mix(forward: f64, rotate: f64) -> (f64, f64) {
    let f = forward.clamp(-1.0, 1.0);
    let r = rotate.clamp(-1.0, 1.0);
    ((f + r).clamp(-1.0, 1.0), (f - r).clamp(-1.0, 1.0))
}

/// Differential drive controller.
#[derive(Debug, Clone)]
pub struct DriveController {
    max_volts: f64,
    half_track_m: f64,
    wheel_radius_m: f64,
    feedforward: SimpleFeedforward,
    setpoint: Setpoint,
}

impl DriveController {
    pub fn new(config: &DriveConfig) -> Self {
        Self {
            max_volts: config.max_volts,
            half_track_m: config.track_width_m / 2.0,
            wheel_radius_m: config.wheel_radius_m,
            feedforward: SimpleFeedforward::from(&config.feedforward),
            setpoint: Setpoint::Arcade {
                forward: 0.0,
                rotate: 0.0,
            },
        }
    }

    /// Held setpoint.
    #[inline]
    pub fn setpoint(&self) -> Setpoint {
        self.setpoint
    }

    /// Open-loop arcade drive. Axes outside `[-1, 1]` are clamped when the
    /// output is computed.
    pub fn drive_arcade(&mut self, forward: f64, rotate: f64) {
        if !forward.is_finite() || !rotate.is_finite() {
            warn!("Arcade ({forward}, {rotate}) refused");
            return;
        }
        self.hold(Setpoint::Arcade { forward, rotate });
    }

    /// Closed-loop wheel speeds [rad/s].
    pub fn set_velocity(&mut self, left: f64, right: f64) {
        if !left.is_finite() || !right.is_finite() {
            warn!("Wheel velocity ({left}, {right}) refused");
            return;
        }
        self.hold(Setpoint::WheelVelocity { left, right });
    }

    /// Chassis velocity: forward [m/s] and yaw rate [rad/s], counter-clockwise
    /// positive.
    pub fn drive_velocity(&mut self, linear_mps: f64, angular_radps: f64) {
        let (left, right) = self.wheel_speeds(linear_mps, angular_radps);
        self.set_velocity(left, right);
    }

    /// Differential kinematics: chassis velocity to wheel rad/s.
    pub fn wheel_speeds(&self, linear_mps: f64, angular_radps: f64) -> (f64, f64) {
        let turn = angular_radps * self.half_track_m;
        (
            (linear_mps - turn) / self.wheel_radius_m,
            (linear_mps + turn) / self.wheel_radius_m,
        )
    }

    /// Zero volts on both sides from the next tick.
    pub fn stop(&mut self) {
        self.drive_arcade(0.0, 0.0);
    }

    /// Output for the held setpoint.
    pub fn compute(&self) -> (OutputCommand, DriveMode) {
        match self.setpoint {
            Setpoint::Arcade { forward, rotate } => {
                let (left, right) = arcade_mix(forward, rotate);
                (
                    OutputCommand::voltage(&[left * self.max_volts, right * self.max_volts]),
                    DriveMode::OpenLoop,
                )
            }
            Setpoint::WheelVelocity { left, right } => (
                OutputCommand::velocity(
                    &[left, right],
                    &[
                        self.feedforward.calculate(left),
                        self.feedforward.calculate(right),
                    ],
                ),
                DriveMode::ClosedLoop,
            ),
            Setpoint::Position { .. } => (OutputCommand::neutral(2), DriveMode::OpenLoop),
        }
    }

    /// Adopt a setpoint replayed from a recording.
    pub fn apply_recorded(&mut self, setpoint: Setpoint) {
        match setpoint {
            Setpoint::Arcade { forward, rotate } => self.drive_arcade(forward, rotate),
            Setpoint::WheelVelocity { left, right } => self.set_velocity(left, right),
            Setpoint::Position { .. } => {
                warn!("Recorded drive setpoint {setpoint:?} ignored");
            }
        }
    }

    fn hold(&mut self, setpoint: Setpoint) {
        if setpoint == self.setpoint {
            return;
        }
        let mode_change = std::mem::discriminant(&setpoint) != std::mem::discriminant(&self.setpoint);
        if mode_change {
            info!("Drive setpoint {:?} -> {setpoint:?}", self.setpoint);
        } else {
            debug!("Drive setpoint {setpoint:?}");
        }
        self.setpoint = setpoint;
    }
}
