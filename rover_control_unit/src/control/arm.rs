//! Arm threshold controller.
//!
//! Three-state bang-bang regulation with a dead zone, evaluated once per
//! tick from the snapshot position. `error = position - setpoint`:
//!
//! ```text
//! error < -dead_zone  →  DrivePositive  (+applied_volts)
//! error >  dead_zone  →  DriveNegative  (-applied_volts)
//! otherwise           →  Hold           (0 V)
//! ```
//!
//! Converges to within `±dead_zone` of the setpoint. It only stays quiet at
//! the boundary if the dead zone exceeds the distance the arm coasts after
//! one tick at `applied_volts`.

use rover_common::control_unit::config::ArmConfig;
use rover_common::control_unit::state::ArmOutputState;
use tracing::{debug, info, warn};

/// Decision of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmDecision {
    pub state: ArmOutputState,
    pub volts: f64,
    /// `position - setpoint` [deg].
    pub error: f64,
}

/// Threshold controller state: setpoint plus last output decision.
#[derive(Debug, Clone)]
pub struct ArmController {
    dead_zone: f64,
    applied_volts: f64,
    setpoint: f64,
    state: ArmOutputState,
}

impl ArmController {
    pub fn new(config: &ArmConfig) -> Self {
        Self {
            dead_zone: config.dead_zone_deg,
            applied_volts: config.applied_volts,
            setpoint: config.initial_setpoint_deg,
            state: ArmOutputState::Hold,
        }
    }

    /// Pure threshold decision for a given error.
    #[inline]
    pub fn decide(error: f64, dead_zone: f64) -> ArmOutputState {
        if error < -dead_zone {
            ArmOutputState::DrivePositive
        } else if error > dead_zone {
            ArmOutputState::DriveNegative
        } else {
            // NaN lands here too: no reading, no drive.
            ArmOutputState::Hold
        }
    }

    /// Set the target angle [deg]. Last writer wins; visible next tick.
    ///
    /// Repeating the current setpoint changes nothing. A non-finite angle
    /// is refused and the previous setpoint kept.
    pub fn set_position(&mut self, degrees: f64) {
        if !degrees.is_finite() {
            warn!("Arm setpoint {degrees} refused, keeping {:.2} deg", self.setpoint);
            return;
        }
        if degrees == self.setpoint {
            debug!("Arm setpoint unchanged at {degrees:.2} deg");
            return;
        }
        info!("Arm setpoint {:.2} -> {degrees:.2} deg", self.setpoint);
        self.setpoint = degrees;
    }

    /// Current target angle [deg].
    #[inline]
    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Last output decision.
    #[inline]
    pub fn state(&self) -> ArmOutputState {
        self.state
    }

    /// Evaluate one tick. Never blocks; one call, one decision.
    pub fn evaluate(&mut self, position: f64) -> ArmDecision {
        let error = position - self.setpoint;
        let state = Self::decide(error, self.dead_zone);
        if state != self.state {
            debug!(
                "Arm {:?} -> {:?} (position {position:.2}, setpoint {:.2})",
                self.state, state, self.setpoint
            );
            self.state = state;
        }
        ArmDecision {
            state,
            volts: state.sign() * self.applied_volts,
            error,
        }
    }

    /// Drop the last decision (the mechanism was taken over and released).
    pub fn reset(&mut self) {
        self.state = ArmOutputState::Hold;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> ArmController {
        ArmController::new(&ArmConfig::default())
    }

    #[test]
    fn below_setpoint_drives_positive() {
        let mut arm = controller();
        arm.set_position(90.0);
        let d = arm.evaluate(10.0);
        assert_eq!(d.state, ArmOutputState::DrivePositive);
        assert_eq!(d.volts, 1.0);
        assert_eq!(d.error, -80.0);
    }

    #[test]
    fn above_setpoint_drives_negative() {
        let mut arm = controller();
        arm.set_position(90.0);
        let d = arm.evaluate(120.0);
        assert_eq!(d.state, ArmOutputState::DriveNegative);
        assert_eq!(d.volts, -1.0);
    }

    #[test]
    fn dead_zone_edges_hold() {
        let mut arm = controller();
        arm.set_position(90.0);
        assert_eq!(arm.evaluate(87.0).volts, 0.0);
        assert_eq!(arm.evaluate(93.0).volts, 0.0);
        assert_eq!(arm.evaluate(86.9).state, ArmOutputState::DrivePositive);
        assert_eq!(arm.evaluate(93.1).state, ArmOutputState::DriveNegative);
    }

    #[test]
    fn set_position_is_idempotent() {
        let mut once = controller();
        once.set_position(45.0);
        let a = once.evaluate(0.0);

        let mut twice = controller();
        twice.set_position(45.0);
        twice.set_position(45.0);
        let b = twice.evaluate(0.0);

        assert_eq!(a, b);
        assert_eq!(once.setpoint(), twice.setpoint());
        assert_eq!(once.state(), twice.state());
    }

    #[test]
    fn non_finite_setpoint_is_refused() {
        let mut arm = controller();
        arm.set_position(30.0);
        arm.set_position(f64::NAN);
        arm.set_position(f64::INFINITY);
        assert_eq!(arm.setpoint(), 30.0);
    }

    #[test]
    fn missing_position_holds() {
        let mut arm = controller();
        assert_eq!(arm.evaluate(f64::NAN).state, ArmOutputState::Hold);
    }

    #[test]
    fn reset_returns_to_hold() {
        let mut arm = controller();
        arm.set_position(90.0);
        arm.evaluate(0.0);
        assert_eq!(arm.state(), ArmOutputState::DrivePositive);
        arm.reset();
        assert_eq!(arm.state(), ArmOutputState::Hold);
    }
}
