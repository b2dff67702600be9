//! Property tests: arm threshold rule, output guard, arcade mapping.

use proptest::prelude::*;
use rover_common::control_unit::config::{ArmConfig, RobotConfig};
use rover_common::control_unit::record::MechanismId;
use rover_common::control_unit::state::{ArmOutputState, LimitClamp};
use rover_control_unit::control::{ArmController, TravelLimits, arcade_mix};

use super::sim_scheduler;

proptest! {
    #[test]
    fn arm_decision_matches_threshold_rule(position in -10.0f64..200.0, setpoint in -5.0f64..185.0) {
        let mut arm = ArmController::new(&ArmConfig::default());
        arm.set_position(setpoint);
        let decision = arm.evaluate(position);
        let error = position - setpoint;
        if error.abs() <= 3.0 {
            prop_assert_eq!(decision.state, ArmOutputState::Hold);
            prop_assert_eq!(decision.volts, 0.0);
        } else if error < 0.0 {
            prop_assert_eq!(decision.volts, 1.0);
        } else {
            prop_assert_eq!(decision.volts, -1.0);
        }
    }

    #[test]
    fn repeated_setpoint_is_idempotent(setpoint in -5.0f64..185.0, position in -5.0f64..185.0, repeats in 1usize..5) {
        let mut once = ArmController::new(&ArmConfig::default());
        once.set_position(setpoint);
        let mut many = ArmController::new(&ArmConfig::default());
        for _ in 0..repeats {
            many.set_position(setpoint);
        }
        prop_assert_eq!(once.evaluate(position), many.evaluate(position));
    }

    #[test]
    fn guard_never_pushes_past_a_limit(position in -20.0f64..200.0, volts in -12.0f64..12.0) {
        let limits = TravelLimits::new(-5.0, 185.0);
        let (out, clamp) = limits.guard(position, volts);
        if position >= 185.0 {
            prop_assert!(out <= 0.0);
        }
        if position <= -5.0 {
            prop_assert!(out >= 0.0);
        }
        match clamp {
            Some(LimitClamp::Upper) => prop_assert!(volts > 0.0 && out == 0.0),
            Some(LimitClamp::Lower) => prop_assert!(volts < 0.0 && out == 0.0),
            None => prop_assert_eq!(out, volts),
        }
    }

    #[test]
    fn arcade_outputs_stay_in_range(forward in -3.0f64..3.0, rotate in -3.0f64..3.0) {
        let (left, right) = arcade_mix(forward, rotate);
        prop_assert!((-1.0..=1.0).contains(&left));
        prop_assert!((-1.0..=1.0).contains(&right));
        // Symmetric in rotation.
        let (l2, r2) = arcade_mix(forward, -rotate);
        prop_assert_eq!(left, r2);
        prop_assert_eq!(right, l2);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn arm_converges_to_any_reachable_setpoint(setpoint in 0.0f64..180.0) {
        let mut sched = sim_scheduler(&RobotConfig::default());
        sched.arm_mut().set_position(setpoint);
        sched.step(350);
        let last = sched
            .sink()
            .iter()
            .filter(|r| r.mechanism == MechanismId::Arm)
            .last()
            .unwrap();
        let position = last.groups()[0].position;
        prop_assert!((position - setpoint).abs() <= 3.0, "{} vs {}", position, setpoint);
        prop_assert!(last.output.is_neutral());
    }
}
