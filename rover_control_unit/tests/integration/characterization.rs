//! Characterization runs through the scheduler.

use rover_common::control_unit::config::RobotConfig;
use rover_common::control_unit::record::MechanismId;
use rover_common::control_unit::state::{ControllerState, Direction, SysIdLabel};

use super::sim_scheduler;

#[test]
fn arm_quasistatic_ramp_then_restore() {
    let mut sched = sim_scheduler(&RobotConfig::default());
    assert!(sched.arm_mut().start_quasistatic(Direction::Forward));
    sched.step(100);

    let run = sched.arm_mut().stop_characterization().unwrap();
    assert_eq!(run.mechanism, MechanismId::Arm);
    assert_eq!(run.label, SysIdLabel::QuasistaticForward);
    assert_eq!(run.samples.len(), 100);
    assert!(!run.timed_out);
    // Ramp: non-decreasing, 1 V/s over 99 ticks of 20 ms.
    assert!(run.samples.windows(2).all(|w| w[1].commanded_volts >= w[0].commanded_volts));
    assert!((run.samples[99].commanded_volts - 1.98).abs() < 1e-9);
    // The arm moved forward under the ramp.
    let last = run.samples.last().unwrap();
    assert!(last.snapshot.position(0).unwrap() > 0.0);

    // Next tick the threshold controller is back, steering to its 0 deg setpoint.
    sched.step(1);
    let record = sched.sink().iter().last().unwrap();
    assert!(matches!(record.controller_state, ControllerState::Arm { .. }));
    assert_eq!(sched.arm().characterization().label(), SysIdLabel::Idle);
}

#[test]
fn start_during_run_is_ignored() {
    let mut sched = sim_scheduler(&RobotConfig::default());
    assert!(sched.drive_mut().start_dynamic(Direction::Reverse));
    sched.step(5);
    assert!(!sched.drive_mut().start_quasistatic(Direction::Forward));
    sched.step(5);

    let run = sched.drive_mut().stop_characterization().unwrap();
    assert_eq!(run.label, SysIdLabel::DynamicReverse);
    assert_eq!(run.samples.len(), 10);
    assert!(run.samples.iter().all(|s| s.commanded_volts == -4.0));
    assert!(run.samples[9].snapshot.velocity(0).unwrap() < 0.0);
}

#[test]
fn run_times_out_and_hands_back_samples() {
    let mut config = RobotConfig::default();
    config.characterization.timeout_s = 0.5;
    let mut sched = sim_scheduler(&config);
    sched.drive_mut().start_dynamic(Direction::Forward);
    sched.step(30);

    assert!(!sched.drive().characterization().is_running());
    let run = sched.drive_mut().take_completed_run().unwrap();
    assert!(run.timed_out);
    // Ticks 0..=25 cover 0.5 s exactly.
    assert_eq!(run.samples.len(), 26);
    assert_eq!(run.duration_us(), 500_000);

    // From tick 26 the drive is back on its stopped arcade setpoint.
    let drive_records: Vec<_> = sched
        .sink()
        .iter()
        .filter(|r| r.mechanism == MechanismId::Drive)
        .collect();
    assert!(matches!(
        drive_records[25].controller_state,
        ControllerState::Characterization { .. }
    ));
    assert!(matches!(drive_records[26].controller_state, ControllerState::Drive { .. }));
    assert!(drive_records[26].output.is_neutral());
}

#[test]
fn stop_without_run_returns_nothing() {
    let mut sched = sim_scheduler(&RobotConfig::default());
    assert!(sched.arm_mut().stop_characterization().is_none());
    assert!(sched.drive_mut().take_completed_run().is_none());
}

#[test]
fn samples_carry_full_snapshots_and_labels() {
    let mut sched = sim_scheduler(&RobotConfig::default());
    sched.drive_mut().start_quasistatic(Direction::Reverse);
    sched.step(3);
    let run = sched.drive_mut().stop_characterization().unwrap();
    for (tick, sample) in run.samples.iter().enumerate() {
        assert_eq!(sample.snapshot.tick(), tick as u64);
        assert_eq!(sample.snapshot.groups().len(), 2);
        assert_eq!(sample.label, SysIdLabel::QuasistaticReverse);
    }
}
