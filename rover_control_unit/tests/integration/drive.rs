//! Drivetrain control against the simulated sides.

use rover_common::prelude::*;

use super::sim_scheduler;

fn last_drive(records: impl Iterator<Item = LogRecord>) -> LogRecord {
    records
        .filter(|r| r.mechanism == MechanismId::Drive)
        .last()
        .unwrap()
}

#[test]
fn arcade_forward_moves_both_sides_forward() {
    let mut sched = sim_scheduler(&RobotConfig::default());
    sched.drive_mut().drive_arcade(0.5, 0.0);
    sched.step(100);

    let last = last_drive(sched.into_sink().into_records().into_iter());
    assert_eq!(last.output, OutputCommand::voltage(&[6.0, 6.0]));
    let [left, right] = [&last.groups()[0], &last.groups()[1]];
    assert!(left.velocity > 25.0, "{}", left.velocity);
    assert_eq!(left.velocity, right.velocity);
    assert_eq!(left.current_amps.len(), 3);
}

#[test]
fn arcade_rotation_spins_sides_opposite() {
    let mut sched = sim_scheduler(&RobotConfig::default());
    sched.drive_mut().drive_arcade(0.0, 0.5);
    sched.step(50);

    let last = last_drive(sched.into_sink().into_records().into_iter());
    assert!(last.groups()[0].velocity > 0.0);
    assert!(last.groups()[1].velocity < 0.0);
}

#[test]
fn closed_loop_velocity_converges() {
    let mut sched = sim_scheduler(&RobotConfig::default());
    sched.drive_mut().set_velocity(20.0, 20.0);
    sched.step(150);

    let last = last_drive(sched.into_sink().into_records().into_iter());
    assert_eq!(
        last.controller_state,
        ControllerState::Drive {
            mode: DriveMode::ClosedLoop
        }
    );
    for side in last.groups() {
        assert!((side.velocity - 20.0).abs() < 1.0, "{}", side.velocity);
    }
}

#[test]
fn stop_zeroes_both_sides_in_one_tick() {
    let mut sched = sim_scheduler(&RobotConfig::default());
    sched.drive_mut().drive_arcade(1.0, 0.0);
    sched.step(20);
    sched.drive_mut().stop();
    sched.step(1);

    let last = last_drive(sched.into_sink().into_records().into_iter());
    assert_eq!(last.output, OutputCommand::voltage(&[0.0, 0.0]));
}
