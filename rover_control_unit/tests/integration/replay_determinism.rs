//! Record a simulated run to JSON Lines, replay it, compare.

use rover_common::control_unit::config::RobotConfig;
use rover_common::control_unit::record::LogRecord;
use rover_common::hal::driver::PortKind;
use rover_control_unit::cycle::TickScheduler;
use rover_control_unit::recorder::{LogWriter, RecordLog, RecordSink};
use rover_control_unit::subsystem::Subsystem;
use rover_hal::PortSet;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use super::sim_scheduler;

/// Commander script: what a driver would do over 200 ticks.
fn scripted<S: RecordSink>(sched: &mut TickScheduler<S>) {
    for tick in 0..200u64 {
        match tick {
            10 => sched.arm_mut().set_position(90.0),
            20 => sched.drive_mut().drive_arcade(0.5, 0.25),
            80 => sched.drive_mut().set_velocity(15.0, 10.0),
            120 => sched.arm_mut().set_position(30.0),
            150 => sched.drive_mut().drive_velocity(0.5, -0.4),
            180 => sched.drive_mut().stop(),
            _ => {}
        }
        sched.periodic();
    }
}

fn record_run(config: &RobotConfig, path: &Path) {
    let writer = LogWriter::create(path, 1024).unwrap();
    let mut sched = TickScheduler::from_config(config, writer).unwrap();
    scripted(&mut sched);
    let summary = sched.into_sink().finish().unwrap();
    assert_eq!(summary.written, 400);
    assert_eq!(summary.dropped, 0);
}

fn replay_config(path: &Path) -> RobotConfig {
    let mut config = RobotConfig::default();
    config.port.backend = PortKind::Replay;
    config.port.replay_log = Some(path.to_path_buf());
    config
}

#[test]
fn simulated_runs_are_bit_identical() {
    let mut a = sim_scheduler(&RobotConfig::default());
    let mut b = sim_scheduler(&RobotConfig::default());
    scripted(&mut a);
    scripted(&mut b);
    let a: Vec<LogRecord> = a.into_sink().into_records();
    let b: Vec<LogRecord> = b.into_sink().into_records();
    assert_eq!(a.len(), 400);
    assert_eq!(a, b);
}

#[test]
fn replay_reproduces_snapshots_and_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.jsonl");
    record_run(&RobotConfig::default(), &path);

    // The live run, for comparison.
    let mut live = sim_scheduler(&RobotConfig::default());
    scripted(&mut live);
    let live = live.into_sink().into_records();

    // Replay with no commander: setpoints come from the recording.
    let mut replay = TickScheduler::from_config(&replay_config(&path), RecordLog::default()).unwrap();
    replay.step(200);
    assert!(replay.replay_finished());

    let replayed = replay.sink().iter().cloned().collect::<Vec<_>>();
    assert_eq!(replayed.len(), live.len());
    for (r, l) in replayed.iter().zip(&live) {
        assert_eq!(r.snapshot, l.snapshot, "tick {} {}", l.tick(), l.mechanism);
        assert_eq!(r.output, l.output, "tick {} {}", l.tick(), l.mechanism);
        assert_eq!(r.controller_state, l.controller_state);
    }

    for port in [replay.drive().port(), replay.arm().port()] {
        assert_eq!(port.as_replay().unwrap().divergences(), 0);
    }
}

#[test]
fn paced_replay_stops_when_the_recording_ends() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.jsonl");

    let mut config = RobotConfig::default();
    config.cycle.period_us = 1_000;
    let writer = LogWriter::create(&path, 256).unwrap();
    let mut sched = TickScheduler::from_config(&config, writer).unwrap();
    sched.arm_mut().set_position(20.0);
    sched.step(50);
    sched.into_sink().finish().unwrap();

    let mut config = replay_config(&path);
    config.cycle.period_us = 1_000;
    let mut replay = TickScheduler::from_config(&config, RecordLog::default()).unwrap();
    replay.run(&AtomicBool::new(true), None).unwrap();
    assert_eq!(replay.tick(), 50);
    assert_eq!(replay.sink().len(), 100);
}

#[test]
fn ports_opened_before_the_writer_survive_rewriting_the_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.jsonl");
    record_run(&RobotConfig::default(), &path);

    // The recording is loaded in full, so truncating the file afterwards is harmless.
    let config = replay_config(&path);
    let ports = PortSet::from_config(&config).unwrap();
    let writer = LogWriter::create(&path, 1024).unwrap();
    let mut replay = TickScheduler::new(&config, ports, writer).unwrap();
    replay.step(200);

    for port in [replay.drive().port(), replay.arm().port()] {
        assert_eq!(port.as_replay().unwrap().divergences(), 0);
    }
    let summary = replay.into_sink().finish().unwrap();
    assert_eq!(summary.written, 400);
}
