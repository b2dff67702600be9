//! Port backend integration tests.
//!
//! The real backend runs against an in-memory motor bus whose devices can
//! be made to fail; replay runs against a recording written to disk.

use parking_lot::Mutex;
use rover_common::control_unit::config::RobotConfig;
use rover_common::control_unit::record::{LogRecord, MechanismId};
use rover_common::control_unit::state::{ControllerState, DriveMode};
use rover_common::hal::driver::{HalError, HardwarePort, PortKind};
use rover_common::hal::types::{OutputCommand, Setpoint, TickStamp};
use rover_hal::drivers::real::{MotorBus, MotorController, MotorSetup};
use rover_hal::{PortSet, Recording};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

const PERIOD: Duration = Duration::from_millis(20);

// ─── Fake bus ───────────────────────────────────────────────────────

#[derive(Debug, Default, Clone)]
struct Device {
    setup: Option<MotorSetup>,
    following: Option<(u8, bool)>,
    pd: Option<(f64, f64)>,
    volts: f64,
    velocity_ref: Option<(f64, f64)>,
    rotations: f64,
    rpm: f64,
    duty: f64,
    amps: f64,
}

#[derive(Default)]
struct BusState {
    devices: HashMap<u8, Device>,
    fault: bool,
    missing: Vec<u8>,
}

#[derive(Clone, Default)]
struct FakeBus(Arc<Mutex<BusState>>);

impl FakeBus {
    fn device(&self, id: u8) -> Device {
        self.0.lock().devices.get(&id).cloned().unwrap_or_default()
    }

    fn update(&self, id: u8, f: impl FnOnce(&mut Device)) {
        f(self.0.lock().devices.entry(id).or_default());
    }

    fn set_fault(&self, fault: bool) {
        self.0.lock().fault = fault;
    }
}

struct FakeController {
    id: u8,
    bus: FakeBus,
}

impl FakeController {
    fn check(&self) -> Result<(), HalError> {
        if self.bus.0.lock().fault {
            Err(HalError::CommunicationError(format!("device {} timeout", self.id)))
        } else {
            Ok(())
        }
    }

    fn get<T>(&self, f: impl FnOnce(&Device) -> T) -> Result<T, HalError> {
        self.check()?;
        Ok(f(&self.bus.device(self.id)))
    }

    fn put(&mut self, f: impl FnOnce(&mut Device)) -> Result<(), HalError> {
        self.check()?;
        self.bus.update(self.id, f);
        Ok(())
    }
}

impl MotorController for FakeController {
    fn can_id(&self) -> u8 {
        self.id
    }
    fn configure(&mut self, setup: &MotorSetup) -> Result<(), HalError> {
        let setup = *setup;
        self.put(|d| d.setup = Some(setup))
    }
    fn follow(&mut self, leader_id: u8, inverted: bool) -> Result<(), HalError> {
        self.put(|d| d.following = Some((leader_id, inverted)))
    }
    fn set_voltage(&mut self, volts: f64) -> Result<(), HalError> {
        self.put(|d| d.volts = volts)
    }
    fn set_velocity_reference(&mut self, rpm: f64, ff: f64) -> Result<(), HalError> {
        self.put(|d| d.velocity_ref = Some((rpm, ff)))
    }
    fn set_pd(&mut self, kp: f64, kd: f64) -> Result<(), HalError> {
        self.put(|d| d.pd = Some((kp, kd)))
    }
    fn position_rotations(&self) -> Result<f64, HalError> {
        self.get(|d| d.rotations)
    }
    fn velocity_rpm(&self) -> Result<f64, HalError> {
        self.get(|d| d.rpm)
    }
    fn applied_output(&self) -> Result<f64, HalError> {
        self.get(|d| d.duty)
    }
    fn bus_voltage(&self) -> Result<f64, HalError> {
        self.get(|_| 12.5)
    }
    fn output_current(&self) -> Result<f64, HalError> {
        self.get(|d| d.amps)
    }
}

impl MotorBus for FakeBus {
    fn open(&mut self, can_id: u8) -> Result<Box<dyn MotorController>, HalError> {
        if self.0.lock().missing.contains(&can_id) {
            return Err(HalError::InitFailed(format!("device {can_id} not found")));
        }
        self.update(can_id, |_| {});
        Ok(Box::new(FakeController {
            id: can_id,
            bus: self.clone(),
        }))
    }
}

// ─── Real backend ───────────────────────────────────────────────────

#[test]
fn real_followers_follow_their_own_leader() {
    let mut bus = FakeBus::default();
    let _ports = PortSet::real(&mut bus, &RobotConfig::default()).unwrap();

    assert_eq!(bus.device(7).following, Some((8, false)));
    assert_eq!(bus.device(6).following, Some((8, false)));
    assert_eq!(bus.device(2).following, Some((1, false)));
    assert_eq!(bus.device(3).following, Some((1, false)));
    assert!(bus.device(1).setup.unwrap().inverted);
    assert!(bus.device(9).setup.unwrap().inverted);
    assert_eq!(bus.device(9).setup.unwrap().current_limit_amps, 4.0);
    assert_eq!(bus.device(8).pd, Some((2e-4, 0.0)));
    // The arm has no velocity loop.
    assert_eq!(bus.device(9).pd, None);
}

#[test]
fn real_missing_device_fails_init() {
    let mut bus = FakeBus::default();
    bus.0.lock().missing.push(3);
    assert!(matches!(
        PortSet::real(&mut bus, &RobotConfig::default()),
        Err(HalError::InitFailed(_))
    ));
}

#[test]
fn real_readings_use_unit_conversion() {
    let mut bus = FakeBus::default();
    let mut ports = PortSet::real(&mut bus, &RobotConfig::default()).unwrap();
    bus.update(9, |d| {
        d.rotations = 17.25;
        d.rpm = 69.0 * 60.0;
        d.duty = 0.08;
        d.amps = 3.5;
    });

    let snap = ports
        .arm
        .capture_snapshot(TickStamp::new(0, 20_000), Setpoint::default());
    let arm = snap.group(0).unwrap();
    assert!((arm.position - 90.0).abs() < 1e-9);
    assert!((arm.velocity - 360.0).abs() < 1e-9);
    assert!((arm.applied_volts - 1.0).abs() < 1e-9);
    assert_eq!(arm.current_amps.as_slice(), &[3.5]);

    let drive = ports.drive.read();
    assert_eq!(drive[0].current_amps.len(), 3);
}

#[test]
fn real_fault_serves_last_known_and_drops_commands() {
    let mut bus = FakeBus::default();
    let mut ports = PortSet::real(&mut bus, &RobotConfig::default()).unwrap();
    bus.update(9, |d| d.rotations = 17.25);
    let before = ports.arm.read();
    assert!(ports.arm.is_connected());

    bus.set_fault(true);
    bus.update(9, |d| d.rotations = 34.5);
    let during = ports.arm.read();
    assert!(!ports.arm.is_connected());
    assert_eq!(during, before);

    ports.arm.dispatch(&OutputCommand::voltage(&[1.0]));
    bus.set_fault(false);
    assert_eq!(bus.device(9).volts, 0.0);

    let after = ports.arm.read();
    assert!(ports.arm.is_connected());
    assert!((after[0].position - 180.0).abs() < 1e-9);

    ports.arm.dispatch(&OutputCommand::voltage(&[1.0]));
    assert_eq!(bus.device(9).volts, 1.0);
}

#[test]
fn real_velocity_reference_in_motor_rpm() {
    let mut bus = FakeBus::default();
    let mut ports = PortSet::real(&mut bus, &RobotConfig::default()).unwrap();
    // 2π rad/s at the wheel = 60 wheel RPM = 600 motor RPM.
    ports.drive.dispatch(&OutputCommand::velocity(
        &[std::f64::consts::TAU, -std::f64::consts::TAU],
        &[1.0, 20.0],
    ));
    let (rpm, ff) = bus.device(8).velocity_ref.unwrap();
    assert!((rpm - 600.0).abs() < 1e-9);
    assert_eq!(ff, 1.0);
    let (rpm, ff) = bus.device(1).velocity_ref.unwrap();
    assert!((rpm + 600.0).abs() < 1e-9);
    assert_eq!(ff, 12.0);
    // Followers are never commanded directly.
    assert!(bus.device(7).velocity_ref.is_none());
}

// ─── Replay backend ─────────────────────────────────────────────────

#[test]
fn replay_from_disk_serves_recorded_readings() {
    let mut sim = PortSet::simulated(&RobotConfig::default()).unwrap();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let mut recorded = Vec::new();

    for tick in 0..20 {
        let stamp = TickStamp::new(tick, 20_000);
        let setpoint = Setpoint::Arcade {
            forward: 0.5,
            rotate: 0.0,
        };
        sim.drive.tick_internal(PERIOD);
        let snapshot = sim.drive.capture_snapshot(stamp, setpoint);
        let output = OutputCommand::voltage(&[6.0, 6.0]);
        sim.drive.dispatch(&output);
        let record = LogRecord::new(
            MechanismId::Drive,
            snapshot,
            output,
            ControllerState::Drive {
                mode: DriveMode::OpenLoop,
            },
        );
        writeln!(file, "{}", record.to_json_line().unwrap()).unwrap();
        let mut arm = record.clone();
        arm.mechanism = MechanismId::Arm;
        writeln!(file, "{}", arm.to_json_line().unwrap()).unwrap();
        recorded.push(record);
    }
    file.flush().unwrap();

    let mut config = RobotConfig::default();
    config.port.backend = PortKind::Replay;
    config.port.replay_log = Some(file.path().to_path_buf());
    let mut replay = PortSet::from_config(&config).unwrap();
    assert_eq!(replay.drive.kind(), PortKind::Replay);

    for (tick, record) in recorded.iter().enumerate() {
        replay.drive.tick_internal(PERIOD);
        let setpoint = replay.drive.recorded_setpoint().unwrap();
        let snapshot = replay
            .drive
            .capture_snapshot(TickStamp::new(tick as u64, 20_000), setpoint);
        assert_eq!(&snapshot, &record.snapshot);
        replay.drive.dispatch(&record.output);
    }
    let stats = replay.drive.as_replay().unwrap();
    assert_eq!(stats.divergences(), 0);
    assert!(!stats.is_exhausted());

    // A moving drivetrain was recorded, not a constant.
    assert!(recorded[19].groups()[0].position > recorded[1].groups()[0].position);
}

#[test]
fn replay_missing_log_is_an_error() {
    let mut config = RobotConfig::default();
    config.port.backend = PortKind::Replay;
    config.port.replay_log = Some("/nonexistent/run.jsonl".into());
    assert!(matches!(
        PortSet::from_config(&config),
        Err(HalError::RecordingError(_))
    ));
    assert!(Recording::parse("").unwrap().is_empty());
}
