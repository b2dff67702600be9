//! Fixed-period tick scheduler.
//!
//! One tick runs every subsystem once, in a fixed order (drive, then arm),
//! each ending with one log record handed to the sink:
//!
//! ```text
//! tick n:  drive.periodic(stamp) → sink   arm.periodic(stamp) → sink
//! ```
//!
//! `periodic()` is the tick body and is infallible. `run()` paces it on
//! absolute deadlines with `clock_nanosleep(TIMER_ABSTIME)` on
//! `CLOCK_MONOTONIC`. An overrun is counted and warned about, and the next
//! deadline is moved past it rather than bursting to catch up. Logical
//! time (`tick × period`) is unaffected by pacing.

use nix::errno::Errno;
use nix::sys::time::TimeSpec;
use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};
use rover_common::config::{ConfigError, Validate};
use rover_common::control_unit::config::RobotConfig;
use rover_common::hal::driver::HalError;
use rover_common::hal::types::TickStamp;
use rover_hal::{Port, PortSet};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{info, warn};

use crate::recorder::RecordSink;
use crate::subsystem::{ArmSubsystem, DriveSubsystem, Subsystem};

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-tick timing statistics, no allocation.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Ticks executed.
    pub cycle_count: u64,
    /// Last tick duration [ns].
    pub last_cycle_ns: i64,
    pub min_cycle_ns: i64,
    pub max_cycle_ns: i64,
    /// Running sum for the average.
    pub sum_cycle_ns: i64,
    /// Ticks that took longer than the period.
    pub overruns: u64,
    /// Maximum wake-up latency [ns] (actual minus scheduled wake).
    pub max_latency_ns: i64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
        }
    }

    /// Record one tick.
    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns = self.sum_cycle_ns.saturating_add(duration_ns);
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Average tick duration [ns], 0 before the first tick.
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

/// Errors of scheduler construction and the outer run loop.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("hardware port error: {0}")]
    Hal(#[from] HalError),

    #[error("clock error: {0}")]
    Clock(String),

    #[error("log sink error: {0}")]
    LogSink(String),
}

fn clock_error(call: &str) -> impl Fn(Errno) -> CycleError + '_ {
    move |e| CycleError::Clock(format!("{call}: {e}"))
}

// ─── Scheduler ──────────────────────────────────────────────────────

/// Drives both subsystems at a fixed period.
pub struct TickScheduler<S: RecordSink> {
    drive: DriveSubsystem,
    arm: ArmSubsystem,
    sink: S,
    period_us: u64,
    tick: u64,
    stats: CycleStats,
}

impl<S: RecordSink> TickScheduler<S> {
    /// Build the scheduler over already-opened ports.
    ///
    /// # Errors
    /// `CycleError::Config` if the configuration does not validate.
    pub fn new(config: &RobotConfig, ports: PortSet, sink: S) -> Result<Self, CycleError> {
        config.validate()?;
        info!(
            "Tick scheduler: period {} us, drive port {}, arm port {}",
            config.cycle.period_us,
            ports.drive.kind(),
            ports.arm.kind()
        );
        Ok(Self {
            drive: DriveSubsystem::new(ports.drive, config),
            arm: ArmSubsystem::new(ports.arm, config),
            sink,
            period_us: config.cycle.period_us,
            tick: 0,
            stats: CycleStats::new(),
        })
    }

    /// Open the ports the configuration selects, then build.
    ///
    /// # Errors
    /// `CycleError::Config` or `CycleError::Hal`.
    pub fn from_config(config: &RobotConfig, sink: S) -> Result<Self, CycleError> {
        config.validate()?;
        let ports = PortSet::from_config(config)?;
        Self::new(config, ports, sink)
    }

    /// One tick: drive, then arm.
    pub fn periodic(&mut self) {
        let stamp = TickStamp::new(self.tick, self.period_us);
        let drive = self.drive.periodic(stamp);
        self.sink.record(drive);
        let arm = self.arm.periodic(stamp);
        self.sink.record(arm);
        self.tick += 1;
    }

    /// Run `n` ticks back to back, without pacing.
    pub fn step(&mut self, n: u64) {
        for _ in 0..n {
            self.periodic();
        }
    }

    /// Next tick number.
    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    #[inline]
    pub fn period_us(&self) -> u64 {
        self.period_us
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    pub fn drive(&self) -> &DriveSubsystem {
        &self.drive
    }

    pub fn drive_mut(&mut self) -> &mut DriveSubsystem {
        &mut self.drive
    }

    pub fn arm(&self) -> &ArmSubsystem {
        &self.arm
    }

    pub fn arm_mut(&mut self) -> &mut ArmSubsystem {
        &mut self.arm
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Every replay port has served its last record. False when nothing
    /// is replayed.
    pub fn replay_finished(&self) -> bool {
        let ports: [&Port; 2] = [self.drive.port(), self.arm.port()];
        let mut replays = ports.iter().filter_map(|p| p.as_replay()).peekable();
        replays.peek().is_some() && replays.all(|r| r.remaining() == 0)
    }

    /// Paced loop until `running` clears, `max_ticks` more ticks have run,
    /// or a replay runs out.
    ///
    /// # Errors
    /// `CycleError::Clock` if the monotonic clock cannot be read or slept on.
    pub fn run(&mut self, running: &AtomicBool, max_ticks: Option<u64>) -> Result<(), CycleError> {
        let clock = ClockId::CLOCK_MONOTONIC;
        let period_ns = self.period_us as i64 * 1_000;
        let first_tick = self.tick;
        let mut next_wake = clock_gettime(clock).map_err(clock_error("clock_gettime"))?;

        info!("Entering tick loop at tick {first_tick}");
        while running.load(Ordering::SeqCst) {
            if max_ticks.is_some_and(|max| self.tick - first_tick >= max) {
                info!("Tick limit reached");
                break;
            }
            if self.replay_finished() {
                info!("Replay finished");
                break;
            }

            let cycle_start = clock_gettime(clock).map_err(clock_error("clock_gettime"))?;
            let latency_ns = timespec_diff_ns(&cycle_start, &next_wake).max(0);

            self.periodic();

            let cycle_end = clock_gettime(clock).map_err(clock_error("clock_gettime"))?;
            let duration_ns = timespec_diff_ns(&cycle_end, &cycle_start);
            self.stats.record(duration_ns, latency_ns);

            next_wake = timespec_add_ns(next_wake, period_ns);
            if timespec_diff_ns(&cycle_end, &next_wake) > 0 {
                self.stats.overruns += 1;
                let overruns = self.stats.overruns;
                if overruns <= 10 || overruns % 1000 == 0 {
                    warn!(
                        "Tick {} overran its deadline ({} us busy, overrun #{overruns})",
                        self.tick - 1,
                        duration_ns / 1_000
                    );
                }
                next_wake = cycle_end;
                continue;
            }

            match clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake) {
                Ok(_) | Err(Errno::EINTR) => {}
                Err(e) => return Err(CycleError::Clock(format!("clock_nanosleep: {e}"))),
            }
        }

        info!(
            "Tick loop stopped after {} ticks (avg {} us, max {} us, {} overruns)",
            self.tick - first_tick,
            self.stats.avg_cycle_ns() / 1_000,
            self.stats.max_cycle_ns / 1_000,
            self.stats.overruns
        );
        Ok(())
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

fn timespec_add_ns(ts: TimeSpec, ns: i64) -> TimeSpec {
    let total = ts.tv_nsec() as i64 + ns;
    let secs = ts.tv_sec() as i64 + total.div_euclid(1_000_000_000);
    let nanos = total.rem_euclid(1_000_000_000);
    TimeSpec::new(secs as _, nanos as _)
}

/// `a - b` [ns].
fn timespec_diff_ns(a: &TimeSpec, b: &TimeSpec) -> i64 {
    (a.tv_sec() as i64 - b.tv_sec() as i64) * 1_000_000_000
        + (a.tv_nsec() as i64 - b.tv_nsec() as i64)
}

// ─── Tests ──────────────────────────────────────────────────────────
