//! Characterization (system identification) routine.
//!
//! While a run is active it overrides the mechanism's controller and
//! commands an excitation voltage:
//!
//! ```text
//! quasistatic:  V(t) = ±ramp_rate × t
//! dynamic:      V(t) = ±step_volts
//! ```
//!
//! `t` is logical time since the run's first tick. Every tick appends one
//! sample (snapshot, commanded volts, label) to a buffer sized at start for
//! a full-length run. A run ends on `stop()` or at the timeout; either way
//! the samples go back to the caller and the mechanism returns to its own
//! controller.

use rover_common::consts::NOMINAL_BUS_VOLTAGE;
use rover_common::control_unit::config::CharacterizationConfig;
use rover_common::control_unit::record::MechanismId;
use rover_common::control_unit::state::{Direction, SysIdLabel, SysIdMode};
use rover_common::hal::types::InputSnapshot;
use tracing::{info, warn};

/// One tick of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterizationSample {
    pub snapshot: InputSnapshot,
    /// Voltage applied after the travel-limit guard [V].
    pub commanded_volts: f64,
    pub label: SysIdLabel,
}

/// A finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterizationRun {
    pub mechanism: MechanismId,
    pub label: SysIdLabel,
    pub samples: Vec<CharacterizationSample>,
    /// Stopped by the timeout rather than by the caller.
    pub timed_out: bool,
}

impl CharacterizationRun {
    /// Logical duration covered by the samples [µs].
    pub fn duration_us(&self) -> u64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(a), Some(b)) => b.snapshot.timestamp_us() - a.snapshot.timestamp_us(),
            _ => 0,
        }
    }
}

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SysIdStep {
    /// Command this voltage.
    Drive(f64),
    /// The timeout elapsed; the run must be stopped.
    TimedOut,
}

#[derive(Debug)]
struct ActiveRun {
    mode: SysIdMode,
    direction: Direction,
    label: SysIdLabel,
    start_us: Option<u64>,
    samples: Vec<CharacterizationSample>,
}

/// Characterization routine of one mechanism.
#[derive(Debug)]
pub struct Characterization {
    mechanism: MechanismId,
    config: CharacterizationConfig,
    timeout_us: u64,
    capacity: usize,
    active: Option<ActiveRun>,
}

impl Characterization {
    /// `period_s` sizes the sample buffer for a full-length run.
    pub fn new(mechanism: MechanismId, config: &CharacterizationConfig, period_s: f64) -> Self {
        Self {
            mechanism,
            config: config.clone(),
            timeout_us: (config.timeout_s * 1e6).round() as u64,
            capacity: config.max_ticks(period_s),
            active: None,
        }
    }

    pub fn start_quasistatic(&mut self, direction: Direction) -> bool {
        self.start(SysIdMode::Quasistatic, direction)
    }

    pub fn start_dynamic(&mut self, direction: Direction) -> bool {
        self.start(SysIdMode::Dynamic, direction)
    }

    /// Begin a run. A second start while one is active is ignored.
    pub fn start(&mut self, mode: SysIdMode, direction: Direction) -> bool {
        let label = SysIdLabel::running(mode, direction);
        if let Some(run) = &self.active {
            warn!(
                "{} characterization {label} ignored: {} already running",
                self.mechanism, run.label
            );
            return false;
        }
        info!("{} characterization idle -> {label}", self.mechanism);
        self.active = Some(ActiveRun {
            mode,
            direction,
            label,
            start_us: None,
            samples: Vec::with_capacity(self.capacity),
        });
        true
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Current label, `idle` between runs.
    pub fn label(&self) -> SysIdLabel {
        self.active.as_ref().map_or(SysIdLabel::Idle, |r| r.label)
    }

    /// Excitation for this tick. `None` when no run is active.
    pub fn step(&mut self, snapshot: &InputSnapshot) -> Option<SysIdStep> {
        let run = self.active.as_mut()?;
        let start = *run.start_us.get_or_insert(snapshot.timestamp_us());
        let elapsed_us = snapshot.timestamp_us().saturating_sub(start);
        if elapsed_us > self.timeout_us {
            return Some(SysIdStep::TimedOut);
        }
        let elapsed_s = elapsed_us as f64 * 1e-6;
        let magnitude = match run.mode {
            SysIdMode::Quasistatic => self.config.ramp_rate_v_per_s * elapsed_s,
            SysIdMode::Dynamic => self.config.step_volts,
        };
        let volts = run.direction.sign() * magnitude;
        Some(SysIdStep::Drive(
            volts.clamp(-NOMINAL_BUS_VOLTAGE, NOMINAL_BUS_VOLTAGE),
        ))
    }

    /// Append this tick's sample.
    pub fn record(&mut self, snapshot: InputSnapshot, commanded_volts: f64) {
        if let Some(run) = self.active.as_mut() {
            run.samples.push(CharacterizationSample {
                snapshot,
                commanded_volts,
                label: run.label,
            });
        }
    }

    /// End the active run and hand back its samples.
    pub fn stop(&mut self) -> Option<CharacterizationRun> {
        self.finish(false)
    }

    /// End the active run because its timeout elapsed.
    pub fn expire(&mut self) -> Option<CharacterizationRun> {
        self.finish(true)
    }

    fn finish(&mut self, timed_out: bool) -> Option<CharacterizationRun> {
        let run = self.active.take()?;
        info!(
            "{} characterization {} -> idle ({} samples{})",
            self.mechanism,
            run.label,
            run.samples.len(),
            if timed_out { ", timed out" } else { "" }
        );
        Some(CharacterizationRun {
            mechanism: self.mechanism,
            label: run.label,
            samples: run.samples,
            timed_out,
        })
    }
}
