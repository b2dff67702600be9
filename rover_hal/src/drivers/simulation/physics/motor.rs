//! DC motor model.
//!
//! Linear brushed-equivalent model built from datasheet constants:
//! `I = (V - ω/kV) / R`, `τ = kT · I`. Ganged motors (a leader plus its
//! followers on one gearbox) scale stall torque and currents by `count`.

use rover_common::hal::config::{DcMotorConfig, IdleMode};
use std::f64::consts::TAU;

/// One or more identical motors driving a common shaft.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DcMotor {
    /// Winding resistance of the gang [Ω].
    resistance: f64,
    /// Torque per amp [N·m/A].
    kt: f64,
    /// Speed per volt [rad/s/V].
    kv: f64,
    count: usize,
}

impl DcMotor {
    /// Build `count` ganged motors from datasheet constants.
    pub fn new(config: &DcMotorConfig, count: usize) -> Self {
        let count = count.max(1);
        let n = count as f64;
        let stall_current = config.stall_current_amps * n;
        let free_current = config.free_current_amps * n;
        let resistance = config.nominal_volts / stall_current;
        let free_speed = config.free_speed_rpm * TAU / 60.0;
        Self {
            resistance,
            kt: config.stall_torque_nm * n / stall_current,
            kv: free_speed / (config.nominal_volts - resistance * free_current),
            count,
        }
    }

    /// Number of ganged motors.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Total current drawn at motor speed `omega` [rad/s] and applied `volts`.
    ///
    /// At zero volts, brake mode shorts the windings (back-EMF current
    /// opposes motion) while coast mode draws nothing.
    pub fn current(&self, omega: f64, volts: f64, idle: IdleMode) -> f64 {
        if volts == 0.0 && idle == IdleMode::Coast {
            return 0.0;
        }
        (volts - omega / self.kv) / self.resistance
    }

    /// [`current`](Self::current) clamped to a per-motor smart current limit.
    pub fn limited_current(&self, omega: f64, volts: f64, idle: IdleMode, limit_per_motor: f64) -> f64 {
        let limit = limit_per_motor * self.count as f64;
        self.current(omega, volts, idle).clamp(-limit, limit)
    }

    /// Shaft torque produced by a total current [N·m].
    #[inline]
    pub fn torque(&self, current: f64) -> f64 {
        self.kt * current
    }

    /// Unloaded steady-state speed at `volts` [rad/s].
    #[inline]
    pub fn free_speed_at(&self, volts: f64) -> f64 {
        volts * self.kv
    }
}
