//! Onboard velocity servo model.
//!
//! Mirrors the closed loop a smart motor controller runs on its own
//! microcontroller: gains act on motor-RPM error and produce a duty cycle,
//! the feedforward arrives in volts, and the sum is clamped to the
//! compensated bus voltage. Evaluated once per physics substep.

use rover_common::control_unit::config::PdGains;
use rover_common::hal::driver::clamp_voltage;

/// P + D velocity loop with voltage feedforward.
#[derive(Debug, Clone)]
pub struct VelocityServo {
    kp: f64,
    kd: f64,
    bus_volts: f64,
    prev_error: Option<f64>,
}

impl VelocityServo {
    pub fn new(gains: PdGains, bus_volts: f64) -> Self {
        Self {
            kp: gains.kp,
            kd: gains.kd,
            bus_volts,
            prev_error: None,
        }
    }

    /// Voltage for one servo period.
    pub fn output(&mut self, reference_rpm: f64, measured_rpm: f64, feedforward_volts: f64) -> f64 {
        let error = reference_rpm - measured_rpm;
        let derivative = self.prev_error.map_or(0.0, |prev| error - prev);
        self.prev_error = Some(error);

        let duty = self.kp * error + self.kd * derivative;
        clamp_voltage(duty * self.bus_volts + feedforward_volts, self.bus_volts)
    }

    /// Forget the derivative history (the loop was left for open-loop control).
    pub fn reset(&mut self) {
        self.prev_error = None;
    }
}
