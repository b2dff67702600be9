//! Motor-controller device seam.
//!
//! The real backend talks to physical controllers only through these two
//! traits. A vendor binding implements [`MotorBus`] (opens a controller by
//! CAN id) and [`MotorController`] (one smart motor controller with an
//! onboard encoder and velocity loop).

use rover_common::hal::config::{IdleMode, MotorGroupConfig};
use rover_common::hal::driver::HalError;

/// Settings written to a controller once at start-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorSetup {
    pub can_timeout_ms: u32,
    pub current_limit_amps: f64,
    pub voltage_compensation: f64,
    pub idle_mode: IdleMode,
    pub inverted: bool,
}

impl MotorSetup {
    /// Settings for the leader of `group`.
    pub fn leader(group: &MotorGroupConfig) -> Self {
        Self {
            can_timeout_ms: group.can_timeout_ms,
            current_limit_amps: group.current_limit_amps,
            voltage_compensation: group.voltage_compensation,
            idle_mode: group.idle_mode,
            inverted: group.inverted,
        }
    }

    /// Settings for a follower of `group`. Direction comes from `follow`.
    pub fn follower(group: &MotorGroupConfig) -> Self {
        Self {
            inverted: false,
            ..Self::leader(group)
        }
    }
}

/// One smart motor controller.
///
/// Every call is expected to return promptly (cached status frames,
/// queued control frames). A bus fault is reported as
/// `HalError::CommunicationError`.
pub trait MotorController: Send {
    fn can_id(&self) -> u8;

    /// Apply start-up settings (timeout, limits, idle mode, inversion).
    fn configure(&mut self, setup: &MotorSetup) -> Result<(), HalError>;

    /// Mirror `leader_id`'s output, negated when `inverted`.
    fn follow(&mut self, leader_id: u8, inverted: bool) -> Result<(), HalError>;

    /// Open-loop voltage (compensated).
    fn set_voltage(&mut self, volts: f64) -> Result<(), HalError>;

    /// Onboard velocity loop reference [motor RPM] plus arbitrary feedforward [V].
    fn set_velocity_reference(&mut self, rpm: f64, feedforward_volts: f64) -> Result<(), HalError>;

    /// Onboard velocity loop gains.
    fn set_pd(&mut self, kp: f64, kd: f64) -> Result<(), HalError>;

    fn position_rotations(&self) -> Result<f64, HalError>;

    fn velocity_rpm(&self) -> Result<f64, HalError>;

    /// Duty cycle in `[-1, 1]`.
    fn applied_output(&self) -> Result<f64, HalError>;

    fn bus_voltage(&self) -> Result<f64, HalError>;

    fn output_current(&self) -> Result<f64, HalError>;
}

/// Access to the controllers on one bus.
pub trait MotorBus {
    /// Open the controller with `can_id`.
    ///
    /// # Errors
    /// `HalError::InitFailed` if the device does not answer.
    fn open(&mut self, can_id: u8) -> Result<Box<dyn MotorController>, HalError>;
}
