//! Real hardware backend.
//!
//! Vendor bindings plug in through [`MotorBus`] and [`MotorController`];
//! [`RealPort`] owns the opened controllers for one mechanism.

mod device;
mod port;

pub use device::{MotorBus, MotorController, MotorSetup};
pub use port::{GroupSpec, RealPort};
