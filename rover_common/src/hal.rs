//! Hardware port capability, readings and unit conversion.
//!
//! The control logic never touches a motor controller directly. It sees a
//! mechanism through the [`driver::HardwarePort`] capability, observes it
//! only through the [`types::InputSnapshot`] captured once per tick, and
//! commands it with a single [`types::OutputCommand`].

pub mod config;
pub mod driver;
pub mod types;
pub mod units;
