//! Hardware port backends.
//!
//! - [`real`] - Physical motor controllers behind a device seam
//! - [`simulation`] - Physics models integrated with the logical period
//! - [`replay`] - Readings served from a recorded run
//!
//! All three implement `HardwarePort` from `rover_common::hal::driver` and
//! are gathered in the closed [`Port`](crate::port::Port) enum.

pub mod real;
pub mod replay;
pub mod simulation;
