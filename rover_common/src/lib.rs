//! Rover Common Library
//!
//! Shared data model for every crate of the rover control core: the
//! configuration types and their loader, the `HardwarePort` capability that
//! every backend implements, and the per-tick records (snapshot, output,
//! log record) that flow between the ports and the controllers.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading trait, shared config and errors
//! - [`consts`] - System-wide limits and defaults
//! - [`hal`] - Hardware port capability, readings, unit conversion, port config
//! - [`control_unit`] - Robot configuration, controller states, log records
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use rover_common::prelude::*;
//!
//! let conv = UnitConversion::new(10.0, MechanismUnit::Radians).unwrap();
//! assert!((conv.position_from_rotations(10.0) - std::f64::consts::TAU).abs() < 1e-12);
//! ```

pub mod config;
pub mod consts;
pub mod control_unit;
pub mod hal;
pub mod prelude;
