//! # Rover Control Unit
//!
//! Fixed-period control of the rover's drivetrain and arm.
//!
//! Every tick each mechanism captures one immutable input snapshot from its
//! hardware port, computes an output from that snapshot alone, dispatches
//! it, and emits one log record. Ports are chosen once at start-up (real,
//! simulated or replay); the control code never knows which one it has.
//!
//! # Module Structure
//!
//! - [`control`] - Arm threshold controller, drivetrain controller, output guard
//! - [`characterization`] - Quasistatic/dynamic excitation runs
//! - [`subsystem`] - Per-mechanism tick: snapshot, decide, dispatch, record
//! - [`cycle`] - Tick scheduler and paced run loop
//! - [`recorder`] - In-memory and JSON Lines record sinks
//! - [`config`] - Configuration loading with command-line overrides

pub mod characterization;
pub mod config;
pub mod control;
pub mod cycle;
pub mod recorder;
pub mod subsystem;
