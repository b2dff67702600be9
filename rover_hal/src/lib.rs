//! # Rover HAL Library
//!
//! Hardware ports for the rover control core. Each mechanism owns one
//! port implementing `HardwarePort` from `rover_common::hal::driver`; the
//! backend is chosen once at start-up.
//!
//! # Module Structure
//!
//! - [`drivers`] - Real, simulation and replay backends
//! - [`port`] - Closed `Port` enum and `PortSet` construction
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     rover_hal (single crate)                     │
//! │                                                                  │
//! │   PortSet ──► Port (enum, one per mechanism)                     │
//! │                ├── RealPort      ──► MotorBus / MotorController  │
//! │                ├── SimulatedPort ──► ArmSim / DriveSideSim       │
//! │                └── ReplayPort    ──► Recording (JSON Lines)      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod drivers;
pub mod port;

pub use crate::drivers::real::{MotorBus, MotorController, RealPort};
pub use crate::drivers::replay::{Recording, ReplayPort};
pub use crate::drivers::simulation::SimulatedPort;
pub use crate::port::{Port, PortSet};
