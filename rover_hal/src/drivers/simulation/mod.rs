//! Simulation backend.
//!
//! Physics models of the arm joint and the drivetrain sides, integrated
//! with the logical tick period so a simulated run is exactly reproducible.

mod physics;
mod port;
mod servo;

pub use physics::{ArmSim, DcMotor, DriveSideSim};
pub use port::{SUBSTEP, SimulatedPort};
pub use servo::VelocityServo;
