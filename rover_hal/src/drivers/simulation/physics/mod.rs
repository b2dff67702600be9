//! Physics models for the simulated backend.

mod arm;
mod motor;
mod wheel;

pub use arm::ArmSim;
pub use motor::DcMotor;
pub use wheel::DriveSideSim;
