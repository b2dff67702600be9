//! Per-mechanism controllers.
//!
//! Pure per-tick logic: each controller reads a position or a held setpoint
//! and returns an output. Nothing here touches a port.

pub mod arm;
pub mod drive;
pub mod feedforward;
pub mod limits;

pub use arm::{ArmController, ArmDecision};
pub use drive::{DriveController, arcade_mix};
pub use feedforward::SimpleFeedforward;
pub use limits::TravelLimits;
