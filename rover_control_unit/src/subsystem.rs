//! Mechanism subsystems.
//!
//! A subsystem owns one port, its controller and its characterization
//! routine. One `periodic()` call is one tick of that mechanism:
//!
//! ```text
//! tick_internal → recorded setpoint (replay) → capture snapshot
//!   → controller or characterization → output guard → dispatch → LogRecord
//! ```
//!
//! The snapshot is captured exactly once per tick and every decision of
//! the tick reads that same snapshot.

pub mod arm;
pub mod drive;

pub use arm::ArmSubsystem;
pub use drive::DriveSubsystem;

use rover_common::control_unit::record::{LogRecord, MechanismId};
use rover_common::hal::types::TickStamp;
use rover_hal::Port;
use tracing::warn;

use crate::characterization::CharacterizationRun;

/// One mechanism run by the scheduler.
pub trait Subsystem {
    fn mechanism(&self) -> MechanismId;

    /// Run one tick. Never blocks, never fails.
    fn periodic(&mut self, stamp: TickStamp) -> LogRecord;

    fn port(&self) -> &Port;
}

/// Park a run that ended on its own timeout until the caller collects it.
/// Only the newest uncollected run is kept.
fn park_completed(slot: &mut Option<CharacterizationRun>, run: Option<CharacterizationRun>) {
    let Some(run) = run else { return };
    if let Some(old) = slot.replace(run) {
        warn!(
            "{} characterization {} was never collected; {} samples discarded",
            old.mechanism,
            old.label,
            old.samples.len()
        );
    }
}
