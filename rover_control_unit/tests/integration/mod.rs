pub mod characterization;
pub mod convergence;
pub mod drive;
pub mod properties;
pub mod replay_determinism;

use rover_common::control_unit::config::RobotConfig;
use rover_control_unit::cycle::TickScheduler;
use rover_control_unit::recorder::RecordLog;

/// Simulated scheduler with in-memory records.
pub fn sim_scheduler(config: &RobotConfig) -> TickScheduler<RecordLog> {
    TickScheduler::from_config(config, RecordLog::default()).unwrap()
}
