//! Run-time configuration bundle.
//!
//! `robot.toml` is parsed into [`RobotConfig`], command-line overrides are
//! applied on top, and the result is validated once. Nothing reloads it
//! afterwards.

use rover_common::config::{ConfigError, ConfigLoader, Validate};
use rover_common::control_unit::config::RobotConfig;
use rover_common::hal::driver::PortKind;
use std::path::{Path, PathBuf};
use tracing::info;

// ─── Overrides ──────────────────────────────────────────────────────

/// Values given on the command line, each replacing its config key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    /// `[port].backend`
    pub backend: Option<PortKind>,
    /// `[port].replay_log`
    pub replay_log: Option<PathBuf>,
    /// `[log].path`
    pub record: Option<PathBuf>,
    /// `[arm].initial_setpoint_deg`
    pub arm_setpoint: Option<f64>,
}

impl Overrides {
    pub fn apply(&self, config: &mut RobotConfig) {
        if let Some(backend) = self.backend {
            config.port.backend = backend;
        }
        if let Some(path) = &self.replay_log {
            config.port.replay_log = Some(path.clone());
            // A replay log without an explicit backend means replay.
            if self.backend.is_none() {
                config.port.backend = PortKind::Replay;
            }
        }
        if let Some(path) = &self.record {
            config.log.path = Some(path.clone());
        }
        if let Some(deg) = self.arm_setpoint {
            config.arm.initial_setpoint_deg = deg;
        }
    }
}

// ─── Loaded Config Bundle ───────────────────────────────────────────

/// Validated configuration, ready for the scheduler.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub robot: RobotConfig,
    /// File the configuration came from; `None` for built-in defaults.
    pub source: Option<PathBuf>,
}

/// Load `path` (or the built-in defaults), apply `overrides`, validate.
///
/// # Errors
/// `ConfigError::FileNotFound` if an explicit `path` does not exist,
/// `ParseError` or `ValidationError` otherwise.
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<LoadedConfig, ConfigError> {
    let mut robot = match path {
        Some(path) => RobotConfig::load(path)?,
        None => RobotConfig::default(),
    };
    overrides.apply(&mut robot);
    robot.validate()?;
    Ok(LoadedConfig {
        robot,
        source: path.map(Path::to_path_buf),
    })
}

impl LoadedConfig {
    /// One-line summary for the start-up log.
    pub fn log_summary(&self) {
        let source = self
            .source
            .as_deref()
            .map_or_else(|| "built-in defaults".to_string(), |p| p.display().to_string());
        info!(
            "Config OK ({source}): period {} us, backend {}, arm setpoint {} deg",
            self.robot.cycle.period_us, self.robot.port.backend, self.robot.arm.initial_setpoint_deg
        );
    }
}
