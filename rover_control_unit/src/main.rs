//! # Rover Control Unit
//!
//! Fixed-period actuator control for the rover: drivetrain and arm ticked
//! at the configured period against the real, simulated or replay backend.
//!
//! ```text
//! rover_control_unit --config robot.toml --record run.jsonl --ticks 500
//! rover_control_unit --replay-log run.jsonl
//! ```

use clap::Parser;
use rover_common::consts::DEFAULT_CONFIG_PATH;
use rover_common::control_unit::record::MechanismId;
use rover_common::hal::driver::PortKind;
use rover_control_unit::config::{LoadedConfig, Overrides, load_config};
use rover_control_unit::cycle::{CycleError, TickScheduler};
use rover_control_unit::recorder::{LogWriter, RecordLog, RecordSink};
use rover_control_unit::subsystem::Subsystem;
use rover_hal::PortSet;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Records kept in memory when no log file is requested.
const IN_MEMORY_RECORDS: usize = 4096;

/// Rover Control Unit: fixed-period drivetrain and arm control
#[derive(Parser, Debug)]
#[command(name = "rover_control_unit")]
#[command(version)]
#[command(about = "Fixed-period actuator control core for the rover")]
struct Args {
    /// Robot configuration TOML (default: config/robot.toml if present,
    /// otherwise built-in defaults).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Port backend: real, simulation or replay.
    #[arg(long, value_name = "KIND")]
    backend: Option<PortKind>,

    /// JSON Lines recording to replay (implies --backend replay).
    #[arg(long, value_name = "FILE")]
    replay_log: Option<PathBuf>,

    /// Write per-tick records to this JSON Lines file.
    #[arg(long, value_name = "FILE")]
    record: Option<PathBuf>,

    /// Stop after this many ticks (default: until Ctrl-C).
    #[arg(long, value_name = "N")]
    ticks: Option<u64>,

    /// Initial arm setpoint [deg].
    #[arg(long, value_name = "DEG", allow_negative_numbers = true)]
    arm_setpoint: Option<f64>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let overrides = Overrides {
        backend: args.backend,
        replay_log: args.replay_log.clone(),
        record: args.record.clone(),
        arm_setpoint: args.arm_setpoint,
    };
    let config_path = args.config.clone().or_else(|| {
        let default = Path::new(DEFAULT_CONFIG_PATH);
        default.exists().then(|| default.to_path_buf())
    });
    let loaded = load_config(config_path.as_deref(), &overrides);
    let level = loaded
        .as_ref()
        .map_or("info", |l| l.robot.shared.log_level.as_directive());
    setup_tracing(&args, level);

    info!("Rover Control Unit v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = loaded
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
        .and_then(|loaded| run(&args, loaded));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Rover Control Unit shutdown complete");
}

fn run(args: &Args, loaded: LoadedConfig) -> Result<(), Box<dyn std::error::Error>> {
    let config = &loaded.robot;
    let _span = tracing::info_span!("service", name = %config.shared.service_name).entered();
    loaded.log_summary();

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    // A replay log is read in full here, before any record file is opened.
    let ports = PortSet::from_config(config)?;

    match &config.log.path {
        Some(path) => {
            let writer = LogWriter::create(path, config.log.channel_capacity)?;
            let mut scheduler = TickScheduler::new(config, ports, writer)?;
            execute(&mut scheduler, &running, args.ticks)?;
            let summary = scheduler.into_sink().finish()?;
            info!(
                "Recorded {} records to {} ({} dropped)",
                summary.written,
                path.display(),
                summary.dropped
            );
        }
        None => {
            let log = RecordLog::with_limit(IN_MEMORY_RECORDS);
            let mut scheduler = TickScheduler::new(config, ports, log)?;
            execute(&mut scheduler, &running, args.ticks)?;
            info!("{} most recent records kept in memory", scheduler.sink().len());
        }
    }
    Ok(())
}

fn execute<S: RecordSink>(
    scheduler: &mut TickScheduler<S>,
    running: &AtomicBool,
    ticks: Option<u64>,
) -> Result<(), CycleError> {
    scheduler.run(running, ticks)?;

    for (mechanism, port) in [
        (MechanismId::Drive, scheduler.drive().port()),
        (MechanismId::Arm, scheduler.arm().port()),
    ] {
        if let Some(replay) = port.as_replay() {
            if replay.divergences() > 0 {
                warn!("Replay of {mechanism}: {} divergent outputs", replay.divergences());
            } else {
                info!("Replay of {mechanism}: outputs match the recording");
            }
        }
    }
    Ok(())
}

fn setup_tracing(args: &Args, config_level: &str) {
    let filter = if args.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_level))
    };

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
