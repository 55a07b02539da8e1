//! # RC Ground Link
//!
//! Ground-station control core for a CRSF radio link.
//!
//! Keeps 16 RC channels fed from a command file and an optional joystick,
//! pushes them to the downlink at a bounded rate and publishes a binary
//! telemetry record for external tools.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use rc_groundlink::channels::ChannelStore;
use rc_groundlink::command::FileCommandSource;
use rc_groundlink::config::Config;
use rc_groundlink::controller::joystick::EvdevJoystick;
use rc_groundlink::controller::InputDevice;
use rc_groundlink::scheduler::{ModeSwitch, Scheduler, SchedulerTiming, StopSignal, SystemClock};
use rc_groundlink::telemetry::{FileTelemetrySink, TelemetrySnapshotter};
use rc_groundlink::transport::{LoopbackTransport, Transport};

/// Flag that skips the external telemetry safety check
const NO_TELEMETRY_FLAG: &str = "--notel";

/// Command-line options
#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    config_path: Option<String>,
    no_telemetry: bool,
    /// Flags and extra arguments that were not understood
    ignored: Vec<String>,
}

impl Args {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Self {
        let mut parsed = Args::default();
        for arg in args {
            if arg == NO_TELEMETRY_FLAG {
                parsed.no_telemetry = true;
            } else if arg.starts_with("--") || parsed.config_path.is_some() {
                parsed.ignored.push(arg);
            } else {
                parsed.config_path = Some(arg);
            }
        }
        parsed
    }
}

/// Main entry point
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging through a non-blocking stdout writer
///    - Load configuration (defaults when no path is given)
///    - Bring up the transport and, if enabled, the joystick
///
/// 2. **Run**
///    - Channel scheduler and telemetry snapshotter each on a blocking thread
///    - Main task waits for Ctrl+C
///
/// 3. **Graceful Shutdown**
///    - Raise the stop signal and join both loops
///
/// # Examples
///
/// ```bash
/// rc-groundlink config/default.toml --notel
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let (writer, _log_guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("RC Ground Link v{} starting...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse(std::env::args().skip(1));
    for arg in &args.ignored {
        warn!("Ignoring unrecognized argument: {}", arg);
    }
    if args.no_telemetry {
        warn!("NO-TELEMETRY mode. Safety checks disabled.");
    }

    let config = match &args.config_path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        None => {
            info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    let store = Arc::new(ChannelStore::new());
    let transport: Arc<dyn Transport> = Arc::new(LoopbackTransport::new());
    info!("Transport initialized (loopback)");

    let mode = ModeSwitch::new(config.scheduler.mode);
    let stop = StopSignal::new();
    let clock = SystemClock::new();

    let commands = FileCommandSource::new(&config.paths.command_file);
    info!("Reading commands from {}", commands.path().display());

    let mut scheduler = Scheduler::new(
        store,
        transport.clone(),
        Box::new(commands),
        SchedulerTiming::from(&config.scheduler),
    );

    if config.input.enabled {
        match EvdevJoystick::open(&config.input.device_path) {
            Ok(joystick) => {
                info!(
                    "Joystick {} ({}) opened: {} axes, {} buttons",
                    joystick.name().unwrap_or("unnamed"),
                    joystick.device_path(),
                    joystick.axis_count(),
                    joystick.button_count()
                );
                scheduler = scheduler.with_input(Box::new(joystick));
            }
            Err(e) => warn!("Joystick unavailable, continuing without it: {}", e),
        }
    }

    let telemetry_task = if config.telemetry.enabled {
        let sink = FileTelemetrySink::new(&config.paths.telemetry_file);
        info!("Publishing telemetry to {}", sink.path().display());

        let mut snapshotter = TelemetrySnapshotter::new(
            Some(transport),
            Box::new(sink),
            config.telemetry.update_period_ms,
        );
        let stop = stop.clone();
        Some(tokio::task::spawn_blocking(move || snapshotter.run(&clock, &stop)))
    } else {
        info!("Telemetry output disabled");
        None
    };

    let scheduler_stop = stop.clone();
    let scheduler_task =
        tokio::task::spawn_blocking(move || scheduler.run(&clock, &mode, &scheduler_stop));

    info!("Press Ctrl+C to exit");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    info!("Received Ctrl+C, shutting down...");
    stop.raise();

    scheduler_task.await.context("Scheduler task failed")?;
    if let Some(task) = telemetry_task {
        task.await.context("Telemetry task failed")?;
    }

    info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Args {
        Args::parse(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_no_arguments() {
        assert_eq!(args(&[]), Args::default());
    }

    #[test]
    fn test_config_path_and_flag() {
        let parsed = args(&["config/default.toml", "--notel"]);
        assert_eq!(parsed.config_path.as_deref(), Some("config/default.toml"));
        assert!(parsed.no_telemetry);
    }

    #[test]
    fn test_flag_before_path() {
        let parsed = args(&["--notel", "groundlink.toml"]);
        assert_eq!(parsed.config_path.as_deref(), Some("groundlink.toml"));
        assert!(parsed.no_telemetry);
    }

    #[test]
    fn test_extra_arguments_ignored() {
        let parsed = args(&["a.toml", "b.toml"]);
        assert_eq!(parsed.config_path.as_deref(), Some("a.toml"));
        assert_eq!(parsed.ignored, vec!["b.toml"]);
        assert!(!parsed.no_telemetry);
    }

    #[test]
    fn test_unknown_flag_is_not_a_config_path() {
        let parsed = args(&["--foo", "groundlink.toml", "--verbose"]);
        assert_eq!(parsed.config_path.as_deref(), Some("groundlink.toml"));
        assert_eq!(parsed.ignored, vec!["--foo", "--verbose"]);
        assert!(!parsed.no_telemetry);
    }
}
