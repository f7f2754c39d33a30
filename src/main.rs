//! # PTZ Bridge
//!
//! Drive a Pelco-D pan-tilt-zoom camera with a gamepad.
//!
//! The left stick pans and tilts, the triggers zoom (right tele, left wide),
//! and the north face button quits.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ptz_bridge::config::{Config, LoggingConfig};
use ptz_bridge::control::{ControlLoop, SamplingMode};
use ptz_bridge::controller::gamepad::Gamepad;
use ptz_bridge::serial::CameraSerial;

/// Log level used when `RUST_LOG` is unset
const DEFAULT_LOG_DIRECTIVE: &str = "info";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Serial device connected to the camera (overrides the config file)
    device: Option<String>,

    /// TOML configuration file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// evdev device of the gamepad, e.g. /dev/input/event3
    #[arg(long)]
    controller: Option<String>,

    /// Resolve the axes on every tick instead of only after input events
    #[arg(long)]
    level_triggered: bool,
}

/// Load the configuration file (or defaults) and apply command line overrides
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(device) = &args.device {
        config.serial.port = device.clone();
    }
    if let Some(controller) = &args.controller {
        config.controller.device_path = controller.clone();
    }
    if args.level_triggered {
        config.control.sampling = SamplingMode::Level;
    }

    config.validate()?;
    Ok(config)
}

/// Install the console subscriber and, when configured, a daily-rotated log file
///
/// The returned guard flushes the file writer on drop and must outlive the
/// program's logging.
fn init_logging(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(directives.as_deref());

    let (file_layer, guard) = if logging.dir.is_empty() {
        (None, None)
    } else {
        let appender = tracing_appender::rolling::daily(&logging.dir, &logging.file_prefix);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

/// `RUST_LOG` directives when set and valid, `info` otherwise
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVE))
}

/// Resolves on Ctrl+C
///
/// If the signal handler cannot be installed the bridge keeps running until
/// the quit button is pressed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Main entry point for PTZ Bridge
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Parse arguments, load and validate configuration
///    - Set up logging
///    - Open the gamepad and the camera serial port
///
/// 2. **Main Loop**
///    - Poll the gamepad and send Pelco-D frames at the configured rate
///    - Stop on the quit button, Ctrl+C, or a serial failure
///
/// # Examples
///
/// ```bash
/// ptz-bridge /dev/ttyUSB0
/// ptz-bridge --config ptz-bridge.toml --level-triggered
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    let _log_guard = init_logging(&config.logging);

    info!("PTZ Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let gamepad = if config.controller.device_path.is_empty() {
        Gamepad::open()?
    } else {
        Gamepad::open_path(&config.controller.device_path)?
    };
    info!(
        "Using controller {} ({})",
        gamepad.name().unwrap_or("unnamed"),
        gamepad.device_path()
    );
    let mut input = gamepad.into_input(&config.controller)?;

    let mut serial = CameraSerial::open(
        &config.serial.port,
        config.serial.baud_rate,
        Duration::from_millis(config.serial.timeout_ms),
    )?;

    info!("Press Ctrl+C or the quit button to exit");

    let mut control = ControlLoop::from_config(&config);
    let summary = control
        .run(&mut input, &mut serial, shutdown_signal())
        .await?;

    info!(
        "Total: {} ticks, {} samples, {} frames sent, {} overruns",
        summary.ticks, summary.samples, summary.frames_sent, summary.overruns
    );

    Ok(())
}
