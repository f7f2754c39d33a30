//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and field is optional; missing values fall back to the
//! defaults below, which reproduce the stock behavior (camera address 1,
//! 9600 baud, 137 Hz, edge-triggered sampling).
//!
//! ```toml
//! [serial]
//! port = "/dev/ttyUSB0"
//! baud_rate = 9600
//! timeout_ms = 100
//!
//! [controller]
//! deadzone = 0.1
//! zoom_threshold = -0.99
//! quit_button = 0x133
//!
//! [controller.axes]
//! horizontal = 0
//! vertical = 1
//! zoom_tele = 5
//! zoom_wide = 2
//!
//! [camera]
//! address = 1
//!
//! [control]
//! tick_rate_hz = 137
//! sampling = "edge"
//! stop_on_release = false
//!
//! [logging]
//! dir = ""
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::control::SamplingMode;
use crate::error::{PtzBridgeError, Result};

/// Number of absolute axis codes defined by the kernel (ABS_CNT)
const ABS_CODE_COUNT: u16 = 0x40;

/// Number of key codes defined by the kernel (KEY_CNT)
const KEY_CODE_COUNT: u16 = 0x300;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub serial: SerialConfig,
    pub controller: ControllerConfig,
    pub camera: CameraConfig,
    pub control: ControlConfig,
    pub logging: LoggingConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Upper bound for writing one frame; exceeding it stops the bridge
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Controller configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControllerConfig {
    /// evdev device path; empty means auto-detect
    #[serde(default)]
    pub device_path: String,

    #[serde(default = "default_deadzone")]
    pub deadzone: f32,

    #[serde(default = "default_zoom_threshold")]
    pub zoom_threshold: f32,

    /// evdev key code that ends the session (BTN_NORTH by default)
    #[serde(default = "default_quit_button")]
    pub quit_button: u16,

    #[serde(default)]
    pub axes: AxesConfig,
}

/// evdev absolute axis codes for each input role
#[derive(Debug, Deserialize, Clone)]
pub struct AxesConfig {
    #[serde(default = "default_axis_horizontal")]
    pub horizontal: u16,

    #[serde(default = "default_axis_vertical")]
    pub vertical: u16,

    #[serde(default = "default_axis_zoom_tele")]
    pub zoom_tele: u16,

    #[serde(default = "default_axis_zoom_wide")]
    pub zoom_wide: u16,
}

/// Camera configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CameraConfig {
    #[serde(default = "default_camera_address")]
    pub address: u8,
}

/// Control loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControlConfig {
    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: u32,

    #[serde(default)]
    pub sampling: SamplingMode,

    /// Send one stop frame when motion ends
    #[serde(default)]
    pub stop_on_release: bool,
}

/// Log file configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Directory for daily-rotated log files; empty disables file logging
    #[serde(default)]
    pub dir: String,

    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 9600 }
fn default_timeout_ms() -> u64 { 100 }

fn default_deadzone() -> f32 { crate::controller::motion::DEFAULT_DEADZONE }
fn default_zoom_threshold() -> f32 { crate::controller::motion::DEFAULT_ZOOM_THRESHOLD }
fn default_quit_button() -> u16 { 0x133 } // BTN_NORTH

fn default_axis_horizontal() -> u16 { 0x00 } // ABS_X
fn default_axis_vertical() -> u16 { 0x01 } // ABS_Y
fn default_axis_zoom_tele() -> u16 { 0x05 } // ABS_RZ, right trigger
fn default_axis_zoom_wide() -> u16 { 0x02 } // ABS_Z, left trigger

fn default_camera_address() -> u8 { crate::pelco::protocol::DEFAULT_CAMERA_ADDRESS }

fn default_tick_rate_hz() -> u32 { crate::control::DEFAULT_TICK_RATE_HZ }

fn default_log_file_prefix() -> String { "ptz-bridge.log".to_string() }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            device_path: String::new(),
            deadzone: default_deadzone(),
            zoom_threshold: default_zoom_threshold(),
            quit_button: default_quit_button(),
            axes: AxesConfig::default(),
        }
    }
}

impl Default for AxesConfig {
    fn default() -> Self {
        Self {
            horizontal: default_axis_horizontal(),
            vertical: default_axis_vertical(),
            zoom_tele: default_axis_zoom_tele(),
            zoom_wide: default_axis_zoom_wide(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            address: default_camera_address(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: default_tick_rate_hz(),
            sampling: SamplingMode::default(),
            stop_on_release: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: String::new(),
            file_prefix: default_log_file_prefix(),
        }
    }
}

fn invalid(msg: impl Into<String>) -> PtzBridgeError {
    PtzBridgeError::InvalidConfig(msg.into())
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ptz_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// Called by [`Config::load`]; call it again after applying command line
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the first value out of range
    pub fn validate(&self) -> Result<()> {
        // Serial
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if ![2400, 4800, 9600, 19200, 38400].contains(&self.serial.baud_rate) {
            return Err(invalid("baud_rate must be one of: 2400, 4800, 9600, 19200, 38400"));
        }

        if self.serial.timeout_ms == 0 || self.serial.timeout_ms > 10000 {
            return Err(invalid("timeout_ms must be between 1 and 10000"));
        }

        // Controller
        if !(0.0..=0.5).contains(&self.controller.deadzone) {
            return Err(invalid("deadzone must be between 0.0 and 0.5"));
        }

        if !(-1.0..=1.0).contains(&self.controller.zoom_threshold) {
            return Err(invalid("zoom_threshold must be between -1.0 and 1.0"));
        }

        if self.controller.quit_button >= KEY_CODE_COUNT {
            return Err(invalid(format!(
                "quit_button {:#x} is not a valid key code",
                self.controller.quit_button
            )));
        }

        let axes = &self.controller.axes;
        let codes = [
            ("horizontal", axes.horizontal),
            ("vertical", axes.vertical),
            ("zoom_tele", axes.zoom_tele),
            ("zoom_wide", axes.zoom_wide),
        ];
        for (i, &(name, code)) in codes.iter().enumerate() {
            if code >= ABS_CODE_COUNT {
                return Err(invalid(format!(
                    "axis {} code {:#x} is not a valid absolute axis",
                    name, code
                )));
            }
            if let Some(&(other, _)) = codes[..i].iter().find(|&&(_, c)| c == code) {
                return Err(invalid(format!(
                    "axes {} and {} share code {:#x}",
                    other, name, code
                )));
            }
        }

        // Camera
        if self.camera.address == 0 {
            return Err(invalid("camera address must be between 1 and 255"));
        }

        // Control loop
        if self.control.tick_rate_hz == 0 || self.control.tick_rate_hz > 1000 {
            return Err(invalid("tick_rate_hz must be between 1 and 1000"));
        }

        // Logging
        if !self.logging.dir.is_empty() && self.logging.file_prefix.is_empty() {
            return Err(invalid("logging file_prefix cannot be empty when dir is set"));
        }

        Ok(())
    }
}
