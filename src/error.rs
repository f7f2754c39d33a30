//! # Error Types
//!
//! Custom error types for PTZ Bridge using `thiserror`.

use thiserror::Error;

/// Main error type for PTZ Bridge
#[derive(Debug, Error)]
pub enum PtzBridgeError {
    /// Pelco-D protocol errors (malformed or unsupported frames)
    #[error("Pelco-D protocol error: {0}")]
    PelcoProtocol(String),

    /// Configuration file could not be parsed
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration parsed but a value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// A frame write did not complete within the configured bound
    #[error("Serial write timed out after {0} ms")]
    SerialWriteTimeout(u64),

    /// Controller I/O errors
    #[error("Controller error: {0}")]
    Controller(String),

    /// No usable gamepad was found under /dev/input
    #[error("No gamepad found")]
    ControllerNotFound,

    /// The controller event stream ended
    #[error("Controller disconnected")]
    ControllerDisconnected,

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for PTZ Bridge
pub type Result<T> = std::result::Result<T, PtzBridgeError>;
