//! # Gamepad Module
//!
//! This module handles gamepad detection, connection, and input reading
//! using the Linux evdev interface.
//!
//! ## Controller Detection
//!
//! Any `/dev/input/event*` device qualifies when it reports:
//! - `ABS_X` and `ABS_Y` (an analog stick)
//! - `BTN_SOUTH` or `BTN_TRIGGER` (a gamepad or joystick button block)
//!
//! Devices are scanned in sorted order and the first match wins, which keeps
//! the choice stable when several controllers are plugged in.
//!
//! ## Event Pump
//!
//! [`Gamepad::into_input`] moves the device onto an async event stream read
//! by a spawned task. Events are forwarded through a bounded channel and
//! drained by [`GamepadInput::poll`] once per control tick, so the control
//! loop never blocks on the controller.

use evdev::{AbsoluteAxisType, Device, InputEvent, Key};
use std::path::Path;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info, warn};

use super::mapper::{AxisRange, AxisRole, EventMapper, InputSignals};
use super::motion::AxisState;
use crate::config::ControllerConfig;
use crate::control::InputSource;
use crate::error::{PtzBridgeError, Result};

/// Directory scanned for input devices
const INPUT_DIR: &str = "/dev/input";

/// Events buffered between control ticks
const EVENT_QUEUE_DEPTH: usize = 1024;

/// Gamepad handle
///
/// Represents an open evdev device that looks like a gamepad or joystick.
pub struct Gamepad {
    device: Device,
    device_path: String,
}

impl std::fmt::Debug for Gamepad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gamepad")
            .field("device_path", &self.device_path)
            .field("name", &self.device.name())
            .finish_non_exhaustive()
    }
}

impl Gamepad {
    /// Detect and open the first available gamepad
    ///
    /// # Errors
    ///
    /// - `ControllerNotFound`: No gamepad found on the system
    /// - `Controller`: `/dev/input` missing or unreadable
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ptz_bridge::controller::gamepad::Gamepad;
    ///
    /// let gamepad = Gamepad::open()?;
    /// println!("Connected to gamepad at: {}", gamepad.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open() -> Result<Self> {
        let input_dir = Path::new(INPUT_DIR);

        if !input_dir.exists() {
            return Err(PtzBridgeError::Controller(format!(
                "{} directory not found",
                INPUT_DIR
            )));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| PtzBridgeError::Controller(format!("Failed to read {}: {}", INPUT_DIR, e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| PtzBridgeError::Controller(format!("Failed to read directory entry: {}", e)))?;

        // Sort entries for deterministic device selection when multiple controllers are connected
        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();

            // Only check event* devices
            let is_event_node = path
                .file_name()
                .map_or(false, |name| name.to_string_lossy().starts_with("event"));
            if !is_event_node {
                continue;
            }

            match Device::open(&path) {
                Ok(device) => {
                    debug!(
                        "Found input device: {} ({})",
                        path.display(),
                        device.name().unwrap_or("unnamed")
                    );

                    if is_gamepad(&device) {
                        let device_path = path.to_string_lossy().to_string();
                        info!(
                            "Found gamepad \"{}\" at: {}",
                            device.name().unwrap_or("unnamed"),
                            device_path
                        );

                        return Ok(Self {
                            device,
                            device_path,
                        });
                    }
                }
                Err(e) => {
                    // Permission denied or other errors - skip device
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(PtzBridgeError::ControllerNotFound)
    }

    /// Open a specific evdev device
    ///
    /// The device is used as-is, without the gamepad capability check.
    ///
    /// # Errors
    ///
    /// Returns `Controller` error if the device cannot be opened
    pub fn open_path(path: &str) -> Result<Self> {
        let device = Device::open(path)
            .map_err(|e| PtzBridgeError::Controller(format!("Failed to open {}: {}", path, e)))?;

        if !is_gamepad(&device) {
            warn!("{} does not look like a gamepad, using it anyway", path);
        }
        info!("Opened controller at: {}", path);

        Ok(Self {
            device,
            device_path: path.to_string(),
        })
    }

    /// Get the device path of this controller
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Get controller name from evdev
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    /// Build an [`EventMapper`] seeded with this device's axis ranges and
    /// current positions.
    ///
    /// # Errors
    ///
    /// Returns `Controller` error if the axis state cannot be queried
    pub fn mapper(&self, config: &ControllerConfig) -> Result<EventMapper> {
        let mut mapper = EventMapper::from_config(config);
        let abs_state = self
            .device
            .get_abs_state()
            .map_err(|e| PtzBridgeError::Controller(format!("Failed to read axis state: {}", e)))?;

        let supported = self.device.supported_absolute_axes();
        for role in AxisRole::ALL {
            let axis = mapper.layout().axis(role);
            let reported = supported.map_or(false, |axes| axes.contains(axis));

            match abs_state.get(usize::from(axis.0)) {
                Some(info) if reported => {
                    debug!(
                        "Axis {:?} ({:?}): range {}..={}, value {}",
                        role, axis, info.minimum, info.maximum, info.value
                    );
                    mapper.set_range(role, AxisRange::new(info.minimum, info.maximum));
                    mapper.set_raw(role, info.value);
                }
                _ => warn!("Axis {:?} ({:?}) not reported by {}", role, axis, self.device_path),
            }
        }

        Ok(mapper)
    }

    /// Start pumping events into a [`GamepadInput`]
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `Controller` error if the axis state cannot be read or the
    /// device cannot be switched to async mode
    pub fn into_input(self, config: &ControllerConfig) -> Result<GamepadInput> {
        let mapper = self.mapper(config)?;
        let device_path = self.device_path;

        let mut stream = self.device.into_event_stream().map_err(|e| {
            PtzBridgeError::Controller(format!("Failed to start event stream: {}", e))
        })?;

        let (tx, rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let pump_path = device_path.clone();
        tokio::spawn(async move {
            loop {
                match stream.next_event().await {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Event stream from {} ended: {}", pump_path, e);
                        break;
                    }
                }
            }
        });

        Ok(GamepadInput {
            events: rx,
            mapper,
            device_path,
        })
    }
}

/// Stick and button block check used by auto-detection.
fn is_gamepad(device: &Device) -> bool {
    let has_stick = device.supported_absolute_axes().map_or(false, |axes| {
        axes.contains(AbsoluteAxisType::ABS_X) && axes.contains(AbsoluteAxisType::ABS_Y)
    });
    let has_buttons = device.supported_keys().map_or(false, |keys| {
        keys.contains(Key::BTN_SOUTH) || keys.contains(Key::BTN_TRIGGER)
    });

    has_stick && has_buttons
}

/// Live gamepad feeding the control loop.
pub struct GamepadInput {
    events: mpsc::Receiver<InputEvent>,
    mapper: EventMapper,
    device_path: String,
}

impl std::fmt::Debug for GamepadInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GamepadInput")
            .field("device_path", &self.device_path)
            .field("axes", &self.mapper.axes())
            .finish_non_exhaustive()
    }
}

impl GamepadInput {
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

impl InputSource for GamepadInput {
    /// Drain every queued event without waiting.
    fn poll(&mut self) -> Result<InputSignals> {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.mapper.process_event(&event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    return Err(PtzBridgeError::ControllerDisconnected);
                }
            }
        }

        Ok(self.mapper.take_signals())
    }

    fn axes(&self) -> AxisState {
        self.mapper.axes()
    }
}
