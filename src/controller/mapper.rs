//! # Controller Input Mapper Module
//!
//! This module handles parsing raw evdev events from the gamepad and
//! converting them into a normalized [`AxisState`] plus the edge-triggered
//! [`InputSignals`] the control loop consumes.
//!
//! ## Default Axis Layout (EV_ABS)
//!
//! | Role | evdev Code | Rest | Description |
//! |------|------------|------|-------------|
//! | Horizontal | ABS_X | center | Pan, negative is left |
//! | Vertical | ABS_Y | center | Tilt, negative is up |
//! | Zoom tele | ABS_RZ | minimum | Right trigger, zoom in |
//! | Zoom wide | ABS_Z | minimum | Left trigger, zoom out |
//!
//! Raw values are scaled to -1.0..=1.0 from each axis's kernel-reported
//! range, so a released trigger reads -1.0.
//!
//! ## Signals
//!
//! Any absolute axis event raises `axis_event`, whether or not the axis is
//! mapped, except d-pad hats (ABS_HAT0X..=ABS_HAT3Y) that are not assigned a
//! role. Pressing the quit button (BTN_NORTH by default) raises `quit`.
//! Both stay raised until [`EventMapper::take_signals`] is called.
//!
//! ## Usage
//!
//! ```
//! use evdev::{AbsoluteAxisType, EventType, InputEvent};
//! use ptz_bridge::controller::mapper::EventMapper;
//!
//! let mut mapper = EventMapper::default();
//! mapper.process_event(&InputEvent::new(EventType::ABSOLUTE, AbsoluteAxisType::ABS_X.0, 0));
//!
//! assert!(mapper.take_signals().axis_event);
//! assert!(mapper.axes().horizontal <= -0.99);
//! ```

use evdev::{AbsoluteAxisType, InputEvent, InputEventKind, Key};

use super::motion::AxisState;
use crate::config::ControllerConfig;

/// Raw range assumed until the device reports one (8-bit gamepads).
pub const DEFAULT_AXIS_MIN: i32 = 0;
/// Raw range assumed until the device reports one (8-bit gamepads).
pub const DEFAULT_AXIS_MAX: i32 = 255;

/// D-pad hat axes, ABS_HAT0X through ABS_HAT3Y.
const HAT_AXES: std::ops::RangeInclusive<u16> = 0x10..=0x17;

/// Key event value for a press (0 is release, 2 is autorepeat).
const KEY_PRESSED: i32 = 1;

/// Input events seen since the last tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputSignals {
    /// At least one absolute axis reported a new value.
    pub axis_event: bool,
    /// The quit button was pressed.
    pub quit: bool,
}

/// The four analog inputs the resolver reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisRole {
    Horizontal,
    Vertical,
    ZoomTele,
    ZoomWide,
}

impl AxisRole {
    pub const ALL: [AxisRole; 4] = [
        AxisRole::Horizontal,
        AxisRole::Vertical,
        AxisRole::ZoomTele,
        AxisRole::ZoomWide,
    ];

    fn index(self) -> usize {
        match self {
            AxisRole::Horizontal => 0,
            AxisRole::Vertical => 1,
            AxisRole::ZoomTele => 2,
            AxisRole::ZoomWide => 3,
        }
    }
}

/// Which evdev axis feeds each role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisLayout {
    pub horizontal: AbsoluteAxisType,
    pub vertical: AbsoluteAxisType,
    pub zoom_tele: AbsoluteAxisType,
    pub zoom_wide: AbsoluteAxisType,
}

impl Default for AxisLayout {
    fn default() -> Self {
        Self {
            horizontal: AbsoluteAxisType::ABS_X,
            vertical: AbsoluteAxisType::ABS_Y,
            zoom_tele: AbsoluteAxisType::ABS_RZ,
            zoom_wide: AbsoluteAxisType::ABS_Z,
        }
    }
}

impl AxisLayout {
    /// Build a layout from configured axis codes.
    #[must_use]
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self {
            horizontal: AbsoluteAxisType(config.axes.horizontal),
            vertical: AbsoluteAxisType(config.axes.vertical),
            zoom_tele: AbsoluteAxisType(config.axes.zoom_tele),
            zoom_wide: AbsoluteAxisType(config.axes.zoom_wide),
        }
    }

    /// The evdev axis assigned to `role`.
    pub fn axis(&self, role: AxisRole) -> AbsoluteAxisType {
        match role {
            AxisRole::Horizontal => self.horizontal,
            AxisRole::Vertical => self.vertical,
            AxisRole::ZoomTele => self.zoom_tele,
            AxisRole::ZoomWide => self.zoom_wide,
        }
    }

    /// The role `axis` plays, if any.
    pub fn role_of(&self, axis: AbsoluteAxisType) -> Option<AxisRole> {
        AxisRole::ALL.into_iter().find(|&role| self.axis(role) == axis)
    }
}

/// Raw value range of one axis as reported by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    pub minimum: i32,
    pub maximum: i32,
}

impl Default for AxisRange {
    fn default() -> Self {
        Self {
            minimum: DEFAULT_AXIS_MIN,
            maximum: DEFAULT_AXIS_MAX,
        }
    }
}

impl AxisRange {
    #[must_use]
    pub fn new(minimum: i32, maximum: i32) -> Self {
        Self { minimum, maximum }
    }

    /// Scale a raw value to -1.0..=1.0.
    ///
    /// A degenerate range (maximum not above minimum) always reads 0.0.
    ///
    /// # Examples
    ///
    /// ```
    /// use ptz_bridge::controller::mapper::AxisRange;
    ///
    /// let range = AxisRange::new(0, 1023);
    /// assert_eq!(range.normalize(0), -1.0);
    /// assert_eq!(range.normalize(1023), 1.0);
    /// ```
    #[must_use]
    pub fn normalize(&self, raw: i32) -> f32 {
        if self.maximum <= self.minimum {
            return 0.0;
        }

        let span = (i64::from(self.maximum) - i64::from(self.minimum)) as f32;
        let offset = (i64::from(raw) - i64::from(self.minimum)) as f32;
        (2.0 * offset / span - 1.0).clamp(-1.0, 1.0)
    }
}

/// Parses raw evdev events and maintains the normalized axis state.
///
/// # Thread Safety
///
/// `EventMapper` is not thread-safe. Use from a single task/thread only.
#[derive(Debug)]
pub struct EventMapper {
    layout: AxisLayout,
    ranges: [AxisRange; 4],
    quit_button: Key,
    axes: AxisState,
    pending: InputSignals,
}

impl Default for EventMapper {
    fn default() -> Self {
        Self::new(AxisLayout::default(), Key::BTN_NORTH)
    }
}

impl EventMapper {
    /// Creates a mapper with sticks centered and triggers released.
    #[must_use]
    pub fn new(layout: AxisLayout, quit_button: Key) -> Self {
        Self {
            layout,
            ranges: [AxisRange::default(); 4],
            quit_button,
            axes: AxisState::REST,
            pending: InputSignals::default(),
        }
    }

    /// Creates a mapper from the `[controller]` configuration section.
    #[must_use]
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(AxisLayout::from_config(config), Key::new(config.quit_button))
    }

    pub fn layout(&self) -> &AxisLayout {
        &self.layout
    }

    /// Sets the raw range used to normalize `role`.
    pub fn set_range(&mut self, role: AxisRole, range: AxisRange) {
        self.ranges[role.index()] = range;
    }

    /// Seeds `role` with a raw reading without raising `axis_event`.
    ///
    /// Used to pick up the device's current position when it is opened.
    pub fn set_raw(&mut self, role: AxisRole, raw: i32) {
        let value = self.ranges[role.index()].normalize(raw);
        self.store(role, value);
    }

    /// Latest normalized readings.
    pub fn axes(&self) -> AxisState {
        self.axes
    }

    /// Returns the signals raised since the previous call and clears them.
    pub fn take_signals(&mut self) -> InputSignals {
        std::mem::take(&mut self.pending)
    }

    /// Processes a single evdev input event and updates internal state.
    pub fn process_event(&mut self, event: &InputEvent) {
        match event.kind() {
            InputEventKind::AbsAxis(axis) => match self.layout.role_of(axis) {
                Some(role) => {
                    self.pending.axis_event = true;
                    self.set_raw(role, event.value());
                }
                None if HAT_AXES.contains(&axis.0) => {}
                None => self.pending.axis_event = true,
            },
            InputEventKind::Key(key) => {
                if key == self.quit_button && event.value() == KEY_PRESSED {
                    self.pending.quit = true;
                }
            }
            _ => {
                // Ignore sync events and other event types
            }
        }
    }

    fn store(&mut self, role: AxisRole, value: f32) {
        match role {
            AxisRole::Horizontal => self.axes.horizontal = value,
            AxisRole::Vertical => self.axes.vertical = value,
            AxisRole::ZoomTele => self.axes.zoom_tele = value,
            AxisRole::ZoomWide => self.axes.zoom_wide = value,
        }
    }
}
