//! # Pelco-D Protocol Constants and Types
//!
//! Core definitions for the movement subset of Pelco-D.
//!
//! ```text
//! ┌──────┬──────┬──────┬──────┬───────┬───────┬──────────┐
//! │ 0xFF │ addr │ cmd1 │ cmd2 │ data1 │ data2 │ checksum │
//! └──────┴──────┴──────┴──────┴───────┴───────┴──────────┘
//! ```

use std::fmt;

use super::checksum::pelco_checksum;

/// Pelco-D frame sync byte (always 0xFF)
pub const PELCO_SYNC_BYTE: u8 = 0xFF;

/// Every Pelco-D frame is exactly 7 bytes
pub const PELCO_FRAME_LEN: usize = 7;

/// Highest pan/tilt speed code understood by the device
pub const PELCO_MAX_SPEED: u8 = 0x39;

/// Camera address used when none is configured
pub const DEFAULT_CAMERA_ADDRESS: u8 = 0x01;

/// cmd2 flag: pan right
pub const CMD2_PAN_RIGHT: u8 = 1 << 1;
/// cmd2 flag: pan left
pub const CMD2_PAN_LEFT: u8 = 1 << 2;
/// cmd2 flag: tilt up
pub const CMD2_TILT_UP: u8 = 1 << 3;
/// cmd2 flag: tilt down
pub const CMD2_TILT_DOWN: u8 = 1 << 4;
/// cmd2 flag: zoom tele (in)
pub const CMD2_ZOOM_TELE: u8 = 1 << 5;
/// cmd2 flag: zoom wide (out)
pub const CMD2_ZOOM_WIDE: u8 = 1 << 6;

/// All cmd2 bits that belong to the movement subset
pub const CMD2_MOVEMENT_MASK: u8 = CMD2_PAN_RIGHT
    | CMD2_PAN_LEFT
    | CMD2_TILT_UP
    | CMD2_TILT_DOWN
    | CMD2_ZOOM_TELE
    | CMD2_ZOOM_WIDE;

/// Horizontal motion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pan {
    #[default]
    Stop,
    Left,
    Right,
}

/// Vertical motion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tilt {
    #[default]
    Stop,
    Up,
    Down,
}

/// Lens zoom motion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zoom {
    #[default]
    Stop,
    Tele,
    Wide,
}

/// One tick's worth of camera motion.
///
/// Each axis is an enum, so opposite directions can never be requested at
/// once. Speeds are kept at zero for an axis that is not moving and never
/// exceed [`PELCO_MAX_SPEED`].
///
/// # Examples
///
/// ```
/// use ptz_bridge::pelco::protocol::{MotionDecision, Pan, Tilt, Zoom};
///
/// let decision = MotionDecision::new(Pan::Left, 28, Tilt::Stop, 12, Zoom::Stop);
/// assert!(decision.left());
/// assert_eq!(decision.pan_speed(), 28);
/// assert_eq!(decision.tilt_speed(), 0); // no tilt, no tilt speed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotionDecision {
    pan: Pan,
    tilt: Tilt,
    zoom: Zoom,
    pan_speed: u8,
    tilt_speed: u8,
}

impl MotionDecision {
    /// The decision that moves nothing.
    pub const IDLE: MotionDecision = MotionDecision {
        pan: Pan::Stop,
        tilt: Tilt::Stop,
        zoom: Zoom::Stop,
        pan_speed: 0,
        tilt_speed: 0,
    };

    /// Builds a decision, zeroing the speed of a stopped axis and capping
    /// the others at [`PELCO_MAX_SPEED`].
    #[must_use]
    pub fn new(pan: Pan, pan_speed: u8, tilt: Tilt, tilt_speed: u8, zoom: Zoom) -> Self {
        let pan_speed = match pan {
            Pan::Stop => 0,
            _ => pan_speed.min(PELCO_MAX_SPEED),
        };
        let tilt_speed = match tilt {
            Tilt::Stop => 0,
            _ => tilt_speed.min(PELCO_MAX_SPEED),
        };

        Self {
            pan,
            tilt,
            zoom,
            pan_speed,
            tilt_speed,
        }
    }

    pub fn pan(&self) -> Pan {
        self.pan
    }

    pub fn tilt(&self) -> Tilt {
        self.tilt
    }

    pub fn zoom(&self) -> Zoom {
        self.zoom
    }

    pub fn pan_speed(&self) -> u8 {
        self.pan_speed
    }

    pub fn tilt_speed(&self) -> u8 {
        self.tilt_speed
    }

    pub fn left(&self) -> bool {
        self.pan == Pan::Left
    }

    pub fn right(&self) -> bool {
        self.pan == Pan::Right
    }

    pub fn up(&self) -> bool {
        self.tilt == Tilt::Up
    }

    pub fn down(&self) -> bool {
        self.tilt == Tilt::Down
    }

    pub fn tele(&self) -> bool {
        self.zoom == Zoom::Tele
    }

    pub fn wide(&self) -> bool {
        self.zoom == Zoom::Wide
    }

    /// True when any axis is moving, i.e. a frame should be sent.
    #[must_use]
    pub fn should_issue(&self) -> bool {
        self.pan != Pan::Stop || self.tilt != Tilt::Stop || self.zoom != Zoom::Stop
    }
}

/// A complete 7-byte Pelco-D frame, checksum included.
///
/// Frames are only built through [`PelcoDFrame::new`] (or the encoder), so the
/// sync byte and checksum are always consistent with the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PelcoDFrame([u8; PELCO_FRAME_LEN]);

impl PelcoDFrame {
    /// Assemble a frame and compute its checksum.
    ///
    /// # Examples
    ///
    /// ```
    /// use ptz_bridge::pelco::protocol::PelcoDFrame;
    ///
    /// let frame = PelcoDFrame::new(0x01, 0x00, 0x04, 0x1C, 0x00);
    /// assert_eq!(frame.as_bytes(), &[0xFF, 0x01, 0x00, 0x04, 0x1C, 0x00, 0x21]);
    /// ```
    #[must_use]
    pub fn new(address: u8, cmd1: u8, cmd2: u8, data1: u8, data2: u8) -> Self {
        let body = [address, cmd1, cmd2, data1, data2];
        let checksum = pelco_checksum(&body);

        Self([PELCO_SYNC_BYTE, address, cmd1, cmd2, data1, data2, checksum])
    }

    pub fn address(&self) -> u8 {
        self.0[1]
    }

    pub fn cmd1(&self) -> u8 {
        self.0[2]
    }

    pub fn cmd2(&self) -> u8 {
        self.0[3]
    }

    pub fn data1(&self) -> u8 {
        self.0[4]
    }

    pub fn data2(&self) -> u8 {
        self.0[5]
    }

    pub fn checksum(&self) -> u8 {
        self.0[6]
    }

    /// Raw bytes in wire order
    pub fn as_bytes(&self) -> &[u8; PELCO_FRAME_LEN] {
        &self.0
    }
}

impl AsRef<[u8]> for PelcoDFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Lowercase hex, space separated: `ff 01 00 04 1c 00 21`
impl fmt::Display for PelcoDFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}
