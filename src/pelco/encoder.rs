//! # Pelco-D Frame Encoder
//!
//! Encodes a [`MotionDecision`] into a movement frame.

use super::protocol::*;

/// Encode a motion decision into a complete Pelco-D frame
///
/// Pure and total: the same decision always yields the same bytes.
///
/// # Arguments
///
/// * `address` - Camera address (1-255)
/// * `decision` - Pan/tilt/zoom directions and speeds
///
/// # Returns
///
/// * `PelcoDFrame` - 7 bytes: sync, address, cmd1, cmd2, data1, data2, checksum
///
/// # Examples
///
/// ```
/// use ptz_bridge::pelco::encoder::encode_movement;
/// use ptz_bridge::pelco::protocol::{MotionDecision, Pan, Tilt, Zoom};
///
/// let decision = MotionDecision::new(Pan::Left, 0x1C, Tilt::Stop, 0, Zoom::Stop);
/// let frame = encode_movement(0x01, &decision);
/// assert_eq!(frame.as_bytes(), &[0xFF, 0x01, 0x00, 0x04, 0x1C, 0x00, 0x21]);
/// ```
pub fn encode_movement(address: u8, decision: &MotionDecision) -> PelcoDFrame {
    PelcoDFrame::new(
        address,
        0x00, // no command extension in the movement subset
        encode_cmd2(decision),
        decision.pan_speed(),
        decision.tilt_speed(),
    )
}

/// Encode the frame that halts all motion (`cmd2 = 0`, speeds 0)
pub fn encode_stop(address: u8) -> PelcoDFrame {
    encode_movement(address, &MotionDecision::IDLE)
}

/// Build the cmd2 flag byte for a decision
///
/// Tele is checked before wide; a decision can only carry one of them.
pub fn encode_cmd2(decision: &MotionDecision) -> u8 {
    let mut cmd2 = 0u8;

    if decision.tele() {
        cmd2 |= CMD2_ZOOM_TELE;
    } else if decision.wide() {
        cmd2 |= CMD2_ZOOM_WIDE;
    }

    if decision.down() {
        cmd2 |= CMD2_TILT_DOWN;
    }
    if decision.up() {
        cmd2 |= CMD2_TILT_UP;
    }
    if decision.right() {
        cmd2 |= CMD2_PAN_RIGHT;
    }
    if decision.left() {
        cmd2 |= CMD2_PAN_LEFT;
    }

    cmd2
}
