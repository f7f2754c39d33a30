//! # Pelco-D Frame Decoder
//!
//! Parses movement frames back into a camera address and [`MotionDecision`].
//! Only the pan/tilt/zoom subset is understood; any other command is
//! rejected rather than guessed at.

use super::checksum::pelco_checksum;
use super::protocol::*;
use crate::error::{PtzBridgeError, Result};

/// Decode a complete Pelco-D movement frame
///
/// # Arguments
///
/// * `frame` - Exactly 7 bytes, sync byte first
///
/// # Returns
///
/// * `Result<(u8, MotionDecision)>` - Camera address and requested motion
///
/// # Errors
///
/// Returns error if:
/// - Frame is not 7 bytes long
/// - Sync byte is incorrect
/// - Checksum does not match
/// - cmd1 or cmd2 carry anything outside the movement subset
/// - Opposite directions are set together
/// - A speed exceeds 0x39
pub fn decode_frame(frame: &[u8]) -> Result<(u8, MotionDecision)> {
    if frame.len() != PELCO_FRAME_LEN {
        return Err(PtzBridgeError::PelcoProtocol(format!(
            "Frame must be {} bytes, got {}",
            PELCO_FRAME_LEN,
            frame.len()
        )));
    }

    if frame[0] != PELCO_SYNC_BYTE {
        return Err(PtzBridgeError::PelcoProtocol(format!(
            "Invalid sync byte: 0x{:02X}",
            frame[0]
        )));
    }

    let calculated = pelco_checksum(&frame[1..6]);
    if calculated != frame[6] {
        return Err(PtzBridgeError::PelcoProtocol(format!(
            "Checksum mismatch: expected 0x{:02X}, got 0x{:02X}",
            calculated, frame[6]
        )));
    }

    let address = frame[1];
    let cmd1 = frame[2];
    let cmd2 = frame[3];

    if cmd1 != 0x00 {
        return Err(PtzBridgeError::PelcoProtocol(format!(
            "Unsupported cmd1: 0x{:02X}",
            cmd1
        )));
    }

    if cmd2 & !CMD2_MOVEMENT_MASK != 0 {
        return Err(PtzBridgeError::PelcoProtocol(format!(
            "Unsupported cmd2 bits: 0x{:02X}",
            cmd2 & !CMD2_MOVEMENT_MASK
        )));
    }

    let pan = decode_pair(cmd2, CMD2_PAN_LEFT, CMD2_PAN_RIGHT, "left/right")?
        .map_or(Pan::Stop, |left| if left { Pan::Left } else { Pan::Right });
    let tilt = decode_pair(cmd2, CMD2_TILT_UP, CMD2_TILT_DOWN, "up/down")?
        .map_or(Tilt::Stop, |up| if up { Tilt::Up } else { Tilt::Down });
    let zoom = decode_pair(cmd2, CMD2_ZOOM_TELE, CMD2_ZOOM_WIDE, "tele/wide")?
        .map_or(Zoom::Stop, |tele| if tele { Zoom::Tele } else { Zoom::Wide });

    let pan_speed = decode_speed(frame[4], "pan")?;
    let tilt_speed = decode_speed(frame[5], "tilt")?;

    Ok((
        address,
        MotionDecision::new(pan, pan_speed, tilt, tilt_speed, zoom),
    ))
}

/// One-line human readable summary of a frame, for logs
///
/// Frames that do not decode are described by the decode error.
///
/// # Examples
///
/// ```
/// use ptz_bridge::pelco::decoder::describe_frame;
///
/// let text = describe_frame(&[0xFF, 0x01, 0x00, 0x04, 0x1C, 0x00, 0x21]);
/// assert_eq!(text, "camera 1: pan Left 28, tilt Stop 0, zoom Stop");
/// ```
pub fn describe_frame(frame: &[u8]) -> String {
    match decode_frame(frame) {
        Ok((address, decision)) => format!(
            "camera {}: pan {:?} {}, tilt {:?} {}, zoom {:?}",
            address,
            decision.pan(),
            decision.pan_speed(),
            decision.tilt(),
            decision.tilt_speed(),
            decision.zoom()
        ),
        Err(e) => format!("undecodable frame: {}", e),
    }
}

/// `Some(true)` for the first flag, `Some(false)` for the second, `None` for neither.
fn decode_pair(cmd2: u8, first: u8, second: u8, name: &str) -> Result<Option<bool>> {
    match (cmd2 & first != 0, cmd2 & second != 0) {
        (true, true) => Err(PtzBridgeError::PelcoProtocol(format!(
            "Conflicting {} flags in cmd2 0x{:02X}",
            name, cmd2
        ))),
        (true, false) => Ok(Some(true)),
        (false, true) => Ok(Some(false)),
        (false, false) => Ok(None),
    }
}

fn decode_speed(value: u8, axis: &str) -> Result<u8> {
    if value > PELCO_MAX_SPEED {
        return Err(PtzBridgeError::PelcoProtocol(format!(
            "{} speed 0x{:02X} exceeds maximum 0x{:02X}",
            axis, value, PELCO_MAX_SPEED
        )));
    }
    Ok(value)
}
