//! # Pelco-D Checksum
//!
//! Single-byte additive checksum: the sum of address, cmd1, cmd2, data1 and
//! data2, modulo 255 (not 256).

/// Checksum modulus used by Pelco-D
const PELCO_CHECKSUM_MODULUS: u32 = 255;

/// Calculate the Pelco-D checksum over the frame body (bytes 1-5)
///
/// # Arguments
///
/// * `body` - Address, cmd1, cmd2, data1, data2 (sync byte excluded)
///
/// # Returns
///
/// * `u8` - Sum of the bytes modulo 255
///
/// # Examples
///
/// ```
/// use ptz_bridge::pelco::checksum::pelco_checksum;
///
/// assert_eq!(pelco_checksum(&[0x01, 0x00, 0x04, 0x1C, 0x00]), 0x21);
/// ```
pub fn pelco_checksum(body: &[u8]) -> u8 {
    let sum: u32 = body.iter().map(|&b| u32::from(b)).sum();
    (sum % PELCO_CHECKSUM_MODULUS) as u8
}
