//! # Pelco-D Protocol Module
//!
//! Implementation of the movement subset of Pelco-D for PTZ cameras.
//!
//! This module handles:
//! - Movement frame encoding (pan, tilt, zoom flags and speeds)
//! - Additive mod-255 checksum
//! - Frame validation and decoding for inspection

pub mod protocol;
pub mod encoder;
pub mod decoder;
pub mod checksum;
