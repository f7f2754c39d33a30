//! # Controller Module
//!
//! Gamepad input handling.
//!
//! This module handles:
//! - Gamepad detection and connection via evdev
//! - Normalizing analog stick and trigger readings
//! - Tracking axis events and the quit button between ticks
//! - Resolving axis readings into camera motion

pub mod gamepad;
pub mod mapper;
pub mod motion;
