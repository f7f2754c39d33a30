//! # PTZ Bridge Library
//!
//! Drive a Pelco-D pan-tilt-zoom camera from a gamepad.
//!
//! This library provides the pipeline that turns analog stick and trigger
//! readings into Pelco-D movement frames and sends them over a serial link
//! at a fixed rate.

pub mod config;
pub mod error;
pub mod pelco;
pub mod controller;
pub mod serial;
pub mod control;
