//! # Control Loop
//!
//! Paces the input → resolver → encoder → serial pipeline at a fixed tick rate.
//!
//! Each tick:
//! 1. Poll the input source for the signals accumulated since the last tick
//! 2. Sample the axes (every tick, or only after an axis event) and resolve
//! 3. Transmit the encoded frame when the decision carries motion
//! 4. Stop if the quit button was pressed; that tick's frame is still sent
//!
//! Serial errors end the loop and are returned to the caller.

use std::future::Future;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::Config;
use crate::controller::mapper::InputSignals;
use crate::controller::motion::{AxisState, MotionResolver, ZoomLatch};
use crate::error::Result;
use crate::pelco::encoder::{encode_movement, encode_stop};
use crate::pelco::protocol::{PelcoDFrame, DEFAULT_CAMERA_ADDRESS};
use crate::serial::port_trait::SerialPortIO;
use crate::serial::CameraSerial;

/// Default control rate in Hz
pub const DEFAULT_TICK_RATE_HZ: u32 = 137;

/// Number of ticks between rate log messages (~10 seconds at 137Hz)
pub const LOG_INTERVAL_TICKS: u64 = 1370;

/// When the axes are re-read and resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingMode {
    /// Only on ticks that saw an axis event
    #[default]
    Edge,
    /// Every tick
    Level,
}

/// Source of controller input polled once per tick
#[cfg_attr(test, mockall::automock)]
pub trait InputSource {
    /// Return the signals seen since the previous poll and clear them.
    ///
    /// Must not block.
    fn poll(&mut self) -> Result<InputSignals>;

    /// Current normalized axis readings
    fn axes(&self) -> AxisState;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    /// The last evaluated decision was idle
    #[default]
    Idle,
    /// The last evaluated decision carried motion
    Active,
}

/// Result of evaluating one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    /// The axes were read and resolved this tick
    pub sampled: bool,
    /// Frame to transmit, if any
    pub frame: Option<PelcoDFrame>,
}

/// Counters reported when the loop ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub ticks: u64,
    pub samples: u64,
    pub frames_sent: u64,
    /// Ticks whose work took longer than the tick period
    pub overruns: u64,
}

/// Control loop state
///
/// Owns the zoom latch and the Idle/Active state; both only change inside
/// [`ControlLoop::evaluate`].
#[derive(Debug, Clone)]
pub struct ControlLoop {
    address: u8,
    resolver: MotionResolver,
    mode: SamplingMode,
    stop_on_release: bool,
    tick_rate_hz: u32,
    latch: ZoomLatch,
    state: LoopState,
}

impl Default for ControlLoop {
    fn default() -> Self {
        Self::new(DEFAULT_CAMERA_ADDRESS, MotionResolver::default())
    }
}

impl ControlLoop {
    /// Create a loop in edge mode at the default tick rate
    pub fn new(address: u8, resolver: MotionResolver) -> Self {
        Self {
            address,
            resolver,
            mode: SamplingMode::default(),
            stop_on_release: false,
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            latch: ZoomLatch::default(),
            state: LoopState::default(),
        }
    }

    /// Build a loop from a validated configuration
    pub fn from_config(config: &Config) -> Self {
        let resolver = MotionResolver::new(
            config.controller.deadzone,
            config.controller.zoom_threshold,
        );

        Self::new(config.camera.address, resolver)
            .with_mode(config.control.sampling)
            .with_stop_on_release(config.control.stop_on_release)
            .with_tick_rate(config.control.tick_rate_hz)
    }

    pub fn with_mode(mut self, mode: SamplingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_stop_on_release(mut self, stop_on_release: bool) -> Self {
        self.stop_on_release = stop_on_release;
        self
    }

    /// Set the tick rate; zero is treated as 1Hz
    pub fn with_tick_rate(mut self, tick_rate_hz: u32) -> Self {
        self.tick_rate_hz = tick_rate_hz.max(1);
        self
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn mode(&self) -> SamplingMode {
        self.mode
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.tick_rate_hz
    }

    /// Time between ticks
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate_hz))
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn latch(&self) -> ZoomLatch {
        self.latch
    }

    /// Decide what one tick transmits
    ///
    /// `sample` is only called when the sampling mode asks for a fresh reading.
    /// Ticks that do not sample leave the latch and state untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use ptz_bridge::control::{ControlLoop, LoopState};
    /// use ptz_bridge::controller::motion::AxisState;
    ///
    /// let mut control = ControlLoop::default();
    /// let outcome = control.evaluate(true, || AxisState::new(-0.5, 0.0, -1.0, -1.0));
    ///
    /// let frame = outcome.frame.unwrap();
    /// assert_eq!(frame.as_bytes(), &[0xFF, 0x01, 0x00, 0x04, 0x1C, 0x00, 0x21]);
    /// assert_eq!(control.state(), LoopState::Active);
    /// ```
    pub fn evaluate<F>(&mut self, axis_event: bool, sample: F) -> TickOutcome
    where
        F: FnOnce() -> AxisState,
    {
        let sampled = match self.mode {
            SamplingMode::Edge => axis_event,
            SamplingMode::Level => true,
        };
        if !sampled {
            return TickOutcome::default();
        }

        let axes = sample();
        let (decision, latch) = self.resolver.resolve(&axes, self.latch);
        self.latch = latch;

        let frame = if decision.should_issue() {
            self.state = LoopState::Active;
            Some(encode_movement(self.address, &decision))
        } else {
            let released = self.state == LoopState::Active;
            self.state = LoopState::Idle;
            (released && self.stop_on_release).then(|| encode_stop(self.address))
        };

        TickOutcome { sampled, frame }
    }

    /// Run until quit, shutdown, or a fatal error
    ///
    /// # Arguments
    ///
    /// * `input` - Controller input, polled once per tick
    /// * `serial` - Camera link
    /// * `shutdown` - Resolves when the loop should stop (e.g. Ctrl+C)
    ///
    /// # Errors
    ///
    /// - `ControllerDisconnected` (or other input errors) from `poll`
    /// - `Serial` / `SerialWriteTimeout` when a frame cannot be sent
    pub async fn run<I, P, S>(
        &mut self,
        input: &mut I,
        serial: &mut CameraSerial<P>,
        shutdown: S,
    ) -> Result<RunSummary>
    where
        I: InputSource,
        P: SerialPortIO,
        S: Future<Output = ()>,
    {
        let period = self.tick_period();
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            "Starting control loop at {}Hz ({:?} sampling, camera address {})",
            self.tick_rate_hz, self.mode, self.address
        );

        let mut summary = RunSummary::default();
        let mut window_start = Instant::now();

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }

                _ = ticker.tick() => {
                    let started = Instant::now();
                    summary.ticks += 1;

                    let signals = input.poll()?;

                    let outcome = self.evaluate(signals.axis_event, || input.axes());
                    if outcome.sampled {
                        summary.samples += 1;
                    }
                    if let Some(frame) = outcome.frame {
                        serial.send_frame(&frame).await?;
                        summary.frames_sent += 1;
                    }

                    let elapsed = started.elapsed();
                    if elapsed > period {
                        summary.overruns += 1;
                        debug!("Tick {} overran: {:?} > {:?}", summary.ticks, elapsed, period);
                    }

                    if summary.ticks % LOG_INTERVAL_TICKS == 0 {
                        let rate = LOG_INTERVAL_TICKS as f64 / window_start.elapsed().as_secs_f64();
                        info!("{:.1}Hz, {} frames sent, {} overruns",
                            rate, summary.frames_sent, summary.overruns);
                        window_start = Instant::now();
                    }

                    if signals.quit {
                        info!("Quit button pressed");
                        break;
                    }
                }
            }
        }

        if self.stop_on_release && self.state == LoopState::Active {
            serial.send_frame(&encode_stop(self.address)).await?;
            summary.frames_sent += 1;
            self.state = LoopState::Idle;
        }

        info!(
            "Control loop stopped after {} ticks ({} frames sent)",
            summary.ticks, summary.frames_sent
        );
        Ok(summary)
    }
}
