//! # Motion Resolver
//!
//! Turns four normalized axis readings into a [`MotionDecision`].
//!
//! ## Pan and Tilt
//!
//! A stick axis moves the camera only when its magnitude is strictly greater
//! than the deadzone. The sign picks the direction (negative horizontal is
//! left, negative vertical is up) and the magnitude picks the speed:
//!
//! `speed = floor(0x39 * |value|)`, saturating at 0x39.
//!
//! ## Zoom
//!
//! Triggers rest at -1.0. A trigger counts as pulled once it reads above the
//! zoom threshold (default -0.99). Tele and wide are arbitrated through a
//! [`ZoomLatch`] carried from the previous evaluation:
//!
//! 1. `tele = !previous.wide && zoom_tele > threshold`
//! 2. `wide = !tele && zoom_wide > threshold`
//!
//! Tele therefore wins when both triggers are pulled from rest, while a wide
//! zoom already in progress keeps tele blocked for one more evaluation.
//!
//! ## Usage
//!
//! ```
//! use ptz_bridge::controller::motion::{AxisState, MotionResolver, ZoomLatch};
//!
//! let resolver = MotionResolver::default();
//! let axes = AxisState::new(-0.5, 0.0, -1.0, -1.0);
//!
//! let (decision, latch) = resolver.resolve(&axes, ZoomLatch::default());
//! assert!(decision.left());
//! assert_eq!(decision.pan_speed(), 28);
//! assert_eq!(latch, ZoomLatch::default());
//! ```

use crate::pelco::protocol::{MotionDecision, Pan, Tilt, Zoom, PELCO_MAX_SPEED};

/// Stick magnitude that must be exceeded before pan/tilt engages.
pub const DEFAULT_DEADZONE: f32 = 0.1;

/// Trigger reading that must be exceeded before zoom engages.
pub const DEFAULT_ZOOM_THRESHOLD: f32 = -1.0 + 0.01;

/// Normalized readings for one tick, each nominally in [-1.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisState {
    /// Pan stick. Negative is left.
    pub horizontal: f32,
    /// Tilt stick. Negative is up.
    pub vertical: f32,
    /// Zoom-in trigger. -1.0 when released.
    pub zoom_tele: f32,
    /// Zoom-out trigger. -1.0 when released.
    pub zoom_wide: f32,
}

impl AxisState {
    /// Sticks centered, triggers released.
    pub const REST: AxisState = AxisState {
        horizontal: 0.0,
        vertical: 0.0,
        zoom_tele: -1.0,
        zoom_wide: -1.0,
    };

    #[must_use]
    pub fn new(horizontal: f32, vertical: f32, zoom_tele: f32, zoom_wide: f32) -> Self {
        Self {
            horizontal,
            vertical,
            zoom_tele,
            zoom_wide,
        }
    }
}

impl Default for AxisState {
    fn default() -> Self {
        Self::REST
    }
}

/// Sticky tele/wide bits carried from one evaluation to the next.
///
/// At most one of the two bits is ever set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ZoomLatch {
    tele: bool,
    wide: bool,
}

impl ZoomLatch {
    pub fn tele(&self) -> bool {
        self.tele
    }

    pub fn wide(&self) -> bool {
        self.wide
    }
}

impl From<Zoom> for ZoomLatch {
    fn from(zoom: Zoom) -> Self {
        Self {
            tele: zoom == Zoom::Tele,
            wide: zoom == Zoom::Wide,
        }
    }
}

/// Resolves axis readings into camera motion.
#[derive(Debug, Clone, Copy)]
pub struct MotionResolver {
    deadzone: f32,
    zoom_threshold: f32,
}

impl Default for MotionResolver {
    fn default() -> Self {
        Self {
            deadzone: DEFAULT_DEADZONE,
            zoom_threshold: DEFAULT_ZOOM_THRESHOLD,
        }
    }
}

impl MotionResolver {
    /// Creates a resolver with custom thresholds.
    ///
    /// # Arguments
    ///
    /// * `deadzone` - Stick magnitude that must be exceeded (strictly)
    /// * `zoom_threshold` - Trigger reading that must be exceeded (strictly)
    #[must_use]
    pub fn new(deadzone: f32, zoom_threshold: f32) -> Self {
        Self {
            deadzone,
            zoom_threshold,
        }
    }

    pub fn deadzone(&self) -> f32 {
        self.deadzone
    }

    pub fn zoom_threshold(&self) -> f32 {
        self.zoom_threshold
    }

    /// Resolve one tick of input.
    ///
    /// # Arguments
    ///
    /// * `axes` - This tick's readings
    /// * `latch` - The zoom latch returned by the previous evaluation
    ///
    /// # Returns
    ///
    /// The decision for this tick and the latch to pass to the next one.
    /// When nothing moves the decision is [`MotionDecision::IDLE`].
    #[must_use]
    pub fn resolve(&self, axes: &AxisState, latch: ZoomLatch) -> (MotionDecision, ZoomLatch) {
        let pan = if self.deflected(axes.horizontal) {
            if axes.horizontal < 0.0 {
                Pan::Left
            } else {
                Pan::Right
            }
        } else {
            Pan::Stop
        };

        let tilt = if self.deflected(axes.vertical) {
            if axes.vertical < 0.0 {
                Tilt::Up
            } else {
                Tilt::Down
            }
        } else {
            Tilt::Stop
        };

        // Order matters: tele reads the previous wide bit, wide reads the new tele bit.
        let tele = !latch.wide && axes.zoom_tele > self.zoom_threshold;
        let wide = !tele && axes.zoom_wide > self.zoom_threshold;
        let next_latch = ZoomLatch { tele, wide };

        let zoom = if tele {
            Zoom::Tele
        } else if wide {
            Zoom::Wide
        } else {
            Zoom::Stop
        };

        if pan == Pan::Stop && tilt == Tilt::Stop && zoom == Zoom::Stop {
            return (MotionDecision::IDLE, next_latch);
        }

        let decision = MotionDecision::new(
            pan,
            speed_code(axes.horizontal),
            tilt,
            speed_code(axes.vertical),
            zoom,
        );

        (decision, next_latch)
    }

    #[inline]
    fn deflected(&self, value: f32) -> bool {
        value.abs() > self.deadzone
    }
}

/// `floor(0x39 * |value|)`, saturating at 0x39.
#[inline]
fn speed_code(value: f32) -> u8 {
    // f64 so the product is not rounded up to the next whole number first
    let max = f64::from(PELCO_MAX_SPEED);
    (max * f64::from(value.abs())).floor().clamp(0.0, max) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(axes: AxisState) -> MotionDecision {
        MotionResolver::default().resolve(&axes, ZoomLatch::default()).0
    }

    #[test]
    fn test_defaults() {
        let resolver = MotionResolver::default();
        assert_eq!(resolver.deadzone(), 0.1);
        assert!((resolver.zoom_threshold() - (-0.99)).abs() < 1e-6);
        assert_eq!(AxisState::default(), AxisState::REST);
    }

    #[test]
    fn test_rest_is_idle() {
        let decision = resolve(AxisState::REST);
        assert_eq!(decision, MotionDecision::IDLE);
        assert!(!decision.should_issue());
    }

    #[test]
    fn test_inside_deadzone_is_idle() {
        for &(h, v) in &[(0.1, 0.1), (-0.1, -0.1), (0.05, -0.09), (0.0, 0.1)] {
            let decision = resolve(AxisState::new(h, v, -1.0, -1.0));
            assert_eq!(decision, MotionDecision::IDLE, "h={} v={}", h, v);
        }
    }

    #[test]
    fn test_deadzone_boundary_is_strict() {
        let decision = resolve(AxisState::new(0.1, 0.0, -1.0, -1.0));
        assert!(!decision.right());

        let decision = resolve(AxisState::new(0.1001, 0.0, -1.0, -1.0));
        assert!(decision.right());
    }

    #[test]
    fn test_pan_left_half_deflection() {
        let decision = resolve(AxisState::new(-0.5, 0.0, -1.0, -1.0));
        assert!(decision.left());
        assert!(!decision.right());
        assert_eq!(decision.pan_speed(), 28);
        assert_eq!(decision.tilt(), Tilt::Stop);
        assert_eq!(decision.tilt_speed(), 0);
    }

    #[test]
    fn test_tilt_directions() {
        let up = resolve(AxisState::new(0.0, -1.0, -1.0, -1.0));
        assert!(up.up() && !up.down());
        assert_eq!(up.tilt_speed(), 0x39);
        assert_eq!(up.pan_speed(), 0);

        let down = resolve(AxisState::new(0.0, 0.3, -1.0, -1.0));
        assert!(down.down() && !down.up());
        assert_eq!(down.tilt_speed(), 17);
    }

    #[test]
    fn test_exactly_one_pan_direction_outside_deadzone() {
        for i in 11..=100 {
            let magnitude = i as f32 / 100.0;
            for &h in &[magnitude, -magnitude] {
                let decision = resolve(AxisState::new(h, 0.0, -1.0, -1.0));
                assert!(decision.left() ^ decision.right(), "h={}", h);
                assert_eq!(decision.left(), h < 0.0);
                assert_eq!(
                    decision.pan_speed(),
                    (57.0 * f64::from(h.abs())).floor() as u8,
                    "h={}",
                    h
                );
            }
        }
    }

    #[test]
    fn test_speed_uses_stored_reading() {
        // k/57 in f32 sits just below k for these, so the code is k - 1
        for &(k, expected) in &[(9u8, 8u8), (25, 24), (52, 51)] {
            let h = f32::from(k) / 57.0;
            let decision = resolve(AxisState::new(h, 0.0, -1.0, -1.0));
            assert_eq!(decision.pan_speed(), expected, "h={}", h);
        }

        for k in 6..=57u8 {
            let h = f32::from(k) / 57.0;
            let decision = resolve(AxisState::new(0.0, -h, -1.0, -1.0));
            assert_eq!(
                decision.tilt_speed(),
                (57.0 * f64::from(h)).floor() as u8,
                "v={}",
                -h
            );
        }
    }

    #[test]
    fn test_pan_speed_monotonic() {
        let mut previous = 0;
        for i in 11..=100 {
            let decision = resolve(AxisState::new(i as f32 / 100.0, 0.0, -1.0, -1.0));
            assert!(decision.pan_speed() >= previous);
            previous = decision.pan_speed();
        }
        assert_eq!(previous, 0x39);
    }

    #[test]
    fn test_out_of_range_values_saturate() {
        let decision = resolve(AxisState::new(-3.0, 7.5, -1.0, -1.0));
        assert!(decision.left() && decision.down());
        assert_eq!(decision.pan_speed(), 0x39);
        assert_eq!(decision.tilt_speed(), 0x39);
    }

    #[test]
    fn test_nan_is_ignored() {
        let decision = resolve(AxisState::new(f32::NAN, f32::NAN, f32::NAN, f32::NAN));
        assert_eq!(decision, MotionDecision::IDLE);
    }

    #[test]
    fn test_tele_from_rest() {
        let resolver = MotionResolver::default();
        let (decision, latch) =
            resolver.resolve(&AxisState::new(0.0, 0.0, 1.0, -1.0), ZoomLatch::default());

        assert!(decision.tele());
        assert_eq!(decision.pan_speed(), 0);
        assert_eq!(decision.tilt_speed(), 0);
        assert!(latch.tele() && !latch.wide());
    }

    #[test]
    fn test_trigger_near_rest_does_not_zoom() {
        // -0.995 is still below the -0.99 threshold
        let decision = resolve(AxisState::new(0.0, 0.0, -0.995, -0.995));
        assert_eq!(decision, MotionDecision::IDLE);
    }

    #[test]
    fn test_tele_wins_when_both_pulled_from_rest() {
        let resolver = MotionResolver::default();
        let (decision, latch) =
            resolver.resolve(&AxisState::new(0.0, 0.0, 0.5, 0.5), ZoomLatch::default());

        assert!(decision.tele());
        assert!(!decision.wide());
        assert!(latch.tele() && !latch.wide());
    }

    #[test]
    fn test_previous_wide_blocks_tele() {
        let resolver = MotionResolver::default();
        let wide_latch = ZoomLatch::from(Zoom::Wide);

        let (decision, latch) = resolver.resolve(&AxisState::new(0.0, 0.0, 0.5, 0.5), wide_latch);

        assert!(decision.wide());
        assert!(!decision.tele());
        assert!(latch.wide() && !latch.tele());
    }

    #[test]
    fn test_previous_wide_blocks_tele_for_one_tick_only() {
        let resolver = MotionResolver::default();
        let wide_latch = ZoomLatch::from(Zoom::Wide);

        // Wide trigger released, tele pulled: tele still blocked this tick
        let axes = AxisState::new(0.0, 0.0, 0.5, -1.0);
        let (decision, latch) = resolver.resolve(&axes, wide_latch);
        assert_eq!(decision, MotionDecision::IDLE);
        assert_eq!(latch, ZoomLatch::default());

        // Next tick the latch is clear and tele engages
        let (decision, _) = resolver.resolve(&axes, latch);
        assert!(decision.tele());
    }

    #[test]
    fn test_released_trigger_clears_latch() {
        let resolver = MotionResolver::default();
        let (_, latch) = resolver.resolve(&AxisState::REST, ZoomLatch::from(Zoom::Tele));
        assert_eq!(latch, ZoomLatch::default());
    }

    #[test]
    fn test_previous_tele_does_not_block_wide_when_tele_released() {
        let resolver = MotionResolver::default();
        let (decision, latch) = resolver.resolve(
            &AxisState::new(0.0, 0.0, -1.0, 0.2),
            ZoomLatch::from(Zoom::Tele),
        );
        assert!(decision.wide());
        assert!(latch.wide());
    }

    #[test]
    fn test_mutual_exclusion_over_grid() {
        let resolver = MotionResolver::default();
        let values = [-1.0, -0.5, -0.1, 0.0, 0.1, 0.5, 1.0];
        let latches = [
            ZoomLatch::default(),
            ZoomLatch::from(Zoom::Tele),
            ZoomLatch::from(Zoom::Wide),
        ];

        for &h in &values {
            for &v in &values {
                for &t in &values {
                    for &w in &values {
                        for &latch in &latches {
                            let axes = AxisState::new(h, v, t, w);
                            let (d, next) = resolver.resolve(&axes, latch);
                            assert!(!(d.left() && d.right()));
                            assert!(!(d.up() && d.down()));
                            assert!(!(d.tele() && d.wide()));
                            assert!(!(next.tele() && next.wide()));
                            assert!(d.pan_speed() == 0 || d.left() || d.right());
                            assert!(d.tilt_speed() == 0 || d.up() || d.down());
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_custom_thresholds() {
        let resolver = MotionResolver::new(0.25, 0.0);
        let axes = AxisState::new(0.2, 0.0, -0.5, -1.0);
        let (decision, _) = resolver.resolve(&axes, ZoomLatch::default());
        assert_eq!(decision, MotionDecision::IDLE);

        let axes = AxisState::new(0.3, 0.0, 0.1, -1.0);
        let (decision, _) = resolver.resolve(&axes, ZoomLatch::default());
        assert!(decision.right() && decision.tele());
    }
}
