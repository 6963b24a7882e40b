//! Phase wrapping, shortest-arc interpolation and phase-continuity tracking.

use std::f32::consts::PI;

const TWO_PI: f32 = 2.0 * PI;

/// Wraps a phase value to [-PI, PI] using efficient modulo arithmetic.
///
/// Non-finite input maps to 0.
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    if !phase.is_finite() {
        return 0.0;
    }
    let p = phase + PI;
    let wrapped = p - (p / TWO_PI).floor() * TWO_PI - PI;
    // floor() rounding can land a hair outside the interval for huge inputs
    wrapped.clamp(-PI, PI)
}

/// Interpolates from `from` toward `to` along the shorter arc.
#[inline]
pub fn shortest_arc(from: f32, to: f32, t: f32) -> f32 {
    let delta = wrap_phase(to - from);
    wrap_phase(from + delta * t)
}

/// Fraction of the remaining phase error closed per frame.
///
/// `smoothing = 0` closes it fully (snap), `smoothing = 1` closes 1% per frame.
#[inline]
pub fn smoothing_coefficient(smoothing: f32) -> f32 {
    1.0 - smoothing.clamp(0.0, 1.0) * 0.99
}

/// Moves an accumulated bin phase toward `target` and returns the new value.
///
/// Both the stored phase and the result stay wrapped to [-PI, PI], so the
/// tracker can run indefinitely without drifting out of range. A non-finite
/// `target` leaves the stored phase where it is.
#[inline]
pub fn track_phase(accumulated: &mut f32, target: f32, coeff: f32) -> f32 {
    let current = wrap_phase(*accumulated);
    if !target.is_finite() {
        *accumulated = current;
        return current;
    }
    let delta = wrap_phase(target - current);
    *accumulated = wrap_phase(current + delta * coeff);
    *accumulated
}
