//! Per-bin blend laws.
//!
//! Each law is a pure function of the two analyzed bins and the morph amount,
//! so the math for one law can be tested without an engine around it.

use crate::core::types::BlendLaw;
use crate::spectral::envelope::{fine_structure, LOG_EPSILON};
use crate::spectral::phase::shortest_arc;

/// Lower bound of the formant-preservation multiplier.
pub const CORRECTION_MIN: f32 = 0.1;
/// Upper bound of the formant-preservation multiplier.
pub const CORRECTION_MAX: f32 = 10.0;

/// One analyzed bin of one source.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BinSample {
    pub magnitude: f32,
    pub phase: f32,
    /// Cepstral envelope at this bin. Only meaningful when the envelope was
    /// extracted for the frame (Formant law or formant preservation).
    pub envelope: f32,
}

impl BinSample {
    pub fn new(magnitude: f32, phase: f32, envelope: f32) -> Self {
        Self {
            magnitude,
            phase,
            envelope,
        }
    }
}

/// Signature shared by all blend laws: `(a, b, t) -> (magnitude, phase)`.
pub type BlendFn = fn(&BinSample, &BinSample, f32) -> (f32, f32);

impl BlendLaw {
    /// Returns the pure per-bin function implementing this law.
    #[inline]
    pub fn kernel(self) -> BlendFn {
        match self {
            BlendLaw::Linear => blend_linear,
            BlendLaw::MagnitudeOnly => blend_magnitude_only,
            BlendLaw::Logarithmic => blend_logarithmic,
            BlendLaw::Formant => blend_formant,
        }
    }

    /// Whether this law reads the spectral envelope.
    #[inline]
    pub fn uses_envelope(self) -> bool {
        matches!(self, BlendLaw::Formant)
    }

    /// Whether the formant-preservation correction runs after this law.
    #[inline]
    pub fn accepts_formant_correction(self) -> bool {
        !matches!(self, BlendLaw::Formant)
    }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Linear magnitude, shortest-arc phase.
pub fn blend_linear(a: &BinSample, b: &BinSample, t: f32) -> (f32, f32) {
    (
        lerp(a.magnitude, b.magnitude, t),
        shortest_arc(a.phase, b.phase, t),
    )
}

/// Linear magnitude; phase taken whole from A below `t = 0.5`, from B at or above.
///
/// The switch is a hard step with no crossfade region.
pub fn blend_magnitude_only(a: &BinSample, b: &BinSample, t: f32) -> (f32, f32) {
    let phase = if t < 0.5 { a.phase } else { b.phase };
    (lerp(a.magnitude, b.magnitude, t), phase)
}

/// Magnitude interpolated in the log domain (a geometric blend).
pub fn blend_logarithmic(a: &BinSample, b: &BinSample, t: f32) -> (f32, f32) {
    let log_a = (a.magnitude + LOG_EPSILON).ln();
    let log_b = (b.magnitude + LOG_EPSILON).ln();
    (
        lerp(log_a, log_b, t).exp(),
        shortest_arc(a.phase, b.phase, t),
    )
}

/// Envelope and fine structure blended independently, then recombined.
pub fn blend_formant(a: &BinSample, b: &BinSample, t: f32) -> (f32, f32) {
    let fine_a = fine_structure(a.magnitude, a.envelope);
    let fine_b = fine_structure(b.magnitude, b.envelope);
    let envelope = lerp(a.envelope, b.envelope, t);
    let fine = lerp(fine_a, fine_b, t);
    (envelope * fine, shortest_arc(a.phase, b.phase, t))
}

/// Pulls a morphed magnitude toward the interpolated envelope of the sources.
///
/// `strength` in (0, 1] scales the correction ratio toward 1; the final
/// multiplier is clamped to [0.1, 10]. A zero strength or a vanishing
/// magnitude leaves the value untouched.
#[inline]
pub fn formant_correction(
    magnitude: f32,
    envelope_a: f32,
    envelope_b: f32,
    t: f32,
    strength: f32,
) -> f32 {
    if strength <= 0.0 || magnitude <= LOG_EPSILON {
        return magnitude;
    }
    let target = lerp(envelope_a, envelope_b, t);
    let ratio = target / magnitude;
    let softened = lerp(ratio, 1.0, 1.0 - strength.min(1.0));
    magnitude * softened.clamp(CORRECTION_MIN, CORRECTION_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::PI;

    fn bin(magnitude: f32, phase: f32) -> BinSample {
        BinSample::new(magnitude, phase, 0.0)
    }

    #[test]
    fn test_kernel_dispatch() {
        let a = BinSample::new(1.0, 0.2, 2.0);
        let b = BinSample::new(4.0, 0.6, 1.0);
        for law in [
            BlendLaw::Linear,
            BlendLaw::MagnitudeOnly,
            BlendLaw::Logarithmic,
            BlendLaw::Formant,
        ] {
            let (m0, _) = law.kernel()(&a, &b, 0.0);
            let (m1, _) = law.kernel()(&a, &b, 1.0);
            assert!((m0 - 1.0).abs() < 1e-4, "{:?} at t=0 gave {}", law, m0);
            assert!((m1 - 4.0).abs() < 1e-4, "{:?} at t=1 gave {}", law, m1);
        }
    }

    #[test]
    fn test_linear_midpoint() {
        let (mag, phase) = blend_linear(&bin(1.0, 0.0), &bin(3.0, 1.0), 0.5);
        assert!((mag - 2.0).abs() < 1e-6);
        assert!((phase - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_magnitude_only_hard_switch() {
        let a = bin(1.0, -1.0);
        let b = bin(2.0, 2.0);
        assert_eq!(blend_magnitude_only(&a, &b, 0.499).1, -1.0);
        assert_eq!(blend_magnitude_only(&a, &b, 0.5).1, 2.0);
        assert!((blend_magnitude_only(&a, &b, 0.5).0 - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_logarithmic_is_geometric() {
        let (mag, _) = blend_logarithmic(&bin(1.0, 0.0), &bin(100.0, 0.0), 0.5);
        assert!((mag - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_logarithmic_handles_zero() {
        let (mag, _) = blend_logarithmic(&bin(0.0, 0.0), &bin(0.0, 0.0), 0.3);
        assert!(mag.is_finite());
        assert!(mag < 1e-9);
    }

    #[test]
    fn test_formant_swaps_envelope_keeps_fine() {
        // Same fine structure (2.0), different envelopes
        let a = BinSample::new(2.0, 0.0, 1.0);
        let b = BinSample::new(8.0, 0.0, 4.0);
        let (mag, _) = blend_formant(&a, &b, 0.5);
        assert!((mag - 2.5 * 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_formant_zero_envelope_falls_back() {
        let a = BinSample::new(2.0, 0.0, 0.0);
        let b = BinSample::new(3.0, 0.0, 0.0);
        let (mag, _) = blend_formant(&a, &b, 0.5);
        assert_eq!(mag, 0.0);
    }

    #[test]
    fn test_phase_crosses_pi_boundary() {
        let (_, phase) = blend_linear(&bin(1.0, PI - 0.1), &bin(1.0, -PI + 0.1), 0.5);
        assert!((phase.abs() - PI).abs() < 1e-4);
    }

    #[test]
    fn test_formant_correction_disabled() {
        assert_eq!(formant_correction(0.7, 5.0, 5.0, 0.5, 0.0), 0.7);
        assert_eq!(formant_correction(0.0, 5.0, 5.0, 0.5, 1.0), 0.0);
    }

    #[test]
    fn test_formant_correction_full_strength() {
        // Full strength maps the magnitude onto the interpolated envelope
        let out = formant_correction(1.0, 2.0, 4.0, 0.5, 1.0);
        assert!((out - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_formant_correction_partial_strength() {
        // ratio 3, blended halfway toward 1 -> 2
        let out = formant_correction(1.0, 2.0, 4.0, 0.5, 0.5);
        assert!((out - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_formant_correction_clamped() {
        assert!((formant_correction(1.0, 1000.0, 1000.0, 0.5, 1.0) - 10.0).abs() < 1e-5);
        assert!((formant_correction(1.0, 0.0, 0.0, 0.5, 1.0) - 0.1).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_logarithmic_monotonic_in_t(
            mag_a in 0.0f32..10.0,
            extra in 0.001f32..10.0,
            t0 in 0.0f32..=1.0,
            t1 in 0.0f32..=1.0,
        ) {
            let a = bin(mag_a, 0.0);
            let b = bin(mag_a + extra, 0.0);
            let (lo, hi) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
            let m_lo = blend_logarithmic(&a, &b, lo).0;
            let m_hi = blend_logarithmic(&a, &b, hi).0;
            prop_assert!(m_hi >= m_lo * (1.0 - 1e-5), "{} < {}", m_hi, m_lo);
        }

        #[test]
        fn prop_blend_phase_wrapped(
            pa in -PI..PI,
            pb in -PI..PI,
            t in 0.0f32..=1.0,
        ) {
            for law in [BlendLaw::Linear, BlendLaw::MagnitudeOnly, BlendLaw::Logarithmic, BlendLaw::Formant] {
                let (_, phase) = law.kernel()(&BinSample::new(1.0, pa, 1.0), &BinSample::new(2.0, pb, 1.0), t);
                prop_assert!((-PI..=PI).contains(&phase));
            }
        }
    }
}
