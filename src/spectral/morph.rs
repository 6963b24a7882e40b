//! Frame-level morph: two analyzed spectra in, one resynthesizable spectrum out.

use rustfft::num_complex::Complex;

use crate::core::types::MorphParams;
use crate::spectral::blend::{formant_correction, BinSample};
use crate::spectral::phase::{smoothing_coefficient, track_phase};

/// Whether a frame needs the cepstral envelope of both sources.
#[inline]
pub fn needs_envelope(params: &MorphParams) -> bool {
    params.blend_law.uses_envelope()
        || (params.preserve_formants > 0.0 && params.blend_law.accepts_formant_correction())
}

/// Morphs bins `0..=N/2` of two spectra and writes the result over `spectrum_a`.
///
/// For every bin the selected blend law produces a target `(magnitude, phase)`,
/// the formant correction is applied when enabled, and the phase-continuity
/// tracker moves `accumulated_phase[k]` toward the target. The bin is rebuilt
/// from the magnitude and the tracked phase, DC and Nyquist are projected onto
/// the real axis, and bins `N-k` for `0 < k < N/2` are overwritten with the
/// conjugate so the inverse transform is real.
///
/// `envelope_a` / `envelope_b` are read only when [`needs_envelope`] is true.
pub fn morph_spectrum(
    spectrum_a: &mut [Complex<f32>],
    spectrum_b: &[Complex<f32>],
    envelope_a: &[f32],
    envelope_b: &[f32],
    accumulated_phase: &mut [f32],
    params: &MorphParams,
) {
    let n = spectrum_a.len();
    let half = n / 2;
    debug_assert_eq!(spectrum_b.len(), n);
    debug_assert!(accumulated_phase.len() > half);

    let t = params.morph_amount;
    let blend = params.blend_law.kernel();
    let with_envelope = needs_envelope(params);
    let correct = params.preserve_formants > 0.0 && params.blend_law.accepts_formant_correction();
    let coeff = smoothing_coefficient(params.smoothing);

    for k in 0..=half {
        let (env_a, env_b) = if with_envelope {
            (envelope_a[k], envelope_b[k])
        } else {
            (0.0, 0.0)
        };
        let a = BinSample::new(spectrum_a[k].norm(), spectrum_a[k].arg(), env_a);
        let b = BinSample::new(spectrum_b[k].norm(), spectrum_b[k].arg(), env_b);

        let (mut magnitude, phase) = blend(&a, &b, t);
        if correct {
            magnitude = formant_correction(magnitude, env_a, env_b, t, params.preserve_formants);
        }
        if !magnitude.is_finite() {
            magnitude = 0.0;
        }

        let tracked = track_phase(&mut accumulated_phase[k], phase, coeff);
        spectrum_a[k] = if k == 0 || k == half {
            // DC and Nyquist of a real signal have no imaginary part
            Complex::new(magnitude * tracked.cos(), 0.0)
        } else {
            Complex::from_polar(magnitude, tracked)
        };
    }

    for k in 1..half {
        spectrum_a[n - k] = spectrum_a[k].conj();
    }
}
