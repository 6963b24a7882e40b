//! Spectral envelope extraction via real cepstrum.
//!
//! Separates the coarse resonant shape of a spectrum (formants) from its fine
//! harmonic structure. The envelope drives the Formant blend law and the
//! formant-preservation correction applied after the other laws.

use rustfft::num_complex::Complex;

use crate::core::fft::{Radix2Fft, COMPLEX_ZERO};

/// Floor added to magnitudes before taking the log.
pub const LOG_EPSILON: f32 = 1e-10;

/// Number of low-quefrency cepstral coefficients kept on each end.
///
/// `min(sample_rate / 1000 + 4, transform_len / 8)`: one coefficient per kHz of
/// bandwidth plus a small margin, never more than an eighth of the transform.
pub fn lifter_cutoff(sample_rate: u32, transform_len: usize) -> usize {
    let by_rate = sample_rate as usize / 1000 + 4;
    by_rate.min(transform_len / 8).max(1)
}

/// Extracts the spectral envelope of a full complex spectrum.
///
/// 1. `ln(|X[k]| + ε)` over all N bins (the spectrum of a real frame is
///    conjugate-symmetric, so this sequence is real and even)
/// 2. forward FFT to the cepstrum
/// 3. lifter: keep coefficients `0..lifter` and their mirrors, zero the rest
/// 4. inverse FFT back to a smoothed log spectrum
/// 5. exponentiate bins `0..=N/2`
///
/// `cepstrum` is caller-owned scratch of length N; `envelope_out` receives
/// `N/2 + 1` values. Nothing is allocated.
pub fn extract_envelope(
    fft: &Radix2Fft,
    spectrum: &[Complex<f32>],
    lifter: usize,
    cepstrum: &mut [Complex<f32>],
    envelope_out: &mut [f32],
) {
    let n = fft.len();
    debug_assert_eq!(spectrum.len(), n);
    debug_assert_eq!(cepstrum.len(), n);
    debug_assert!(envelope_out.len() > n / 2);

    for (c, x) in cepstrum.iter_mut().zip(spectrum.iter()) {
        *c = Complex::new((x.norm() + LOG_EPSILON).ln(), 0.0);
    }

    fft.forward(cepstrum);

    let keep = lifter.clamp(1, n / 2);
    // Zero quefrencies keep..=n-keep; index 0 and the mirrored 1..keep survive
    for c in cepstrum[keep..=n - keep].iter_mut() {
        *c = COMPLEX_ZERO;
    }

    fft.inverse(cepstrum);

    for (env, c) in envelope_out.iter_mut().zip(cepstrum.iter()).take(n / 2 + 1) {
        *env = c.re.exp();
    }
}

/// Splits a magnitude into fine structure relative to its envelope.
///
/// Returns 0 when the envelope is too small to divide by.
#[inline]
pub fn fine_structure(magnitude: f32, envelope: f32) -> f32 {
    if envelope > LOG_EPSILON {
        magnitude / envelope
    } else {
        0.0
    }
}
