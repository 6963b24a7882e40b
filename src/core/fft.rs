//! In-place radix-2 complex FFT.
//!
//! Iterative Cooley–Tukey: a bit-reversal permutation followed by butterfly
//! stages of size 2, 4, …, N. Twiddles inside a stage are advanced by
//! multiplying with that stage's root of unity instead of calling `sin`/`cos`
//! per butterfly. Forward and inverse share the same code path; the inverse
//! conjugates the stage roots and scales the result by `1/N`.

use rustfft::num_complex::Complex;

use crate::error::MorphError;

/// Zero-valued complex number, used for buffer initialization.
pub const COMPLEX_ZERO: Complex<f32> = Complex::new(0.0, 0.0);

/// Planned power-of-two transform.
///
/// Holds only immutable tables (swap pairs and per-stage roots), so one plan
/// can serve every channel and both streams of an engine.
#[derive(Debug, Clone)]
pub struct Radix2Fft {
    len: usize,
    /// Index pairs `(i, j)` with `i < j` swapped by the bit-reversal pass.
    swaps: Vec<(u32, u32)>,
    /// Forward root of unity `exp(-2πi / size)` for each stage size 2, 4, …, N.
    stage_roots: Vec<Complex<f64>>,
}

impl Radix2Fft {
    /// Plans a transform of `len` points.
    ///
    /// # Errors
    /// Returns [`MorphError::InvalidTransformLength`] unless `len` is a power
    /// of two of at least 2.
    pub fn new(len: usize) -> Result<Self, MorphError> {
        if len < 2 || !len.is_power_of_two() || len > u32::MAX as usize {
            return Err(MorphError::InvalidTransformLength(len));
        }

        let bits = len.trailing_zeros();
        let mut swaps = Vec::new();
        for i in 0..len {
            let j = reverse_bits(i, bits);
            if i < j {
                swaps.push((i as u32, j as u32));
            }
        }

        let mut stage_roots = Vec::with_capacity(bits as usize);
        let mut size = 2usize;
        while size <= len {
            let angle = -2.0 * std::f64::consts::PI / size as f64;
            stage_roots.push(Complex::from_polar(1.0, angle));
            size <<= 1;
        }

        Ok(Self {
            len,
            swaps,
            stage_roots,
        })
    }

    /// Returns the transform length.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; a plan has at least two points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Transforms `buffer` in place.
    ///
    /// The buffer must hold exactly [`len`](Self::len) samples. When `inverse`
    /// is set the result is divided by N, so a forward/inverse pair is the
    /// identity.
    pub fn transform(&self, buffer: &mut [Complex<f32>], inverse: bool) {
        debug_assert_eq!(buffer.len(), self.len, "FFT buffer length mismatch");
        let n = self.len.min(buffer.len());
        let buffer = &mut buffer[..n];

        for &(i, j) in &self.swaps {
            buffer.swap(i as usize, j as usize);
        }

        let mut size = 2usize;
        for root in &self.stage_roots {
            let root = if inverse { root.conj() } else { *root };
            let half = size / 2;
            for start in (0..n).step_by(size) {
                // f64 twiddle keeps the incremental rotation from drifting at 4096 points
                let mut w = Complex::new(1.0f64, 0.0);
                for k in 0..half {
                    let tw = Complex::new(w.re as f32, w.im as f32);
                    let t = buffer[start + k + half] * tw;
                    let u = buffer[start + k];
                    buffer[start + k] = u + t;
                    buffer[start + k + half] = u - t;
                    w *= root;
                }
            }
            size <<= 1;
        }

        if inverse {
            let scale = 1.0 / n as f32;
            for c in buffer.iter_mut() {
                *c *= scale;
            }
        }
    }

    /// Forward transform.
    #[inline]
    pub fn forward(&self, buffer: &mut [Complex<f32>]) {
        self.transform(buffer, false);
    }

    /// Inverse transform, normalized by `1/N`.
    #[inline]
    pub fn inverse(&self, buffer: &mut [Complex<f32>]) {
        self.transform(buffer, true);
    }
}

#[inline]
fn reverse_bits(value: usize, bits: u32) -> usize {
    if bits == 0 {
        return 0;
    }
    value.reverse_bits() >> (usize::BITS - bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rustfft::FftPlanner;
    use std::f32::consts::PI;

    fn test_signal(len: usize) -> Vec<Complex<f32>> {
        (0..len)
            .map(|i| {
                let t = i as f32 / len as f32;
                Complex::new(
                    (2.0 * PI * 5.0 * t).sin() + 0.3 * (2.0 * PI * 37.0 * t).cos(),
                    0.25 * (2.0 * PI * 11.0 * t).sin(),
                )
            })
            .collect()
    }

    fn max_abs_diff(a: &[Complex<f32>], b: &[Complex<f32>]) -> f32 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).norm())
            .fold(0.0f32, f32::max)
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        assert!(matches!(
            Radix2Fft::new(1000),
            Err(MorphError::InvalidTransformLength(1000))
        ));
        assert!(Radix2Fft::new(0).is_err());
        assert!(Radix2Fft::new(1).is_err());
        assert!(Radix2Fft::new(2).is_ok());
    }

    #[test]
    fn test_bit_reversal() {
        assert_eq!(reverse_bits(1, 3), 4);
        assert_eq!(reverse_bits(3, 3), 6);
        assert_eq!(reverse_bits(6, 3), 3);
        assert_eq!(reverse_bits(0, 10), 0);
    }

    #[test]
    fn test_impulse_is_flat() {
        let fft = Radix2Fft::new(64).unwrap();
        let mut buf = vec![COMPLEX_ZERO; 64];
        buf[0] = Complex::new(1.0, 0.0);
        fft.forward(&mut buf);
        for c in &buf {
            assert!((c.re - 1.0).abs() < 1e-6);
            assert!(c.im.abs() < 1e-6);
        }
    }

    #[test]
    fn test_matches_rustfft_forward() {
        for &len in &[8usize, 256, 2048] {
            let fft = Radix2Fft::new(len).unwrap();
            let mut ours = test_signal(len);
            let mut reference = ours.clone();

            fft.forward(&mut ours);
            FftPlanner::<f32>::new()
                .plan_fft_forward(len)
                .process(&mut reference);

            let peak = reference.iter().map(|c| c.norm()).fold(0.0f32, f32::max);
            let err = max_abs_diff(&ours, &reference);
            assert!(
                err < peak * 1e-4,
                "len {}: max error {} vs peak {}",
                len,
                err,
                peak
            );
        }
    }

    #[test]
    fn test_inverse_matches_scaled_rustfft() {
        let len = 1024;
        let fft = Radix2Fft::new(len).unwrap();
        let mut ours = test_signal(len);
        let mut reference = ours.clone();

        fft.inverse(&mut ours);
        FftPlanner::<f32>::new()
            .plan_fft_inverse(len)
            .process(&mut reference);
        for c in reference.iter_mut() {
            *c /= len as f32;
        }

        assert!(max_abs_diff(&ours, &reference) < 1e-5);
    }

    #[test]
    fn test_round_trip_supported_lengths() {
        for &len in &[1024usize, 2048, 4096] {
            let fft = Radix2Fft::new(len).unwrap();
            let original = test_signal(len);
            let mut buf = original.clone();
            fft.transform(&mut buf, false);
            fft.transform(&mut buf, true);
            let err = max_abs_diff(&buf, &original);
            assert!(err < 1e-4, "len {}: round-trip error {}", len, err);
        }
    }

    #[test]
    fn test_sine_lands_in_expected_bin() {
        let len = 512;
        let fft = Radix2Fft::new(len).unwrap();
        let mut buf: Vec<Complex<f32>> = (0..len)
            .map(|i| Complex::new((2.0 * PI * 12.0 * i as f32 / len as f32).cos(), 0.0))
            .collect();
        fft.forward(&mut buf);
        assert!((buf[12].norm() - len as f32 / 2.0).abs() < 1e-2);
        assert!((buf[len - 12].norm() - len as f32 / 2.0).abs() < 1e-2);
        assert!(buf[40].norm() < 1e-2);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_round_trip(
            samples in proptest::collection::vec((-1.0f32..1.0, -1.0f32..1.0), 1024),
        ) {
            let fft = Radix2Fft::new(1024).unwrap();
            let original: Vec<Complex<f32>> =
                samples.iter().map(|&(re, im)| Complex::new(re, im)).collect();
            let mut buf = original.clone();
            fft.forward(&mut buf);
            fft.inverse(&mut buf);
            prop_assert!(max_abs_diff(&buf, &original) < 1e-4);
        }
    }
}
