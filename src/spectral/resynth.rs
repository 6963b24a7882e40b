//! Overlap-add resynthesis into a per-channel output ring.

use rustfft::num_complex::Complex;

/// Adds one windowed, time-domain frame into `ring` starting at `anchor`.
///
/// `frame` holds the inverse transform of the morphed spectrum; only its real
/// part is used. Each sample is multiplied by the synthesis window and `gain`
/// and accumulated (never overwritten), wrapping modulo the ring length.
pub fn overlap_add(
    ring: &mut [f32],
    anchor: usize,
    frame: &[Complex<f32>],
    window: &[f32],
    gain: f32,
) {
    let len = ring.len();
    debug_assert!(window.len() <= len);
    for (i, (c, &w)) in frame.iter().zip(window.iter()).enumerate() {
        let value = c.re * w * gain;
        debug_assert!(value.is_finite(), "non-finite sample entering output ring");
        ring[(anchor + i) % len] += value;
    }
}

/// Takes the sample at `pos` and zeroes the cell so the next frame that
/// overlaps it starts from silence.
#[inline]
pub fn take_sample(ring: &mut [f32], pos: usize) -> f32 {
    std::mem::take(&mut ring[pos])
}
