//! Window functions for spectral analysis and resynthesis.
//!
//! The morph engine uses one Hann window for both the analysis and the
//! synthesis stage, so the overlap-add gain depends on the window squared.

use std::f64::consts::PI;

/// Periodic Hann window of `size` points (denominator N).
///
/// Unlike the symmetric form, the squared periodic window sums to a constant
/// under 4x overlap.
pub fn hann_window(size: usize) -> Vec<f32> {
    match size {
        0 => return vec![],
        1 => return vec![1.0],
        _ => {}
    }
    (0..size)
        .map(|i| {
            let x = (2.0 * PI * i as f64) / size as f64;
            (0.5 * (1.0 - x.cos())) as f32
        })
        .collect()
}

/// Gain that makes windowed analysis + windowed synthesis at `hop` an identity.
///
/// Each output sample receives the square of the window from every frame that
/// overlaps it; the returned value is the reciprocal of that sum. For a
/// periodic Hann window at 4x overlap this is `1 / 1.5`.
pub fn overlap_add_gain(window: &[f32], hop: usize) -> f32 {
    if window.is_empty() || hop == 0 {
        return 1.0;
    }
    let energy: f64 = window.iter().map(|&w| (w as f64) * (w as f64)).sum();
    let per_sample = energy / hop as f64;
    if per_sample <= f64::EPSILON {
        return 1.0;
    }
    (1.0 / per_sample) as f32
}
