#![allow(dead_code)]

use std::f32::consts::PI;

use spectral_morph::{MorphError, SpectralMorpher};

pub fn gen_sine(freq_hz: f32, sr: u32, n: usize, amp: f32) -> Vec<f32> {
    (0..n)
        .map(|i| amp * (2.0 * PI * freq_hz * i as f32 / sr as f32).sin())
        .collect()
}

pub fn gen_two_tone(
    freq_a: f32,
    amp_a: f32,
    freq_b: f32,
    amp_b: f32,
    sr: u32,
    n: usize,
) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let t = i as f32 / sr as f32;
            amp_a * (2.0 * PI * freq_a * t).sin() + amp_b * (2.0 * PI * freq_b * t).sin()
        })
        .collect()
}

/// Deterministic pseudo-random noise in [-amp, amp].
pub fn gen_noise(n: usize, amp: f32, seed: u32) -> Vec<f32> {
    let mut state = seed.max(1);
    (0..n)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            amp * (state as f32 / u32::MAX as f32 * 2.0 - 1.0)
        })
        .collect()
}

pub fn interleave(left: &[f32], right: &[f32]) -> Vec<f32> {
    left.iter()
        .zip(right.iter())
        .flat_map(|(&l, &r)| [l, r])
        .collect()
}

pub fn channel(interleaved: &[f32], channels: usize, index: usize) -> Vec<f32> {
    interleaved
        .iter()
        .skip(index)
        .step_by(channels)
        .copied()
        .collect()
}

pub fn windowed_rms(signal: &[f32], start: usize, len: usize) -> f64 {
    let start = start.min(signal.len());
    let end = (start + len).min(signal.len());
    if end <= start {
        return 0.0;
    }
    let sum_sq: f64 = signal[start..end]
        .iter()
        .map(|&s| {
            let v = s as f64;
            v * v
        })
        .sum();
    (sum_sq / (end - start) as f64).sqrt()
}

pub fn energy_at_freq(signal: &[f32], sr: u32, freq_hz: f32) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let mut re = 0.0f64;
    let mut im = 0.0f64;
    for (i, &s) in signal.iter().enumerate() {
        let angle = 2.0 * std::f64::consts::PI * freq_hz as f64 * i as f64 / sr as f64;
        let sv = s as f64;
        re += sv * angle.cos();
        im -= sv * angle.sin();
    }
    (re * re + im * im).sqrt() / signal.len() as f64
}

/// Largest absolute difference between `output[i + delay]` and `reference[i]`.
pub fn max_error_with_delay(reference: &[f32], output: &[f32], delay: usize) -> f32 {
    reference
        .iter()
        .zip(output.iter().skip(delay))
        .map(|(r, o)| (r - o).abs())
        .fold(0.0, f32::max)
}

/// Feeds `primary` (and `secondary`, if given) through `morpher` in blocks of
/// `block` samples and collects the output.
pub fn run_blocks(
    morpher: &mut SpectralMorpher,
    primary: &[f32],
    secondary: Option<&[f32]>,
    block: usize,
) -> Result<Vec<f32>, MorphError> {
    let mut output = vec![0.0; primary.len()];
    let mut pos = 0;
    for chunk in primary.chunks(block.max(1)) {
        let len = chunk.len();
        let side = secondary.map(|s| &s[pos..pos + len]);
        morpher.process_block(chunk, side, &mut output[pos..pos + len])?;
        pos += len;
    }
    Ok(output)
}
