#![forbid(unsafe_code)]
//! Pure Rust real-time spectral morphing.
//!
//! `spectral_morph` blends two audio streams in the frequency domain. Both
//! streams are analyzed with a short-time Fourier transform, each bin's
//! magnitude and phase are combined by one of four blend laws, an optional
//! cepstral envelope keeps the formants of the blend in place, and the result
//! is resynthesized by overlap-add. Phase is tracked per bin across frames so
//! that a moving morph amount does not click.
//!
//! # Quick Start
//!
//! ```
//! use spectral_morph::{EngineConfig, MorphParams};
//!
//! // Half a second of 440 Hz and 220 Hz at 44.1 kHz
//! let tone = |freq: f32| -> Vec<f32> {
//!     (0..22050)
//!         .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / 44100.0).sin())
//!         .collect()
//! };
//! let (a, b) = (tone(440.0), tone(220.0));
//!
//! let params = MorphParams::new(0.5);
//! let output = spectral_morph::morph(&a, &b, &params, EngineConfig::new(44100, 1)).unwrap();
//! assert_eq!(output.len(), a.len());
//! ```
//!
//! # Streaming
//!
//! For real-time use, drive a [`SpectralMorpher`] one block at a time:
//!
//! ```
//! use spectral_morph::{BlendLaw, EngineConfig, MorphParams, Quality, SpectralMorpher};
//!
//! let params = MorphParams::new(0.25)
//!     .with_blend_law(BlendLaw::Formant)
//!     .with_quality(Quality::Fast);
//! let mut morpher = SpectralMorpher::new(EngineConfig::new(48000, 2), params).unwrap();
//!
//! let primary = vec![0.0f32; 256 * 2];
//! let secondary = vec![0.0f32; 256 * 2];
//! let mut out = vec![0.0f32; 256 * 2];
//! morpher.process_block(&primary, Some(&secondary), &mut out).unwrap();
//! // morpher.set_morph_amount(0.8) between blocks to move the blend
//! ```

pub mod core;
pub mod error;
pub mod io;
pub mod spectral;
pub mod stream;

pub use crate::core::types::{AudioBuffer, BlendLaw, EngineConfig, MorphParams, Quality, Sample};
pub use error::MorphError;
pub use stream::{SecondarySource, SpectralMorpher, StreamingSource};

/// Frames handed to the engine per call by the offline helpers.
const OFFLINE_BLOCK_FRAMES: usize = 1024;

/// Validates that input is non-empty and contains only finite samples.
///
/// Returns `Ok(false)` if input is empty, `Ok(true)` if input is valid, or
/// `Err` if it contains NaN/Inf.
#[inline]
fn validate_input(input: &[f32]) -> Result<bool, MorphError> {
    if input.is_empty() {
        return Ok(false);
    }
    if input.iter().any(|s| !s.is_finite()) {
        return Err(MorphError::NonFiniteInput);
    }
    Ok(true)
}

/// Morphs two whole interleaved signals.
///
/// The output has the length of `primary` and is aligned with it: the
/// engine's latency is flushed with silence and trimmed from the front. A
/// `secondary` shorter than `primary` is looped; a longer one is cut. An
/// empty `secondary` passes the primary through.
///
/// # Errors
///
/// Returns [`MorphError::NonFiniteInput`] if either signal contains NaN or
/// infinite samples, [`MorphError::BlockSizeMismatch`] if `primary` is not a
/// whole number of frames, and configuration errors from
/// [`SpectralMorpher::new`].
///
/// # Example
///
/// ```
/// use spectral_morph::{BlendLaw, EngineConfig, MorphParams};
///
/// let a: Vec<f32> = (0..8192).map(|i| (i as f32 * 0.05).sin()).collect();
/// let b: Vec<f32> = (0..8192).map(|i| (i as f32 * 0.11).sin()).collect();
/// let params = MorphParams::new(0.7).with_blend_law(BlendLaw::Logarithmic);
/// let out = spectral_morph::morph(&a, &b, &params, EngineConfig::default()).unwrap();
/// assert!(out.iter().all(|s| s.is_finite()));
/// ```
pub fn morph(
    primary: &[f32],
    secondary: &[f32],
    params: &MorphParams,
    config: EngineConfig,
) -> Result<Vec<f32>, MorphError> {
    let mut morpher = SpectralMorpher::new(config, *params)?;
    let has_primary = validate_input(primary)?;
    let has_secondary = validate_input(secondary)?;
    if !has_primary {
        return Ok(vec![]);
    }
    if !has_secondary {
        return Ok(primary.to_vec());
    }

    let channels = config.channels as usize;
    if primary.len() % channels != 0 {
        return Err(MorphError::BlockSizeMismatch {
            expected: primary.len() - primary.len() % channels,
            provided: primary.len(),
        });
    }
    morpher.set_looped_buffer(secondary.to_vec())?;

    let latency = morpher.latency_samples() * channels;
    let mut padded = Vec::with_capacity(primary.len() + latency);
    padded.extend_from_slice(primary);
    padded.resize(primary.len() + latency, 0.0);

    let mut output = vec![0.0; padded.len()];
    let block = OFFLINE_BLOCK_FRAMES * channels;
    for (input, out) in padded.chunks(block).zip(output.chunks_mut(block)) {
        morpher.process_block(input, None, out)?;
    }

    output.drain(..latency);
    Ok(output)
}

/// Morphs two [`AudioBuffer`]s and returns a new `AudioBuffer`.
///
/// The layout of `primary` wins: `secondary` is remapped to its channel
/// count (mono is duplicated) before morphing.
///
/// # Errors
///
/// Returns [`MorphError::InvalidFormat`] if the sample rates differ, plus
/// everything [`morph`] returns.
///
/// # Example
///
/// ```
/// use spectral_morph::{AudioBuffer, MorphParams};
///
/// let a = AudioBuffer::new(vec![0.1; 4096 * 2], 2, 44100).unwrap();
/// let b = AudioBuffer::new(vec![0.2; 4096], 1, 44100).unwrap();
/// let out = spectral_morph::morph_buffers(&a, &b, &MorphParams::new(0.5)).unwrap();
/// assert_eq!(out.channels, 2);
/// assert_eq!(out.num_frames(), 4096);
/// ```
pub fn morph_buffers(
    primary: &AudioBuffer,
    secondary: &AudioBuffer,
    params: &MorphParams,
) -> Result<AudioBuffer, MorphError> {
    if primary.sample_rate != secondary.sample_rate {
        return Err(MorphError::InvalidFormat(format!(
            "sample rate mismatch: {} Hz vs {} Hz",
            primary.sample_rate, secondary.sample_rate
        )));
    }
    let secondary = secondary.with_channel_count(primary.channels)?;
    let data = morph(&primary.data, &secondary.data, params, primary.config())?;
    AudioBuffer::new(data, primary.channels, primary.sample_rate)
}
