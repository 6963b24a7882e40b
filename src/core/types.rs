use serde::{Deserialize, Serialize};

use crate::error::MorphError;

/// A single audio sample (32-bit float, range -1.0 to 1.0).
pub type Sample = f32;

/// Fixed overlap between consecutive analysis frames.
pub const OVERLAP_FACTOR: usize = 4;

/// Transform length / latency / quality tradeoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Quality {
    /// 1024-point transform.
    Fast,
    /// 2048-point transform.
    #[default]
    Normal,
    /// 4096-point transform.
    HighQuality,
}

impl Quality {
    /// Transform length in samples.
    #[inline]
    pub fn transform_len(self) -> usize {
        match self {
            Quality::Fast => 1024,
            Quality::Normal => 2048,
            Quality::HighQuality => 4096,
        }
    }

    /// Distance between consecutive frames in samples.
    #[inline]
    pub fn hop_size(self) -> usize {
        self.transform_len() / OVERLAP_FACTOR
    }
}

/// How magnitude and phase of the two sources are combined per bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlendLaw {
    /// Linear magnitude, shortest-arc phase.
    #[default]
    Linear,
    /// Linear magnitude, phase switched hard from one source at the midpoint.
    MagnitudeOnly,
    /// Magnitude interpolated in the log domain.
    Logarithmic,
    /// Envelope and fine structure interpolated separately.
    Formant,
}

/// Knobs read by the engine at the start of every render call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphParams {
    /// 0.0 = pure primary, 1.0 = pure secondary.
    pub morph_amount: f32,
    /// Strength of the envelope-preservation correction (0.0 disables it).
    pub preserve_formants: f32,
    /// Phase tracking speed: 0.0 snaps to the target phase, 1.0 follows slowly.
    pub smoothing: f32,
    /// Per-bin combination rule.
    pub blend_law: BlendLaw,
    /// Transform length selection.
    pub quality: Quality,
}

impl Default for MorphParams {
    fn default() -> Self {
        Self {
            morph_amount: 0.5,
            preserve_formants: 0.0,
            smoothing: 0.0,
            blend_law: BlendLaw::Linear,
            quality: Quality::Normal,
        }
    }
}

impl MorphParams {
    /// Creates parameters with the given morph amount and defaults elsewhere.
    pub fn new(morph_amount: f32) -> Self {
        Self::default().with_morph_amount(morph_amount)
    }

    /// Set the morph amount, clamped to [0, 1].
    pub fn with_morph_amount(mut self, amount: f32) -> Self {
        self.morph_amount = clamp_unit(amount);
        self
    }

    /// Set the formant preservation strength, clamped to [0, 1].
    pub fn with_preserve_formants(mut self, strength: f32) -> Self {
        self.preserve_formants = clamp_unit(strength);
        self
    }

    /// Set the phase smoothing amount, clamped to [0, 1].
    pub fn with_smoothing(mut self, smoothing: f32) -> Self {
        self.smoothing = clamp_unit(smoothing);
        self
    }

    /// Set the blend law.
    pub fn with_blend_law(mut self, law: BlendLaw) -> Self {
        self.blend_law = law;
        self
    }

    /// Set the quality (transform length).
    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    /// Validate all knobs.
    ///
    /// Builders clamp, but fields are public and presets are deserialized, so
    /// the engine validates again at configuration time.
    pub fn validate(&self) -> Result<(), MorphError> {
        check_unit("morph_amount", self.morph_amount)?;
        check_unit("preserve_formants", self.preserve_formants)?;
        check_unit("smoothing", self.smoothing)?;
        Ok(())
    }
}

#[inline]
fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn check_unit(name: &'static str, value: f32) -> Result<(), MorphError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(MorphError::InvalidParameter { name, value })
    }
}

impl std::fmt::Display for MorphParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "amount={:.2} law={:?} formants={:.2} smoothing={:.2} quality={:?} ({} pt)",
            self.morph_amount,
            self.blend_law,
            self.preserve_formants,
            self.smoothing,
            self.quality,
            self.quality.transform_len()
        )
    }
}

/// Stream layout fixed for the lifetime of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 1,
        }
    }
}

impl EngineConfig {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Validate the layout.
    pub fn validate(&self) -> Result<(), MorphError> {
        if self.channels == 0 {
            return Err(MorphError::InvalidChannels(self.channels));
        }
        if self.sample_rate == 0 {
            return Err(MorphError::InvalidSampleRate(self.sample_rate));
        }
        Ok(())
    }
}

/// Buffer holding audio samples in interleaved format.
///
/// For mono audio, samples are stored sequentially: `[s0, s1, s2, ...]`
/// For stereo audio, samples are interleaved: `[L0, R0, L1, R1, ...]`
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Raw interleaved sample data.
    pub data: Vec<Sample>,
    /// Number of channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a new audio buffer.
    ///
    /// # Errors
    /// Returns `MorphError::InvalidChannels` if channels is 0 and
    /// `MorphError::InvalidSampleRate` if sample_rate is 0.
    pub fn new(data: Vec<Sample>, channels: u16, sample_rate: u32) -> Result<Self, MorphError> {
        EngineConfig::new(sample_rate, channels).validate()?;
        Ok(Self {
            data,
            channels,
            sample_rate,
        })
    }

    /// Number of frames in the buffer (total samples / channels).
    pub fn num_frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.data.len() / self.channels as usize
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.num_frames() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Layout of this buffer as an engine configuration.
    pub fn config(&self) -> EngineConfig {
        EngineConfig::new(self.sample_rate, self.channels)
    }

    /// Get a single channel's data as a new vector.
    pub fn channel_data(&self, channel: u16) -> Vec<Sample> {
        if channel >= self.channels {
            return Vec::new();
        }
        self.data
            .iter()
            .skip(channel as usize)
            .step_by(self.channels as usize)
            .copied()
            .collect()
    }

    /// Returns a copy with `channels` channels.
    ///
    /// Mono is duplicated to every output channel; otherwise channels are
    /// mapped modulo the source channel count.
    pub fn with_channel_count(&self, channels: u16) -> Result<Self, MorphError> {
        if channels == 0 {
            return Err(MorphError::InvalidChannels(channels));
        }
        if channels == self.channels {
            return Ok(self.clone());
        }
        let src = self.channels as usize;
        let dst = channels as usize;
        let frames = self.num_frames();
        let mut data = Vec::with_capacity(frames * dst);
        for frame in self.data.chunks_exact(src) {
            for ch in 0..dst {
                data.push(frame[ch % src]);
            }
        }
        AudioBuffer::new(data, channels, self.sample_rate)
    }
}
