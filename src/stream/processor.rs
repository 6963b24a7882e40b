use rustfft::num_complex::Complex;

use crate::core::fft::{Radix2Fft, COMPLEX_ZERO};
use crate::core::types::{EngineConfig, MorphParams, Quality};
use crate::core::window::{hann_window, overlap_add_gain};
use crate::error::MorphError;
use crate::spectral::envelope::{extract_envelope, lifter_cutoff};
use crate::spectral::frame_buffer::DualFrameBuffer;
use crate::spectral::morph::{morph_spectrum, needs_envelope};
use crate::spectral::resynth::{overlap_add, take_sample};
use crate::stream::source::{SecondarySource, StreamingSource};

/// Output ring length in transform lengths.
const RING_FACTOR: usize = 4;
/// Pushed-chunk queue capacity in transform lengths (per channel).
const PUSH_QUEUE_FACTOR: usize = 4;

/// Everything sized by the transform length, rebuilt on a quality change.
///
/// Per-channel arrays are flat arenas: channel `c` of an array with stride
/// `s` lives at `c * s .. (c + 1) * s`.
struct EngineState {
    quality: Quality,
    transform_len: usize,
    hop: usize,
    fft: Radix2Fft,
    window: Vec<f32>,
    gain: f32,
    lifter: usize,
    history: DualFrameBuffer,
    spectrum_a: Vec<Complex<f32>>,
    spectrum_b: Vec<Complex<f32>>,
    envelope_a: Vec<f32>,
    envelope_b: Vec<f32>,
    phase: Vec<f32>,
    cepstrum: Vec<Complex<f32>>,
    output: Vec<f32>,
    read_pos: Vec<usize>,
    countdown: Vec<usize>,
}

impl EngineState {
    fn new(quality: Quality, config: EngineConfig) -> Result<Self, MorphError> {
        let n = quality.transform_len();
        let hop = quality.hop_size();
        let bins = n / 2 + 1;
        let channels = config.channels as usize;
        let window = hann_window(n);
        let gain = overlap_add_gain(&window, hop);

        Ok(Self {
            quality,
            transform_len: n,
            hop,
            fft: Radix2Fft::new(n)?,
            window,
            gain,
            lifter: lifter_cutoff(config.sample_rate, n),
            history: DualFrameBuffer::new(channels, 2 * n),
            spectrum_a: vec![COMPLEX_ZERO; channels * n],
            spectrum_b: vec![COMPLEX_ZERO; channels * n],
            envelope_a: vec![0.0; channels * bins],
            envelope_b: vec![0.0; channels * bins],
            phase: vec![0.0; channels * bins],
            cepstrum: vec![COMPLEX_ZERO; n],
            output: vec![0.0; channels * RING_FACTOR * n],
            read_pos: vec![0; channels],
            countdown: vec![0; channels],
        })
    }

    #[inline]
    fn ring_len(&self) -> usize {
        RING_FACTOR * self.transform_len
    }

    fn clear(&mut self) {
        self.history.clear();
        self.spectrum_a.fill(COMPLEX_ZERO);
        self.spectrum_b.fill(COMPLEX_ZERO);
        self.envelope_a.fill(0.0);
        self.envelope_b.fill(0.0);
        self.phase.fill(0.0);
        self.output.fill(0.0);
        self.read_pos.fill(0);
        self.countdown.fill(0);
    }

    /// Runs the per-sample schedule over one interleaved block.
    fn render(
        &mut self,
        primary: &[f32],
        secondary: &[f32],
        out: &mut [f32],
        channels: usize,
        params: &MorphParams,
    ) {
        let frames = primary
            .chunks_exact(channels)
            .zip(secondary.chunks_exact(channels))
            .zip(out.chunks_exact_mut(channels));
        for ((a, b), o) in frames {
            for ch in 0..channels {
                o[ch] = self.step(ch, sanitize(a[ch]), sanitize(b[ch]), params);
            }
        }
    }

    /// Drains one output sample, then feeds one sample of each stream.
    ///
    /// Draining first puts the latency at exactly one transform length: a
    /// frame ending at input sample `s` is added from ring slot `s + 1`.
    #[inline]
    fn step(&mut self, ch: usize, a: f32, b: f32, params: &MorphParams) -> f32 {
        let ring_len = self.ring_len();
        let ring = &mut self.output[ch * ring_len..(ch + 1) * ring_len];
        let sample = take_sample(ring, self.read_pos[ch]);
        self.read_pos[ch] = (self.read_pos[ch] + 1) % ring_len;

        self.history.write(ch, a, b);
        if self.countdown[ch] == 0 {
            self.run_frame(ch, params);
            self.countdown[ch] = self.hop;
        }
        self.countdown[ch] -= 1;

        sample
    }

    /// Analysis, morph and resynthesis of one frame on one channel.
    fn run_frame(&mut self, ch: usize, params: &MorphParams) {
        let n = self.transform_len;
        let bins = n / 2 + 1;
        let ring_len = self.ring_len();

        let spectrum_a = &mut self.spectrum_a[ch * n..(ch + 1) * n];
        let spectrum_b = &mut self.spectrum_b[ch * n..(ch + 1) * n];
        self.history
            .load_windowed(ch, &self.window, spectrum_a, spectrum_b);
        self.fft.forward(spectrum_a);
        self.fft.forward(spectrum_b);

        let envelope_a = &mut self.envelope_a[ch * bins..(ch + 1) * bins];
        let envelope_b = &mut self.envelope_b[ch * bins..(ch + 1) * bins];
        if needs_envelope(params) {
            extract_envelope(&self.fft, spectrum_a, self.lifter, &mut self.cepstrum, envelope_a);
            extract_envelope(&self.fft, spectrum_b, self.lifter, &mut self.cepstrum, envelope_b);
        }

        let phase = &mut self.phase[ch * bins..(ch + 1) * bins];
        morph_spectrum(spectrum_a, spectrum_b, envelope_a, envelope_b, phase, params);

        self.fft.inverse(spectrum_a);
        let ring = &mut self.output[ch * ring_len..(ch + 1) * ring_len];
        overlap_add(ring, self.read_pos[ch], spectrum_a, &self.window, self.gain);
    }
}

/// Input magnitude bound; keeps every FFT sum of a 4096-point frame finite.
const INPUT_LIMIT: f32 = 1.0e6;

/// Maps NaN/Inf to silence and clamps finite samples to `INPUT_LIMIT`.
#[inline]
fn sanitize(sample: f32) -> f32 {
    if sample.is_finite() {
        sample.clamp(-INPUT_LIMIT, INPUT_LIMIT)
    } else {
        0.0
    }
}

/// Block-based streaming spectral morpher.
///
/// Audio is processed sample by sample: every sample of each stream is
/// written to a circular history, every hop a frame of both streams is
/// analyzed, morphed and overlap-added into an output ring, and the output
/// is read back one transform length later.
///
/// # Example
///
/// ```
/// use spectral_morph::{EngineConfig, MorphParams, SpectralMorpher};
///
/// let mut morpher = SpectralMorpher::new(EngineConfig::new(44100, 1), MorphParams::new(0.5)).unwrap();
/// morpher.set_looped_buffer(vec![0.1; 4096]).unwrap();
///
/// let input = vec![0.0f32; 512];
/// let mut output = vec![0.0f32; 512];
/// morpher.process_block(&input, None, &mut output).unwrap();
/// assert_eq!(morpher.latency_samples(), 2048);
/// ```
pub struct SpectralMorpher {
    config: EngineConfig,
    params: MorphParams,
    state: EngineState,
    source: SecondarySource,
    /// Secondary audio for the current block when it comes from `source`.
    scratch: Vec<f32>,
    /// Quality changed since the state was built.
    dirty: bool,
    /// The previous block took the pass-through path.
    was_bypassed: bool,
}

impl SpectralMorpher {
    /// Creates an engine for the given stream layout.
    ///
    /// # Errors
    /// Returns an error if the layout or any knob is out of range.
    pub fn new(config: EngineConfig, params: MorphParams) -> Result<Self, MorphError> {
        config.validate()?;
        params.validate()?;
        let state = EngineState::new(params.quality, config)?;
        log::debug!(
            "spectral morpher: {} Hz, {} ch, {}, hop {}, lifter {}",
            config.sample_rate,
            config.channels,
            params,
            state.hop,
            state.lifter
        );
        Ok(Self {
            config,
            params,
            state,
            source: SecondarySource::None,
            scratch: Vec::new(),
            dirty: false,
            was_bypassed: false,
        })
    }

    /// Renders one block of interleaved audio into `out`.
    ///
    /// `secondary_in`, when given, is used for this block instead of the
    /// configured secondary source. With neither, the primary is copied to
    /// `out` unchanged and without delay.
    ///
    /// Leaving pass-through clears history and the output ring and rewinds
    /// all cursors, so morphing restarts from silence with the full latency.
    ///
    /// Secondary audio from a configured source is staged in a buffer sized
    /// to one transform length of frames when the source is set. A longer
    /// block grows it once, on the render thread.
    ///
    /// # Errors
    /// Returns `MorphError::BlockSizeMismatch` when the buffers disagree in
    /// length or are not a whole number of frames. Nothing is processed then.
    pub fn process_block(
        &mut self,
        primary: &[f32],
        secondary_in: Option<&[f32]>,
        out: &mut [f32],
    ) -> Result<(), MorphError> {
        let channels = self.config.channels as usize;
        let len = primary.len();
        if out.len() != len {
            return Err(MorphError::BlockSizeMismatch {
                expected: len,
                provided: out.len(),
            });
        }
        if len % channels != 0 {
            return Err(MorphError::BlockSizeMismatch {
                expected: len - len % channels,
                provided: len,
            });
        }
        if let Some(secondary) = secondary_in {
            if secondary.len() != len {
                return Err(MorphError::BlockSizeMismatch {
                    expected: len,
                    provided: secondary.len(),
                });
            }
        }

        if self.dirty {
            self.reinitialize()?;
        }

        if secondary_in.is_none() && self.source.is_none() {
            out.copy_from_slice(primary);
            self.was_bypassed = true;
            return Ok(());
        }
        if self.was_bypassed {
            // Leaving pass-through: start again from silence
            self.state.clear();
            self.was_bypassed = false;
        }

        let params = self.params;
        let secondary: &[f32] = match secondary_in {
            Some(secondary) => secondary,
            None => {
                if self.scratch.len() < len {
                    self.scratch.resize(len, 0.0);
                }
                self.source.fill(&mut self.scratch[..len], channels);
                &self.scratch[..len]
            }
        };
        self.state.render(primary, secondary, out, channels, &params);
        Ok(())
    }

    /// Replaces all knobs.
    ///
    /// A quality change takes effect at the start of the next
    /// [`process_block`](Self::process_block), which rebuilds all history.
    pub fn set_params(&mut self, params: MorphParams) -> Result<(), MorphError> {
        params.validate()?;
        if params.quality != self.params.quality {
            log::debug!(
                "quality change pending: {:?} -> {:?}",
                self.params.quality,
                params.quality
            );
        }
        self.dirty = params.quality != self.state.quality;
        self.params = params;
        Ok(())
    }

    /// Set the morph amount, clamped to [0, 1].
    pub fn set_morph_amount(&mut self, amount: f32) {
        self.params = self.params.with_morph_amount(amount);
    }

    /// Select the transform length; applied at the next render call.
    pub fn set_quality(&mut self, quality: Quality) {
        let params = self.params.with_quality(quality);
        if quality != self.params.quality {
            log::debug!("quality change pending: {:?} -> {:?}", self.params.quality, quality);
        }
        self.dirty = quality != self.state.quality;
        self.params = params;
    }

    /// Current knobs.
    pub fn params(&self) -> &MorphParams {
        &self.params
    }

    /// Stream layout this engine was built for.
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Pull the secondary from `source` every block.
    pub fn attach_streaming_source<S>(&mut self, source: S)
    where
        S: StreamingSource + 'static,
    {
        self.replace_source(SecondarySource::Streaming(Box::new(source)));
    }

    /// Loop `samples` (interleaved) as the secondary.
    ///
    /// # Errors
    /// Returns `MorphError::EmptyLoopBuffer` if the buffer holds no whole
    /// frame; the previous source is kept then.
    pub fn set_looped_buffer(&mut self, samples: Vec<f32>) -> Result<(), MorphError> {
        let source = SecondarySource::looped(samples, self.config.channels as usize)?;
        self.replace_source(source);
        Ok(())
    }

    /// Queues `samples[offset..offset + count]` (interleaved) as secondary audio.
    ///
    /// The range is clipped to the slice. Switches to the pushed source if
    /// another one is configured. Samples that do not fit in the queue are
    /// dropped; the return value is the number actually queued.
    pub fn push_chunk(&mut self, samples: &[f32], offset: usize, count: usize) -> usize {
        if !matches!(self.source, SecondarySource::Pushed(_)) {
            self.replace_source(SecondarySource::pushed(self.push_capacity()));
        }
        let start = offset.min(samples.len());
        let end = start.saturating_add(count).min(samples.len());
        let chunk = &samples[start..end];

        let SecondarySource::Pushed(queue) = &mut self.source else {
            return 0;
        };
        let queued = queue.push_slice(chunk);
        if queued < chunk.len() {
            log::warn!(
                "secondary queue full: dropped {} of {} samples",
                chunk.len() - queued,
                chunk.len()
            );
        }
        queued
    }

    /// Removes the secondary source; the engine passes the primary through.
    pub fn clear_secondary(&mut self) {
        self.replace_source(SecondarySource::None);
    }

    /// Whether the next block without an explicit secondary is passed through.
    pub fn is_bypassed(&self) -> bool {
        self.source.is_none()
    }

    /// Clears all history and the output ring, rewinds a looped secondary and
    /// drops queued chunks. Knobs and the source selection are kept.
    ///
    /// Analysis and output cursors go back to zero as they do on
    /// re-initialization, but buffers are reused instead of reallocated.
    pub fn reset(&mut self) {
        self.source.rewind();
        if self.dirty {
            if let Err(e) = self.reinitialize() {
                log::error!("reset failed to rebuild engine state: {}", e);
            }
        } else {
            self.state.clear();
        }
    }

    /// Processing latency in samples per channel: one transform length.
    pub fn latency_samples(&self) -> usize {
        self.params.quality.transform_len()
    }

    /// Processing latency in seconds.
    pub fn latency_secs(&self) -> f64 {
        self.latency_samples() as f64 / self.config.sample_rate as f64
    }

    /// Transform length of the selected quality.
    pub fn transform_len(&self) -> usize {
        self.params.quality.transform_len()
    }

    /// Distance between frames of the selected quality.
    pub fn hop_size(&self) -> usize {
        self.params.quality.hop_size()
    }

    fn push_capacity(&self) -> usize {
        PUSH_QUEUE_FACTOR * self.params.quality.transform_len() * self.config.channels as usize
    }

    fn replace_source(&mut self, source: SecondarySource) {
        log::debug!("secondary source: {} -> {:?}", self.source.kind(), source);
        self.source = source;
        if !self.source.is_none() {
            self.reserve_scratch();
        }
    }

    /// Sizes the staging buffer for blocks of up to one transform length.
    fn reserve_scratch(&mut self) {
        let len = self.state.transform_len * self.config.channels as usize;
        if self.scratch.len() < len {
            self.scratch.resize(len, 0.0);
        }
    }

    fn reinitialize(&mut self) -> Result<(), MorphError> {
        let previous = self.state.transform_len;
        self.state = EngineState::new(self.params.quality, self.config)?;
        self.dirty = false;
        if !self.source.is_none() {
            self.reserve_scratch();
        }
        let capacity = self.push_capacity();
        if let SecondarySource::Pushed(queue) = &self.source {
            if queue.capacity() != capacity {
                self.source = SecondarySource::pushed(capacity);
            }
        }
        log::debug!(
            "engine re-initialized: {} -> {} pt, hop {}",
            previous,
            self.state.transform_len,
            self.state.hop
        );
        Ok(())
    }

    /// Phase-continuity state of every channel, `N/2 + 1` values each.
    #[cfg(test)]
    pub(crate) fn accumulated_phase(&self) -> &[f32] {
        &self.state.phase
    }

    /// Time-domain frame produced by the most recent frame cycle on `channel`,
    /// before the synthesis window.
    #[cfg(test)]
    pub(crate) fn last_frame(&self, channel: usize) -> &[Complex<f32>] {
        let n = self.state.transform_len;
        &self.state.spectrum_a[channel * n..(channel + 1) * n]
    }
}

impl std::fmt::Debug for SpectralMorpher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralMorpher")
            .field("config", &self.config)
            .field("params", &self.params)
            .field("source", &self.source)
            .field("dirty", &self.dirty)
            .finish()
    }
}
