//! Secondary-stream sources for the streaming engine.
//!
//! The engine takes its second input from exactly one of these at a time.
//! Configuring a new one replaces the old one.

use crate::core::ring_buffer::SampleFifo;
use crate::error::MorphError;

/// A pull-based producer of interleaved secondary audio.
///
/// Called once per render block from the audio thread, so implementations
/// should not block or allocate.
pub trait StreamingSource: Send {
    /// Fills `out` (interleaved, `channels` samples per frame) with the next
    /// block of audio.
    fn pull(&mut self, out: &mut [f32], channels: usize);
}

impl<F> StreamingSource for F
where
    F: FnMut(&mut [f32], usize) + Send,
{
    fn pull(&mut self, out: &mut [f32], channels: usize) {
        self(out, channels)
    }
}

/// Where the secondary stream comes from.
#[derive(Default)]
pub enum SecondarySource {
    /// No secondary: the engine passes the primary through.
    #[default]
    None,
    /// Pulled from a caller-supplied producer each block.
    Streaming(Box<dyn StreamingSource>),
    /// A pre-loaded interleaved buffer replayed by modulo indexing.
    Looped { samples: Vec<f32>, position: usize },
    /// Chunks pushed by the caller, queued until consumed.
    Pushed(SampleFifo),
}

impl SecondarySource {
    /// Builds a looped source from interleaved samples.
    ///
    /// Trailing samples that do not form a whole frame are dropped.
    pub fn looped(mut samples: Vec<f32>, channels: usize) -> Result<Self, MorphError> {
        let channels = channels.max(1);
        let frames = samples.len() / channels;
        if frames == 0 {
            return Err(MorphError::EmptyLoopBuffer);
        }
        samples.truncate(frames * channels);
        for s in samples.iter_mut() {
            if !s.is_finite() {
                *s = 0.0;
            }
        }
        Ok(SecondarySource::Looped {
            samples,
            position: 0,
        })
    }

    /// An empty pushed-chunk queue holding at most `capacity` samples.
    pub fn pushed(capacity: usize) -> Self {
        SecondarySource::Pushed(SampleFifo::with_capacity(capacity))
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, SecondarySource::None)
    }

    /// Short label for log messages.
    pub fn kind(&self) -> &'static str {
        match self {
            SecondarySource::None => "none",
            SecondarySource::Streaming(_) => "streaming",
            SecondarySource::Looped { .. } => "looped",
            SecondarySource::Pushed(_) => "pushed",
        }
    }

    /// Fills `out` with the next block of secondary audio.
    ///
    /// `None` yields silence; a pushed queue pads an underrun with silence.
    pub fn fill(&mut self, out: &mut [f32], channels: usize) {
        match self {
            SecondarySource::None => out.fill(0.0),
            SecondarySource::Streaming(source) => source.pull(out, channels),
            SecondarySource::Looped { samples, position } => {
                let len = samples.len();
                for s in out.iter_mut() {
                    *s = samples[*position];
                    *position += 1;
                    if *position == len {
                        *position = 0;
                    }
                }
            }
            SecondarySource::Pushed(queue) => {
                queue.pop_into(out);
            }
        }
    }

    /// Rewinds a loop to its start and drops anything queued.
    pub fn rewind(&mut self) {
        match self {
            SecondarySource::Looped { position, .. } => *position = 0,
            SecondarySource::Pushed(queue) => queue.clear(),
            SecondarySource::None | SecondarySource::Streaming(_) => {}
        }
    }
}

impl std::fmt::Debug for SecondarySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecondarySource::Looped { samples, position } => f
                .debug_struct("Looped")
                .field("len", &samples.len())
                .field("position", position)
                .finish(),
            SecondarySource::Pushed(queue) => f
                .debug_struct("Pushed")
                .field("queued", &queue.len())
                .field("capacity", &queue.capacity())
                .finish(),
            other => f.write_str(other.kind()),
        }
    }
}
