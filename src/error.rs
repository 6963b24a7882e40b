//! Error types for the spectral-morph crate.

use thiserror::Error;

/// Errors that can occur while configuring or driving the morph engine.
///
/// Everything here is raised at configuration time or before a block is
/// touched; numerical trouble inside the render path is bounded silently and
/// never reported as an error.
#[derive(Debug, Error)]
pub enum MorphError {
    /// Transform length is not a power of two (or is smaller than 2).
    #[error("transform length must be a power of two >= 2, got {0}")]
    InvalidTransformLength(usize),
    /// Channel count is zero.
    #[error("invalid channel count: {0}")]
    InvalidChannels(u16),
    /// Sample rate is zero.
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(u32),
    /// A knob is outside its allowed range or not finite.
    #[error("parameter `{name}` out of range: {value}")]
    InvalidParameter { name: &'static str, value: f32 },
    /// Block buffers handed to the render call disagree in length.
    #[error("block size mismatch: expected {expected} samples, got {provided}")]
    BlockSizeMismatch { expected: usize, provided: usize },
    /// A looped secondary buffer must hold at least one frame.
    #[error("looped secondary buffer holds no complete frame")]
    EmptyLoopBuffer,
    /// Offline input contains NaN or infinite samples.
    #[error("input contains NaN or infinite samples")]
    NonFiniteInput,
    /// Invalid audio format, preset contents or mismatched buffers.
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<hound::Error> for MorphError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => MorphError::Io(e),
            other => MorphError::InvalidFormat(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            MorphError::InvalidTransformLength(1000).to_string(),
            "transform length must be a power of two >= 2, got 1000"
        );
        assert_eq!(
            MorphError::BlockSizeMismatch {
                expected: 512,
                provided: 256
            }
            .to_string(),
            "block size mismatch: expected 512 samples, got 256"
        );
        let err = MorphError::InvalidParameter {
            name: "morph_amount",
            value: 1.5,
        };
        assert!(err.to_string().contains("morph_amount"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: MorphError = io.into();
        assert!(matches!(err, MorphError::Io(_)));
    }
}
