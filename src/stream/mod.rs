//! Streaming engine and its secondary-stream sources.

pub mod processor;
pub mod source;

pub use processor::SpectralMorpher;
pub use source::{SecondarySource, StreamingSource};
