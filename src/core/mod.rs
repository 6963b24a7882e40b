//! Core types, the FFT kernel, window functions and sample queues.

pub mod fft;
pub mod preset;
pub mod ring_buffer;
pub mod types;
pub mod window;

pub use fft::{Radix2Fft, COMPLEX_ZERO};
pub use preset::{preset_from_json, preset_to_json, read_preset_json, write_preset_json};
pub use ring_buffer::SampleFifo;
pub use types::*;
pub use window::{hann_window, overlap_add_gain};
