//! Frame-level spectral processing: analysis history, envelope, blend laws,
//! phase continuity and overlap-add resynthesis.

pub mod blend;
pub mod envelope;
pub mod frame_buffer;
pub mod morph;
pub mod phase;
pub mod resynth;

pub use blend::{formant_correction, BinSample, BlendFn};
pub use envelope::{extract_envelope, fine_structure, lifter_cutoff};
pub use frame_buffer::DualFrameBuffer;
pub use morph::{morph_spectrum, needs_envelope};
pub use phase::{shortest_arc, smoothing_coefficient, track_phase, wrap_phase};
pub use resynth::{overlap_add, take_sample};
