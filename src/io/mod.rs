//! Audio file I/O.

pub mod wav;
