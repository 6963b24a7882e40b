//! Per-channel circular history of the primary and secondary streams.

use rustfft::num_complex::Complex;

/// Circular buffers for two input streams across all channels.
///
/// Storage is one flat arena per stream, channel `c` occupying
/// `c * capacity .. (c + 1) * capacity`. Each channel has one write cursor
/// shared by both streams, since every feed writes one sample to each.
#[derive(Debug, Clone)]
pub struct DualFrameBuffer {
    capacity: usize,
    primary: Vec<f32>,
    secondary: Vec<f32>,
    cursors: Vec<usize>,
}

impl DualFrameBuffer {
    /// Allocates history for `channels` channels, `capacity` samples each.
    pub fn new(channels: usize, capacity: usize) -> Self {
        Self {
            capacity,
            primary: vec![0.0; channels * capacity],
            secondary: vec![0.0; channels * capacity],
            cursors: vec![0; channels],
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.cursors.len()
    }

    /// Write position of `channel` (index of the next sample to be written).
    #[inline]
    pub fn cursor(&self, channel: usize) -> usize {
        self.cursors[channel]
    }

    /// Zeroes all history and rewinds every cursor.
    pub fn clear(&mut self) {
        self.primary.fill(0.0);
        self.secondary.fill(0.0);
        self.cursors.fill(0);
    }

    /// Appends one sample of each stream to `channel`.
    #[inline]
    pub fn write(&mut self, channel: usize, primary: f32, secondary: f32) {
        let base = channel * self.capacity;
        let pos = self.cursors[channel];
        self.primary[base + pos] = primary;
        self.secondary[base + pos] = secondary;
        self.cursors[channel] = (pos + 1) % self.capacity;
    }

    /// Copies the most recent `window.len()` samples of both streams, oldest
    /// first and multiplied by `window`, into complex FFT inputs.
    pub fn load_windowed(
        &self,
        channel: usize,
        window: &[f32],
        out_primary: &mut [Complex<f32>],
        out_secondary: &mut [Complex<f32>],
    ) {
        let len = window.len();
        debug_assert!(len <= self.capacity);
        debug_assert!(out_primary.len() >= len && out_secondary.len() >= len);

        let base = channel * self.capacity;
        let start = (self.cursors[channel] + self.capacity - len) % self.capacity;
        for (i, &w) in window.iter().enumerate() {
            let idx = base + (start + i) % self.capacity;
            out_primary[i] = Complex::new(self.primary[idx] * w, 0.0);
            out_secondary[i] = Complex::new(self.secondary[idx] * w, 0.0);
        }
    }
}
