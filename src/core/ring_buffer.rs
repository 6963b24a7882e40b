//! Fixed-capacity sample FIFO for externally pushed secondary audio.

/// Fixed-capacity FIFO of interleaved samples.
///
/// Capacity is fixed at construction; pushing never allocates and popping
/// from an empty queue yields silence instead of failing, so the render path
/// can drain it unconditionally.
#[derive(Debug, Clone)]
pub struct SampleFifo {
    data: Vec<f32>,
    head: usize,
    len: usize,
}

impl SampleFifo {
    /// Creates a queue holding at most `cap` samples.
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            data: vec![0.0; cap],
            head: 0,
            len: 0,
        }
    }

    /// Number of queued samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Remaining free space.
    #[inline]
    pub fn available(&self) -> usize {
        self.capacity() - self.len
    }

    /// Drops everything queued.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Appends as much of `input` as fits and returns how many samples were taken.
    pub fn push_slice(&mut self, input: &[f32]) -> usize {
        let cap = self.capacity();
        let to_push = input.len().min(self.available());
        if to_push == 0 {
            return 0;
        }
        let tail = (self.head + self.len) % cap;
        let first = to_push.min(cap - tail);
        self.data[tail..tail + first].copy_from_slice(&input[..first]);
        let second = to_push - first;
        if second > 0 {
            self.data[..second].copy_from_slice(&input[first..to_push]);
        }
        self.len += to_push;
        to_push
    }

    /// Fills `out` from the front of the queue, padding with zeros on underrun.
    ///
    /// Returns the number of real (non-padded) samples written.
    pub fn pop_into(&mut self, out: &mut [f32]) -> usize {
        let cap = self.capacity();
        let to_pop = out.len().min(self.len);
        if to_pop > 0 {
            let first = to_pop.min(cap - self.head);
            out[..first].copy_from_slice(&self.data[self.head..self.head + first]);
            let second = to_pop - first;
            if second > 0 {
                out[first..to_pop].copy_from_slice(&self.data[..second]);
            }
            self.head = (self.head + to_pop) % cap;
            self.len -= to_pop;
            if self.len == 0 {
                self.head = 0;
            }
        }
        out[to_pop..].fill(0.0);
        to_pop
    }
}
