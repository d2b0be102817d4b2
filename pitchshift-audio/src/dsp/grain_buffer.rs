//! Circular history of recent input samples that grains are cut from.
//!
//! The ring is an inline arena sized at compile time. Writes only move
//! forward and overwrite the oldest sample once the ring is full. Every read
//! is addressed by its distance behind the newest sample and clamped to the
//! retained history, so a read can never reach a sample that was not written
//! yet or that has already been overwritten.

/// Fixed-capacity sample ring. `N` is the capacity in samples.
pub struct GrainBuffer<const N: usize> {
    samples: [i16; N],
    /// Index the next sample will be written to.
    write_pos: usize,
    /// Number of valid samples, saturating at `N`.
    filled: usize,
}

impl<const N: usize> GrainBuffer<N> {
    pub const fn new() -> Self {
        assert!(N >= 2, "grain buffer needs at least 2 samples");
        GrainBuffer {
            samples: [0; N],
            write_pos: 0,
            filled: 0,
        }
    }

    /// Append one sample, overwriting the oldest when full.
    #[inline]
    pub fn write(&mut self, sample: i16) {
        self.samples[self.write_pos] = sample;
        self.write_pos += 1;
        if self.write_pos == N {
            self.write_pos = 0;
        }
        if self.filled < N {
            self.filled += 1;
        }
    }

    /// Append a run of samples in order.
    pub fn write_block(&mut self, block: &[i16]) {
        for &s in block {
            self.write(s);
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// How many samples of history are currently retained.
    pub fn fill_level(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Ring index of the sample `delay` places behind the newest (0 = newest).
    #[inline(always)]
    fn index_back(&self, delay: usize) -> usize {
        (self.write_pos + N - 1 - delay) % N
    }

    /// Sample `delay` places behind the newest, clamped to the oldest retained.
    ///
    /// Returns 0 while nothing has been written.
    #[inline]
    pub fn tap(&self, delay: usize) -> i16 {
        if self.filled == 0 {
            return 0;
        }
        let delay = delay.min(self.filled - 1);
        self.samples[self.index_back(delay)]
    }

    /// Linearly interpolated sample at a fractional distance behind the newest.
    ///
    /// Negative and NaN delays read the newest sample; delays past the
    /// retained history read the oldest.
    #[inline]
    pub fn interpolate(&self, delay: f32) -> f32 {
        if self.filled == 0 {
            return 0.0;
        }
        let max = (self.filled - 1) as f32;
        let delay = if !(delay > 0.0) {
            0.0
        } else if delay > max {
            max
        } else {
            delay
        };
        let whole = delay as usize;
        let frac = delay - whole as f32;
        let near = self.tap(whole) as f32;
        if frac == 0.0 {
            return near;
        }
        let far = self.tap(whole + 1) as f32;
        near + (far - near) * frac
    }

    /// Copy the grain that ends `delay` samples behind the newest into `out`,
    /// oldest sample first.
    ///
    /// The window is shortened so it never starts before the oldest retained
    /// sample. Returns the number of samples written to the front of `out`;
    /// 0 when `delay` itself lies outside the history.
    pub fn read_grain(&self, delay: usize, out: &mut [i16]) -> usize {
        if delay >= self.filled {
            return 0;
        }
        let len = out.len().min(self.filled - delay);
        for (k, slot) in out[..len].iter_mut().enumerate() {
            *slot = self.samples[self.index_back(delay + len - 1 - k)];
        }
        len
    }
}

impl<const N: usize> Default for GrainBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
