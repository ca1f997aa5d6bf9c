//! Millisecond-addressed ring buffer shared by echo and chorus.
//!
//! The cursor points at the most recently written sample, so a read with an
//! offset of `n` samples returns the sample written `n` writes ago. Reads are
//! not interpolated: the offset is truncated to whole samples.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

/// Fixed-capacity delay line, initialized to silence.
///
/// Requests beyond the capacity are clamped to the oldest stored sample and
/// flagged as an overrun (reported once per overrun episode when the
/// `tracing` feature is enabled).
///
/// # Example
///
/// ```rust
/// use synthone_core::DelayLine;
///
/// let mut delay = DelayLine::new(1000.0, 100.0); // 100 samples
/// delay.write(1.0);
/// for _ in 0..10 {
///     delay.write(0.0);
/// }
/// assert_eq!(delay.read(10.0), 1.0); // 10 ms == 10 samples at 1 kHz
/// ```
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    /// Index of the last written sample.
    pos: usize,
    sample_rate: f32,
    overrun: bool,
}

impl DelayLine {
    /// Allocate a line holding `max_delay_ms` of audio at `sample_rate`.
    ///
    /// # Panics
    ///
    /// Panics if the resulting capacity is zero samples.
    pub fn new(sample_rate: f32, max_delay_ms: f32) -> Self {
        let len = (sample_rate * max_delay_ms / 1000.0) as usize;
        assert!(len > 0, "Delay size must be > 0");

        Self {
            buffer: vec![0.0; len],
            pos: 0,
            sample_rate,
            overrun: false,
        }
    }

    /// Read the sample written `delay_ms` ago.
    #[inline]
    pub fn read(&mut self, delay_ms: f32) -> f32 {
        let len = self.buffer.len();
        let mut offset = (self.sample_rate * delay_ms / 1000.0) as usize;

        if offset >= len {
            if !self.overrun {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    "delay of {delay_ms} ms exceeds line capacity of {len} samples, clamping"
                );
                self.overrun = true;
            }
            offset = len - 1;
        } else {
            self.overrun = false;
        }

        self.buffer[(self.pos + len - offset) % len]
    }

    /// Advance the cursor and store `sample`.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.pos = (self.pos + 1) % self.buffer.len();
        self.buffer[self.pos] = sample;
    }

    /// Whether the most recent read was clamped.
    pub fn is_overrun(&self) -> bool {
        self.overrun
    }

    /// Capacity in samples.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Longest addressable delay in milliseconds.
    pub fn max_delay_ms(&self) -> f32 {
        (self.buffer.len() - 1) as f32 * 1000.0 / self.sample_rate
    }

    /// Silence the line.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.pos = 0;
        self.overrun = false;
    }
}
