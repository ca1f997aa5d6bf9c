//! Waveform sampler for an oscilloscope-style display.
//!
//! The buffer filler offers every rendered frame to a [`Visualizer`]. A
//! window starts on the first frame of a new oscillator period of the lowest
//! held voice, so successive windows line up with the waveform. After that
//! one point is taken every `2 · period / width` frames (at least one frame
//! per point), which spreads roughly two periods across the window. Once the
//! window is full nothing more is written until the consumer takes it.
//!
//! Points are screen coordinates: a sample `s` maps to `height/2 + height/2 · s`.

use synthone_synth::RenderedFrame;

/// Default number of points per window.
pub const DEFAULT_WIDTH: usize = 1024;

/// Default display height the points are scaled to.
pub const DEFAULT_HEIGHT: f32 = 768.0;

/// Fixed-length window of display points.
///
/// # Example
///
/// ```rust
/// use synthone_io::Visualizer;
/// use synthone_synth::RenderedFrame;
///
/// let mut vis = Visualizer::new(4, 100.0);
/// // Nothing is written until a period starts
/// let mid = RenderedFrame { frame: 0, sample: 0.5, new_period: false };
/// assert!(!vis.observe(&mid, 44100.0, 441.0));
///
/// let start = RenderedFrame { frame: 1, sample: 0.5, new_period: true };
/// assert!(vis.observe(&start, 44100.0, 441.0));
/// assert_eq!(vis.points()[0], 75.0);
/// ```
#[derive(Debug, Clone)]
pub struct Visualizer {
    points: Vec<f32>,
    written: usize,
    height: f32,
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl Visualizer {
    /// Create an empty window of `width` points scaled to `height`.
    pub fn new(width: usize, height: f32) -> Self {
        assert!(width > 0, "Visualizer width must be > 0");
        Self {
            points: vec![0.0; width],
            written: 0,
            height,
        }
    }

    /// Number of points per window.
    pub fn width(&self) -> usize {
        self.points.len()
    }

    /// Display height.
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Points written into the current window.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Whether the window is complete and waiting for the consumer.
    pub fn is_full(&self) -> bool {
        self.written == self.points.len()
    }

    /// Points written so far.
    pub fn points(&self) -> &[f32] {
        &self.points[..self.written]
    }

    /// Length of one period of `period_hz` in frames, never less than the
    /// window width.
    ///
    /// A zero or non-finite frequency (a bend of 0) counts as the width.
    pub fn samples_per_period(&self, sample_rate: f32, period_hz: f32) -> usize {
        let width = self.width();
        let hz = period_hz.abs();
        if hz == 0.0 || !hz.is_finite() {
            return width;
        }
        // Float to int casts saturate, so a tiny frequency cannot overflow
        ((sample_rate / hz) as usize).max(width)
    }

    /// Frames between consecutive points for a period of `samples_per_period`.
    pub fn grid_step(&self, samples_per_period: usize) -> usize {
        (samples_per_period.saturating_mul(2) / self.width()).max(1)
    }

    /// Offer one rendered frame; returns whether a point was written.
    ///
    /// `period_hz` is the current frequency of the lowest held key including
    /// bend.
    pub fn observe(&mut self, rendered: &RenderedFrame, sample_rate: f32, period_hz: f32) -> bool {
        if self.is_full() {
            return false;
        }

        let write = if self.written == 0 {
            rendered.new_period
        } else {
            let step = self.grid_step(self.samples_per_period(sample_rate, period_hz));
            rendered.frame.rem_euclid(step as i64) == 0
        };

        if write {
            let half = self.height / 2.0;
            self.points[self.written] = half + half * rendered.sample;
            self.written += 1;
        }
        write
    }

    /// Hand off a full window and start a new one.
    ///
    /// Returns `None` while the window is still filling.
    pub fn take(&mut self) -> Option<Vec<f32>> {
        if !self.is_full() {
            return None;
        }
        let window = self.points.clone();
        self.written = 0;
        Some(window)
    }

    /// Discard the current window.
    pub fn reset(&mut self) {
        self.written = 0;
    }
}
