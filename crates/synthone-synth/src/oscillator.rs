//! Naive pulse and saw oscillators with unison detune.
//!
//! Each voice owns an [`OscillatorBank`]: up to [`MAX_OSC_COUNT`] phase
//! accumulators that are advanced independently. No band-limiting is applied.

use synthone_core::cents_to_ratio;

/// Maximum number of unison oscillators per voice.
pub const MAX_OSC_COUNT: usize = 4;

/// Narrowest pulse width.
pub const MIN_WIDTH: f32 = 0.01;

/// Widest pulse width.
pub const MAX_WIDTH: f32 = 0.99;

/// Waveform rendered by an [`OscillatorBank`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Waveform {
    /// +1 while the phase is at or below `width`, −1 after it.
    Pulse {
        /// Duty cycle, clamped to [`MIN_WIDTH`]..=[`MAX_WIDTH`].
        width: f32,
    },
    /// Rising ramp, `−1 + 2·phase`.
    Saw,
}

/// Per-voice set of phase accumulators.
///
/// ## Unison
///
/// With `count` oscillators and `detune_step` cents between neighbours,
/// oscillator `i` is offset by:
///
/// ```text
/// (i - (count - 1) / 2) * detune_step   cents
/// ```
///
/// which centres the stack on the base frequency. The summed output is
/// divided by `count`.
///
/// # Example
///
/// ```rust
/// use synthone_synth::{OscillatorBank, Waveform};
///
/// let mut bank = OscillatorBank::new();
/// let first = bank.render(Waveform::Saw, 441.0, 1, 0.0, 44100.0);
/// assert!((first - (-1.0 + 2.0 * 0.01)).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct OscillatorBank {
    phases: [f32; MAX_OSC_COUNT],
    /// Whether oscillator 0 wrapped on its latest advance.
    wrapped: bool,
}

impl OscillatorBank {
    /// Create a bank with every phase at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Render one sample summed over `count` detuned oscillators.
    #[inline]
    pub fn render(
        &mut self,
        waveform: Waveform,
        freq: f32,
        count: usize,
        detune_step: f32,
        sample_rate: f32,
    ) -> f32 {
        let count = count.clamp(1, MAX_OSC_COUNT);
        let center = (count - 1) as f32 / 2.0;
        let mut sum = 0.0;

        for osc in 0..count {
            let offset = (osc as f32 - center) * detune_step;
            let osc_freq = if offset == 0.0 {
                freq
            } else {
                freq * cents_to_ratio(offset)
            };
            let phase = self.advance(osc, osc_freq, sample_rate);
            sum += match waveform {
                Waveform::Pulse { width } => pulse(phase, width),
                Waveform::Saw => saw(phase),
            };
        }

        sum / count as f32
    }

    /// Advance a single oscillator and return its new phase.
    ///
    /// The phase wraps by whole periods in either direction, so negative
    /// frequencies (a negative pitch bend) run the ramp backwards.
    #[inline]
    pub fn advance(&mut self, osc: usize, freq: f32, sample_rate: f32) -> f32 {
        let mut phase = self.phases[osc] + freq / sample_rate;
        let wrapped = !(0.0..1.0).contains(&phase);
        if wrapped {
            phase -= libm::floorf(phase);
            // floorf can round a tiny negative phase up to exactly 1.0
            if phase >= 1.0 {
                phase = 0.0;
            }
        }
        self.phases[osc] = phase;
        if osc == 0 {
            self.wrapped = wrapped;
        }
        phase
    }

    /// Phase of oscillator `osc`, in `[0, 1)`.
    pub fn phase(&self, osc: usize) -> f32 {
        self.phases[osc]
    }

    /// Whether oscillator 0 started a new period on its latest advance.
    pub fn period_wrapped(&self) -> bool {
        self.wrapped
    }

    /// Reset every phase to 0.
    pub fn reset(&mut self) {
        self.phases = [0.0; MAX_OSC_COUNT];
        self.wrapped = false;
    }
}

/// Pulse wave: +1 up to `width`, −1 for the rest of the period.
#[inline]
pub fn pulse(phase: f32, width: f32) -> f32 {
    if phase > width.clamp(MIN_WIDTH, MAX_WIDTH) {
        -1.0
    } else {
        1.0
    }
}

/// Saw wave rising from −1 to +1 over one period.
#[inline]
pub fn saw(phase: f32) -> f32 {
    -1.0 + 2.0 * phase
}
