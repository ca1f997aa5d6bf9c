//! The synthesizer context: voices, shared effects and the sample renderer.
//!
//! [`Synth`] owns everything the signal chain mutates (the voice pool, the
//! delay line, the frame counter) and shares the parameter registry with the
//! control side through an `Arc<SynthParams>`.
//!
//! ## Signal chain
//!
//! ```text
//! per voice:  osc bank | FM graph → × velocity → envelope blend → SVF ─┐
//!                                                                      Σ
//! shared:     distort → + echo tap → delay write → + chorus tap → limiter
//! ```

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::sync::Arc;

use synthone_core::{DelayLine, KeyTable, cosine_lfo, distort};

use crate::fm;
use crate::oscillator::{MAX_OSC_COUNT, MAX_WIDTH, MIN_WIDTH, Waveform};
use crate::params::{OscType, ParamId, SynthParams};
use crate::voice::{NBR_VOICES, VoiceManager};

/// Capacity of the shared delay line in milliseconds.
pub const MAX_DELAY_MS: f32 = 750.0;

/// Lowest filter cutoff in Hz.
pub const MIN_CUTOFF: f32 = 50.0;

/// Highest filter cutoff in Hz, before the Nyquist guard.
pub const MAX_CUTOFF: f32 = 17000.0;

/// Centre of the chorus tap in milliseconds.
pub const CHORUS_CENTER_MS: f32 = 3.0;

/// Swing of the chorus tap around its centre in milliseconds.
pub const CHORUS_DEPTH_MS: f32 = 1.0;

/// Clamp threshold of the final safety limiter.
pub const LIMITER_LEVEL: f32 = 0.999;

/// Fold threshold of the final safety limiter; high enough to never fold.
pub const LIMITER_FLIP: f32 = 100.0;

/// One rendered frame plus the period-sync flag used for bend and visualization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedFrame {
    /// Absolute frame index the sample belongs to.
    pub frame: i64,
    /// Output sample, within ±[`LIMITER_LEVEL`].
    pub sample: f32,
    /// Whether the reference voice had just started a new oscillator period.
    pub new_period: bool,
}

/// Polyphonic synthesizer context.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use synthone_synth::{ParamId, Synth, SynthParams};
///
/// let params = Arc::new(SynthParams::new());
/// params.set(ParamId::OscType, 1.0); // saw
///
/// let mut synth = Synth::new(44100.0, Arc::clone(&params));
/// synth.note_on(40, 1.0);
///
/// let mut block = [0.0f32; 256];
/// synth.render_block(&mut block);
/// assert!(block.iter().any(|s| *s != 0.0));
/// assert_eq!(synth.frame(), 256);
/// ```
#[derive(Debug)]
pub struct Synth {
    params: Arc<SynthParams>,
    voices: VoiceManager,
    delay: DelayLine,
    keys: KeyTable,
    sample_rate: f32,
    frame: i64,
    /// Set once an invalid oscillator or algorithm selection has been reported.
    selection_reported: bool,
}

impl Synth {
    /// Create a synthesizer sharing `params` with the control side.
    pub fn new(sample_rate: f32, params: Arc<SynthParams>) -> Self {
        Self {
            params,
            voices: VoiceManager::new(sample_rate),
            delay: DelayLine::new(sample_rate, MAX_DELAY_MS),
            keys: KeyTable::new(),
            sample_rate,
            frame: 0,
            selection_reported: false,
        }
    }

    /// Shared parameter registry.
    pub fn params(&self) -> &Arc<SynthParams> {
        &self.params
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Index of the next frame to be rendered.
    pub fn frame(&self) -> i64 {
        self.frame
    }

    /// Voice pool.
    pub fn voices(&self) -> &VoiceManager {
        &self.voices
    }

    /// Key frequency table.
    pub fn key_table(&self) -> &KeyTable {
        &self.keys
    }

    /// Current pitch-bend multiplier.
    pub fn bend(&self) -> f32 {
        self.voices.bend()
    }

    /// Start `key` at the current frame.
    pub fn note_on(&mut self, key: u8, velocity: f32) -> Option<usize> {
        let slot = self.voices.note_on(key, velocity, self.frame);
        #[cfg(feature = "tracing")]
        if let Some(slot) = slot {
            tracing::debug!(key, slot, frame = self.frame, "note on");
        }
        slot
    }

    /// Release `key` at the current frame.
    pub fn note_off(&mut self, key: u8) -> Option<usize> {
        self.voices.note_off(key, self.frame)
    }

    /// Release `off_key`, then press `on_key`. Key 0 means "none" on either side.
    pub fn note_change(&mut self, on_key: u8, off_key: u8) {
        if off_key != 0 {
            self.note_off(off_key);
        }
        if on_key != 0 {
            self.note_on(on_key, 1.0);
        }
    }

    /// Release every held key.
    pub fn all_notes_off(&mut self) {
        self.voices.all_notes_off(self.frame);
    }

    /// Index of the held voice with the lowest key.
    pub fn lowest_held_voice(&self) -> Option<usize> {
        self.voices.lowest_held_voice()
    }

    /// Key of the held voice with the lowest key.
    pub fn lowest_held_key(&self) -> Option<u8> {
        self.lowest_held_voice()
            .map(|i| self.voices.voices()[i].key())
    }

    /// Render one frame and advance the frame counter.
    ///
    /// `reference` is the voice whose oscillator period drives bend stepping
    /// (normally [`lowest_held_voice`](Self::lowest_held_voice), captured once
    /// per batch). With no reference every frame counts as a new period, and
    /// so does every frame while the bend is 0 and no oscillator moves.
    pub fn render_frame(&mut self, reference: Option<usize>) -> RenderedFrame {
        let new_period = self.voices.bend() == 0.0
            || reference.is_none_or(|i| self.voices.voices()[i].oscillators().period_wrapped());

        let frame = self.frame;
        let sample = self.render_sample();

        if new_period {
            self.voices.advance_bend(self.params.get(ParamId::Bend));
        }
        self.frame += 1;

        RenderedFrame {
            frame,
            sample,
            new_period,
        }
    }

    /// Fill `out` with consecutive frames.
    pub fn render_block(&mut self, out: &mut [f32]) {
        let reference = self.lowest_held_voice();
        for sample in out.iter_mut() {
            *sample = self.render_frame(reference).sample;
        }
    }

    /// Compute the output sample for the current frame.
    ///
    /// Does not advance the frame counter.
    pub fn render_sample(&mut self) -> f32 {
        let osc_index = self.params.get_index(ParamId::OscType);
        let algorithm_index = self.params.get_index(ParamId::FmAlgorithm);
        self.render_selection(osc_index, algorithm_index)
    }

    /// Render the current frame with an explicit oscillator and FM algorithm
    /// selection. The registry clamps both to valid indices; anything else
    /// silences the voices and is reported once until a valid frame follows.
    fn render_selection(&mut self, osc_index: usize, algorithm_index: usize) -> f32 {
        let p = &*self.params;
        let frame = self.frame;
        let sr = self.sample_rate;

        let gain = p.get(ParamId::Gain) / NBR_VOICES as f32;
        let osc_type = OscType::from_index(osc_index);
        let osc_count = p.get_index(ParamId::OscCount).clamp(1, MAX_OSC_COUNT);
        let detune = p.get(ParamId::DetuneCents);
        let env_to_amp = p.get(ParamId::EnvToAmp);
        let adsr = p.envelope();

        let width = (p.get(ParamId::PulseWidth)
            + p.get(ParamId::PwmAmount) * cosine_lfo(frame, sr, p.get(ParamId::PwmFreq)))
        .clamp(MIN_WIDTH, MAX_WIDTH);

        let cutoff = p.get(ParamId::Cutoff);
        let resonance = p.get(ParamId::Resonance);
        let env_to_cutoff = p.get(ParamId::EnvToCutoff);
        let key_to_cutoff = p.get(ParamId::KeyToCutoff);
        let cutoff_lfo =
            p.get(ParamId::CutoffLfoAmp) * cosine_lfo(frame, sr, p.get(ParamId::CutoffLfoFreq));
        let max_cutoff = MAX_CUTOFF.min(0.45 * sr);

        let algorithm = match osc_type {
            Some(OscType::Fm) => fm::algorithm(algorithm_index),
            _ => None,
        };
        let fm_ops = if algorithm.is_some() {
            p.fm_operators()
        } else {
            fm::FmOperators::default()
        };

        let bend = self.voices.bend();
        let mut invalid_selection = false;
        let mut mix = 0.0;

        for voice in self.voices.voices_mut().iter_mut() {
            if !voice.is_active() {
                continue;
            }

            let key_freq = self.keys.frequency(voice.key(), 0.0);
            let freq = key_freq * bend;

            let raw = match (osc_type, algorithm) {
                (Some(OscType::Pulse), _) => voice.bank.render(
                    Waveform::Pulse { width },
                    freq,
                    osc_count,
                    detune,
                    sr,
                ),
                (Some(OscType::Saw), _) => {
                    voice
                        .bank
                        .render(Waveform::Saw, freq, osc_count, detune, sr)
                }
                (Some(OscType::Fm), Some(alg)) => {
                    // Keeps oscillator 0 running for period sync
                    voice.bank.advance(0, freq, sr);
                    alg.render(&mut voice.fm, &fm_ops, freq, frame, sr)
                }
                _ => {
                    invalid_selection = true;
                    0.0
                }
            };
            let raw = gain * voice.velocity() * raw;

            let level = voice.env.evaluate(&adsr, frame);
            let shaped = raw * (1.0 - env_to_amp) + raw * env_to_amp * level;

            let voice_cutoff = (key_to_cutoff * key_freq + cutoff + env_to_cutoff * level + cutoff_lfo)
                .clamp(MIN_CUTOFF, max_cutoff);
            voice.filter.configure(voice_cutoff, resonance, sr);
            mix += voice.filter.process(shaped);
        }

        if invalid_selection {
            self.report_invalid_selection();
        } else {
            self.selection_reported = false;
        }

        let p = &*self.params;
        let mut sample = distort(
            mix,
            p.get(ParamId::DistThreshold),
            p.get(ParamId::FlipThreshold),
        );

        sample += p.get(ParamId::DelayFeedback) * self.delay.read(p.get(ParamId::DelayMs));
        self.delay.write(sample);

        let chorus_ms =
            CHORUS_CENTER_MS + CHORUS_DEPTH_MS * cosine_lfo(frame, sr, p.get(ParamId::ChorusFreq));
        sample += p.get(ParamId::ChorusAmount) * self.delay.read(chorus_ms);

        distort(sample, LIMITER_LEVEL, LIMITER_FLIP)
    }

    fn report_invalid_selection(&mut self) {
        if self.selection_reported {
            return;
        }
        self.selection_reported = true;
        #[cfg(feature = "tracing")]
        tracing::warn!(
            osc_type = self.params.get(ParamId::OscType),
            algorithm = self.params.get(ParamId::FmAlgorithm),
            "invalid oscillator or FM algorithm selection, rendering silence"
        );
    }

    /// Return voices, delay line and frame counter to their initial state.
    pub fn reset(&mut self) {
        self.voices.reset();
        self.delay.clear();
        self.frame = 0;
        self.selection_reported = false;
    }
}
