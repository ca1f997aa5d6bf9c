//! Voice pool and allocation.
//!
//! A fixed pool of [`NBR_VOICES`] voices is created once and never resized.
//! Voices are only reassigned: a note-on claims the voice that has been
//! released the longest, or, if every voice is held, the one pressed the
//! longest ago.
//!
//! ## Frame markers
//!
//! Each voice carries two absolute frame counters. Exactly one of them is
//! [`NEVER`] at any time, marking the open phase:
//!
//! | State | `pressed` | `released` |
//! |-------|-----------|------------|
//! | Held | frame of note-on | `NEVER` |
//! | Released | `NEVER` | frame of note-off |
//!
//! Fresh voices start with both markers at 0, which sorts them ahead of any
//! voice released later.

use synthone_core::{Envelope, GlideParam, LowPassSvf};

use crate::fm::FmState;
use crate::oscillator::OscillatorBank;

/// Number of voices in the pool.
pub const NBR_VOICES: usize = 8;

/// Highest key accepted by [`VoiceManager::note_on`].
pub const MAX_KEY: u8 = 0x53;

/// Frame marker for a phase that has not ended.
pub const NEVER: i64 = i64::MAX;

/// Pitch bend change per oscillator period.
pub const BEND_STEP: f32 = 0.001;

/// A single voice: key, frame markers and per-voice DSP state.
#[derive(Debug, Clone)]
pub struct Voice {
    key: u8,
    pressed: i64,
    released: i64,
    velocity: f32,
    pub(crate) bank: OscillatorBank,
    pub(crate) env: Envelope,
    pub(crate) filter: LowPassSvf,
    pub(crate) fm: FmState,
}

impl Voice {
    /// Create an inactive voice.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            key: 0,
            pressed: 0,
            released: 0,
            velocity: 1.0,
            bank: OscillatorBank::new(),
            env: Envelope::new(sample_rate),
            filter: LowPassSvf::new(sample_rate),
            fm: FmState::new(),
        }
    }

    /// Key assigned to this voice; 0 when the voice has never been used.
    pub fn key(&self) -> u8 {
        self.key
    }

    /// Whether a key is assigned.
    pub fn is_active(&self) -> bool {
        self.key != 0
    }

    /// Whether the key is currently held down.
    pub fn is_held(&self) -> bool {
        self.key != 0 && self.pressed < self.released
    }

    /// Frame of the latest note-on, or [`NEVER`] after a note-off.
    pub fn pressed(&self) -> i64 {
        self.pressed
    }

    /// Frame of the latest note-off, or [`NEVER`] while held.
    pub fn released(&self) -> i64 {
        self.released
    }

    /// Velocity of the latest note-on, 0.0 to 1.0.
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Oscillator phases.
    pub fn oscillators(&self) -> &OscillatorBank {
        &self.bank
    }

    /// Amplitude envelope.
    pub fn envelope(&self) -> &Envelope {
        &self.env
    }

    /// Low-pass filter.
    pub fn filter(&self) -> &LowPassSvf {
        &self.filter
    }

    /// Cached FM operator outputs.
    pub fn fm_state(&self) -> &FmState {
        &self.fm
    }

    fn start(&mut self, key: u8, velocity: f32, frame: i64) {
        self.env.start(frame);
        self.key = key;
        self.velocity = velocity;
        self.pressed = frame;
        self.released = NEVER;
    }

    fn stop(&mut self, frame: i64) {
        self.env.release(frame);
        self.released = frame;
        self.pressed = NEVER;
    }

    fn reset(&mut self) {
        self.key = 0;
        self.pressed = 0;
        self.released = 0;
        self.velocity = 1.0;
        self.bank.reset();
        self.env.reset();
        self.filter.reset();
        self.fm.reset();
    }
}

/// Owns the voice pool and the pitch-bend glide.
///
/// # Example
///
/// ```rust
/// use synthone_synth::VoiceManager;
///
/// let mut voices = VoiceManager::new(44100.0);
/// let slot = voices.note_on(40, 1.0, 0);
/// assert!(slot.is_some());
///
/// // Same key while held is a no-op
/// assert_eq!(voices.note_on(40, 1.0, 5), None);
///
/// voices.note_off(40, 10);
/// assert_eq!(voices.held_voice_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct VoiceManager {
    voices: [Voice; NBR_VOICES],
    bend: GlideParam,
}

impl VoiceManager {
    /// Create a pool of inactive voices.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            voices: core::array::from_fn(|_| Voice::new(sample_rate)),
            bend: GlideParam::new(1.0, BEND_STEP),
        }
    }

    /// Start `key` at `frame`, returning the index of the voice used.
    ///
    /// Velocity is clamped to [0, 1]; a non-finite velocity plays at 1.0.
    /// Returns `None` when the key is out of range or already held.
    pub fn note_on(&mut self, key: u8, velocity: f32, frame: i64) -> Option<usize> {
        if key == 0 || key > MAX_KEY {
            return None;
        }

        let index = match self.voices.iter().position(|v| v.key == key) {
            Some(i) if self.voices[i].is_held() => return None,
            // Released: re-trigger in place
            Some(i) => i,
            None => self.steal_candidate(),
        };

        // NaN would reach the shared delay line and never leave it
        let velocity = if velocity.is_finite() {
            velocity.clamp(0.0, 1.0)
        } else {
            1.0
        };
        self.voices[index].start(key, velocity, frame);
        Some(index)
    }

    /// Release `key` at `frame`, returning the index of the voice released.
    ///
    /// A note-off in the same frame as its note-on is ignored.
    pub fn note_off(&mut self, key: u8, frame: i64) -> Option<usize> {
        let index = self
            .voices
            .iter()
            .position(|v| v.key == key && v.key != 0 && v.pressed < frame)?;
        self.voices[index].stop(frame);
        Some(index)
    }

    /// Release every held voice.
    pub fn all_notes_off(&mut self, frame: i64) {
        for voice in &mut self.voices {
            if voice.is_held() && voice.pressed < frame {
                voice.stop(frame);
            }
        }
    }

    /// Voice released longest ago, ties broken by the one pressed longest ago.
    fn steal_candidate(&self) -> usize {
        self.voices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| (v.released, v.pressed))
            .map_or(0, |(i, _)| i)
    }

    /// Index of the held voice with the lowest key.
    pub fn lowest_held_voice(&self) -> Option<usize> {
        self.voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_held())
            .min_by_key(|(_, v)| v.key)
            .map(|(i, _)| i)
    }

    /// Step the bend multiplier one [`BEND_STEP`] toward `target`.
    pub fn advance_bend(&mut self, target: f32) -> f32 {
        self.bend.set_target(target);
        self.bend.advance()
    }

    /// Current bend multiplier.
    pub fn bend(&self) -> f32 {
        self.bend.get()
    }

    /// All voices.
    pub fn voices(&self) -> &[Voice; NBR_VOICES] {
        &self.voices
    }

    /// All voices, mutably.
    pub fn voices_mut(&mut self) -> &mut [Voice; NBR_VOICES] {
        &mut self.voices
    }

    /// Number of voices with an assigned key.
    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    /// Number of voices whose key is held.
    pub fn held_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_held()).count()
    }

    /// Return every voice to its initial state and the bend to 1.0.
    pub fn reset(&mut self) {
        for voice in &mut self.voices {
            voice.reset();
        }
        self.bend.set_immediate(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44100.0;

    #[test]
    fn test_rejects_out_of_range_keys() {
        let mut mgr = VoiceManager::new(SR);
        assert_eq!(mgr.note_on(0, 1.0, 0), None);
        assert_eq!(mgr.note_on(MAX_KEY + 1, 1.0, 0), None);
        assert!(mgr.note_on(MAX_KEY, 1.0, 0).is_some());
    }

    #[test]
    fn test_fills_idle_voices_in_order() {
        let mut mgr = VoiceManager::new(SR);
        for (frame, key) in (10..18).enumerate() {
            assert_eq!(mgr.note_on(key, 1.0, frame as i64), Some(frame));
        }
        assert_eq!(mgr.held_voice_count(), NBR_VOICES);
    }

    #[test]
    fn test_non_finite_velocity_plays_at_full_level() {
        let mut mgr = VoiceManager::new(SR);
        mgr.note_on(20, f32::NAN, 0);
        mgr.note_on(21, f32::INFINITY, 0);
        mgr.note_on(22, 3.0, 0);
        mgr.note_on(23, -1.0, 0);
        let velocities: [f32; 4] = core::array::from_fn(|i| mgr.voices()[i].velocity());
        assert_eq!(velocities, [1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_held_key_is_not_retriggered() {
        let mut mgr = VoiceManager::new(SR);
        mgr.note_on(20, 1.0, 0);
        assert_eq!(mgr.note_on(20, 1.0, 100), None);
        assert_eq!(mgr.voices()[0].pressed(), 0);
    }

    #[test]
    fn test_released_key_retriggers_in_place() {
        let mut mgr = VoiceManager::new(SR);
        mgr.note_on(20, 1.0, 0);
        mgr.note_on(21, 1.0, 1);
        mgr.note_off(20, 50);
        assert_eq!(mgr.note_on(20, 0.5, 60), Some(0));
        let voice = &mgr.voices()[0];
        assert!(voice.is_held());
        assert_eq!(voice.pressed(), 60);
        assert_eq!(voice.released(), NEVER);
        assert_eq!(voice.velocity(), 0.5);
    }

    #[test]
    fn test_same_frame_note_off_is_ignored() {
        let mut mgr = VoiceManager::new(SR);
        mgr.note_on(30, 1.0, 100);
        assert_eq!(mgr.note_off(30, 100), None);
        assert!(mgr.voices()[0].is_held());
        assert_eq!(mgr.note_off(30, 101), Some(0));
        assert_eq!(mgr.voices()[0].pressed(), NEVER);
    }

    #[test]
    fn test_lowest_held_voice() {
        let mut mgr = VoiceManager::new(SR);
        assert_eq!(mgr.lowest_held_voice(), None);
        mgr.note_on(30, 1.0, 0);
        mgr.note_on(25, 1.0, 1);
        mgr.note_on(40, 1.0, 2);
        assert_eq!(mgr.lowest_held_voice(), Some(1));
        mgr.note_off(25, 10);
        assert_eq!(mgr.lowest_held_voice(), Some(0));
    }

    #[test]
    fn test_bend_glide() {
        let mut mgr = VoiceManager::new(SR);
        mgr.advance_bend(1.5);
        assert!((mgr.bend() - 1.001).abs() < 1e-6);
        mgr.advance_bend(1.0);
        assert_eq!(mgr.bend(), 1.0);
    }

    #[test]
    fn test_reset() {
        let mut mgr = VoiceManager::new(SR);
        mgr.note_on(30, 1.0, 0);
        mgr.advance_bend(2.0);
        mgr.reset();
        assert_eq!(mgr.active_voice_count(), 0);
        assert_eq!(mgr.bend(), 1.0);
    }
}
