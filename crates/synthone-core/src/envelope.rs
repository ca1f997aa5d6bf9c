//! Frame-counter driven ADSR envelope.
//!
//! The envelope does not advance sample by sample. It stores two absolute
//! frame markers and evaluates its level as a pure function of the current
//! frame, the markers, and the ADSR settings:
//!
//! ```text
//!  1.0 ┤    /\
//!      │   /  \______________ S
//!      │  /                  \
//!  0.0 ┼─/                    \___
//!      start  decay  sustain  release
//! ```
//!
//! The phase is encoded by the relative order of the markers: the release
//! ramp is active iff `release_frame >= start_frame`. [`Envelope::phase`]
//! exposes the decoded phase for inspection.

/// Smallest level produced during the attack ramp.
///
/// Keeps the very first attack sample distinguishable from a silent voice.
pub const ATTACK_FLOOR: f32 = 1e-4;

/// Release marker used while a note is held.
const HELD: i64 = i64::MIN;

/// ADSR settings, read fresh on every evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeSettings {
    /// Attack time in milliseconds.
    pub attack_ms: f32,
    /// Decay time in milliseconds.
    pub decay_ms: f32,
    /// Sustain level (0.0 to 1.0).
    pub sustain: f32,
    /// Release time in milliseconds.
    pub release_ms: f32,
}

impl Default for EnvelopeSettings {
    fn default() -> Self {
        Self {
            attack_ms: 0.1,
            decay_ms: 25.0,
            sustain: 1.0,
            release_ms: 0.0,
        }
    }
}

/// Envelope phase decoded from the frame markers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvelopePhase {
    /// Linear ramp from 0 to 1.
    Attack,
    /// Linear ramp from 1 to the sustain level.
    Decay,
    /// Constant sustain level while held.
    Sustain,
    /// Linear ramp from the last held level to 0.
    Release,
}

/// Per-voice envelope state.
///
/// # Example
///
/// ```rust
/// use synthone_core::{Envelope, EnvelopePhase, EnvelopeSettings};
///
/// let adsr = EnvelopeSettings { attack_ms: 10.0, decay_ms: 10.0, sustain: 0.5, release_ms: 10.0 };
/// let mut env = Envelope::new(44100.0);
///
/// env.start(1000);
/// assert_eq!(env.phase(&adsr, 1000), EnvelopePhase::Attack);
/// let peak = env.evaluate(&adsr, 1000 + 441);
/// assert!((peak - 1.0).abs() < 1e-6);
///
/// env.release(5000);
/// assert_eq!(env.phase(&adsr, 5000), EnvelopePhase::Release);
/// ```
#[derive(Debug, Clone)]
pub struct Envelope {
    start_frame: i64,
    release_frame: i64,
    /// Last level produced outside the release phase.
    last_held_level: f32,
    sample_rate: f32,
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new(44100.0)
    }
}

impl Envelope {
    /// Create an idle envelope (released, level 0).
    pub fn new(sample_rate: f32) -> Self {
        Self {
            start_frame: 0,
            release_frame: 0,
            last_held_level: 0.0,
            sample_rate,
        }
    }

    /// Begin the attack at `frame`. The envelope is held until [`release`](Self::release).
    pub fn start(&mut self, frame: i64) {
        self.start_frame = frame;
        self.release_frame = HELD;
    }

    /// Begin the release ramp at `frame`.
    pub fn release(&mut self, frame: i64) {
        self.release_frame = frame;
    }

    /// Reset to the idle state.
    pub fn reset(&mut self) {
        self.start_frame = 0;
        self.release_frame = 0;
        self.last_held_level = 0.0;
    }

    /// Whether the envelope is held (started and not released since).
    #[inline]
    pub fn is_held(&self) -> bool {
        self.release_frame < self.start_frame
    }

    /// Frame at which the current attack began.
    pub fn start_frame(&self) -> i64 {
        self.start_frame
    }

    /// Frame at which the current release began, if released.
    pub fn release_frame(&self) -> Option<i64> {
        (!self.is_held()).then_some(self.release_frame)
    }

    /// Level captured when the release ramp began (or the latest held level).
    pub fn last_held_level(&self) -> f32 {
        self.last_held_level
    }

    /// Update the sample rate used to convert milliseconds to frames.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Decode the phase at `frame`.
    pub fn phase(&self, settings: &EnvelopeSettings, frame: i64) -> EnvelopePhase {
        if !self.is_held() {
            return EnvelopePhase::Release;
        }
        let elapsed = (frame - self.start_frame) as f32;
        let attack = self.frames_from_ms(settings.attack_ms);
        let decay = self.frames_from_ms(settings.decay_ms);
        if elapsed < attack {
            EnvelopePhase::Attack
        } else if elapsed < attack + decay {
            EnvelopePhase::Decay
        } else {
            EnvelopePhase::Sustain
        }
    }

    /// Evaluate the envelope level at `frame`.
    ///
    /// # Panics
    ///
    /// Panics if `frame` precedes the start frame: frame counters only move
    /// forward, so an inverted pair means the caller's state is corrupt.
    pub fn evaluate(&mut self, settings: &EnvelopeSettings, frame: i64) -> f32 {
        assert!(
            frame >= self.start_frame,
            "envelope evaluated at frame {frame} before its start frame {}",
            self.start_frame
        );

        if !self.is_held() {
            let release = self.frames_from_ms(settings.release_ms);
            let elapsed = (frame - self.release_frame).max(0) as f32;
            return (self.last_held_level * (1.0 - elapsed / release)).max(0.0);
        }

        let elapsed = (frame - self.start_frame) as f32;
        let attack = self.frames_from_ms(settings.attack_ms);
        let decay = self.frames_from_ms(settings.decay_ms);
        let sustain = settings.sustain;

        let level = if elapsed < attack {
            (elapsed / attack).max(ATTACK_FLOOR)
        } else if elapsed < attack + decay {
            1.0 - (1.0 - sustain) * (elapsed - attack) / decay
        } else {
            sustain
        };

        self.last_held_level = level;
        level
    }

    /// Convert milliseconds to frames, never less than one frame.
    #[inline]
    fn frames_from_ms(&self, ms: f32) -> f32 {
        (ms * self.sample_rate / 1000.0).max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44100.0;

    fn adsr() -> EnvelopeSettings {
        // 441 frames attack, 882 frames decay, 4410 frames release at 44.1 kHz
        EnvelopeSettings {
            attack_ms: 10.0,
            decay_ms: 20.0,
            sustain: 0.6,
            release_ms: 100.0,
        }
    }

    #[test]
    fn idle_envelope_is_silent() {
        let mut env = Envelope::new(SR);
        assert!(!env.is_held());
        assert_eq!(env.evaluate(&adsr(), 10), 0.0);
    }

    #[test]
    fn attack_starts_at_floor() {
        let mut env = Envelope::new(SR);
        env.start(100);
        let level = env.evaluate(&adsr(), 100);
        assert!(level > 0.0 && level <= ATTACK_FLOOR, "got {level}");
    }

    #[test]
    fn phase_boundaries() {
        let mut env = Envelope::new(SR);
        let s = adsr();
        env.start(0);

        assert_eq!(env.phase(&s, 0), EnvelopePhase::Attack);
        assert_eq!(env.phase(&s, 441), EnvelopePhase::Decay);
        assert_eq!(env.phase(&s, 441 + 882), EnvelopePhase::Sustain);

        assert!((env.evaluate(&s, 441) - 1.0).abs() < 1e-6);
        assert!((env.evaluate(&s, 441 + 882) - 0.6).abs() < 1e-6);
        assert!((env.evaluate(&s, 100_000) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn release_ramps_from_held_level() {
        let mut env = Envelope::new(SR);
        let s = adsr();
        env.start(0);
        // Interrupt the attack halfway
        let held = env.evaluate(&s, 220);
        env.release(220);
        assert_eq!(env.phase(&s, 220), EnvelopePhase::Release);

        let at_release = env.evaluate(&s, 220);
        assert!((at_release - held).abs() < 1e-6);

        let halfway = env.evaluate(&s, 220 + 2205);
        assert!((halfway - held * 0.5).abs() < 1e-4, "got {halfway}");

        assert_eq!(env.evaluate(&s, 220 + 4410), 0.0);
        assert_eq!(env.evaluate(&s, 220 + 100_000), 0.0);
    }

    #[test]
    fn zero_release_drops_immediately() {
        let mut env = Envelope::new(SR);
        let s = EnvelopeSettings {
            release_ms: 0.0,
            ..adsr()
        };
        env.start(0);
        env.evaluate(&s, 5000);
        env.release(5000);
        assert!((env.evaluate(&s, 5000) - 0.6).abs() < 1e-6);
        assert_eq!(env.evaluate(&s, 5001), 0.0);
    }

    #[test]
    fn zero_decay_jumps_to_sustain() {
        let mut env = Envelope::new(SR);
        let s = EnvelopeSettings {
            decay_ms: 0.0,
            ..adsr()
        };
        env.start(0);
        assert!((env.evaluate(&s, 441) - 1.0).abs() < 1e-6);
        assert!((env.evaluate(&s, 442) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn retrigger_restarts_attack() {
        let mut env = Envelope::new(SR);
        let s = adsr();
        env.start(0);
        env.evaluate(&s, 2000);
        env.release(2000);
        env.start(2100);
        assert!(env.is_held());
        assert_eq!(env.phase(&s, 2100), EnvelopePhase::Attack);
        assert!(env.evaluate(&s, 2100) <= ATTACK_FLOOR);
    }

    #[test]
    #[should_panic(expected = "before its start frame")]
    fn frame_inversion_is_fatal() {
        let mut env = Envelope::new(SR);
        env.start(1000);
        env.evaluate(&adsr(), 999);
    }
}
