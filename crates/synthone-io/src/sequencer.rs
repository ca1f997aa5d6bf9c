//! 16-step note sequencer.
//!
//! Holds the pattern and the play/edit state; the caller drives it by
//! calling [`StepSequencer::step`] every [`StepSequencer::step_interval`]
//! and applying the returned note change.

use std::time::Duration;

/// Steps in the pattern.
pub const NBR_STEPS: usize = 16;

/// Default tempo in beats per minute.
pub const DEFAULT_BPM: f32 = 120.0;

/// Steps per beat.
pub const STEPS_PER_BEAT: u32 = 4;

/// Key to release and key to press on a step; 0 means none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepChange {
    /// Key to press.
    pub on_key: u8,
    /// Key to release.
    pub off_key: u8,
}

/// The pattern loaded at start-up: a low root with a fifth and an octave
/// sprinkled over it.
pub fn initial_pattern() -> [u8; NBR_STEPS] {
    core::array::from_fn(|i| {
        let fifth = u8::from((i + 1) % 3 == 0) * 5;
        let octave = u8::from((i + 2) % 3 == 0) * 12;
        1 + fifth + octave
    })
}

/// Step sequencer state.
///
/// # Example
///
/// ```rust
/// use synthone_io::{StepChange, StepSequencer};
///
/// let mut seq = StepSequencer::new();
/// assert_eq!(seq.step(), None); // stopped
///
/// seq.toggle_run();
/// assert_eq!(seq.step(), Some(StepChange { on_key: 13, off_key: 1 }));
///
/// seq.toggle_run();
/// // Stopping releases the sounding key once
/// assert_eq!(seq.step(), Some(StepChange { on_key: 0, off_key: 13 }));
/// assert_eq!(seq.step(), None);
/// ```
#[derive(Debug, Clone)]
pub struct StepSequencer {
    steps: [u8; NBR_STEPS],
    index: usize,
    run: bool,
    edit: bool,
    /// Whether a step key may still be sounding.
    sounding: bool,
    bpm: f32,
}

impl Default for StepSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl StepSequencer {
    /// Create a stopped sequencer holding [`initial_pattern`].
    pub fn new() -> Self {
        Self {
            steps: initial_pattern(),
            index: 0,
            run: false,
            edit: false,
            sounding: false,
            bpm: DEFAULT_BPM,
        }
    }

    /// Start or stop playback.
    pub fn toggle_run(&mut self) -> bool {
        self.run = !self.run;
        self.run
    }

    /// Enter or leave edit mode.
    pub fn toggle_edit(&mut self) -> bool {
        self.edit = !self.edit;
        self.edit
    }

    /// Whether playback is on.
    pub fn is_running(&self) -> bool {
        self.run
    }

    /// Whether edit mode is on.
    pub fn is_editing(&self) -> bool {
        self.edit
    }

    /// In edit mode, store `key` (0 for a rest) at the current step and
    /// move to the next one. Returns whether the key was stored.
    pub fn input(&mut self, key: u8) -> bool {
        if !self.edit {
            return false;
        }
        self.steps[self.index] = key;
        self.advance();
        true
    }

    /// Advance one step and return the note change to apply.
    ///
    /// While stopped this returns `None`, except for the first step after
    /// stopping, which releases the key that was still sounding.
    pub fn step(&mut self) -> Option<StepChange> {
        if self.run {
            let off_key = self.steps[self.index];
            self.advance();
            self.sounding = true;
            Some(StepChange {
                on_key: self.steps[self.index],
                off_key,
            })
        } else if self.sounding {
            let off_key = self.steps[self.index];
            self.advance();
            self.sounding = false;
            Some(StepChange { on_key: 0, off_key })
        } else {
            None
        }
    }

    fn advance(&mut self) {
        self.index = (self.index + 1) % NBR_STEPS;
    }

    /// Index of the current step.
    pub fn position(&self) -> usize {
        self.index
    }

    /// The pattern.
    pub fn steps(&self) -> &[u8; NBR_STEPS] {
        &self.steps
    }

    /// Tempo in beats per minute.
    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    /// Change the tempo; non-positive values are ignored.
    pub fn set_bpm(&mut self, bpm: f32) {
        if bpm > 0.0 {
            self.bpm = bpm;
        }
    }

    /// Time between steps: `60 / bpm / steps_per_beat` seconds.
    pub fn step_interval(&self) -> Duration {
        Duration::from_secs_f32(60.0 / self.bpm / STEPS_PER_BEAT as f32)
    }
}
