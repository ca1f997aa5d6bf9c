//! Synthone Synth - polyphonic synthesis engine
//!
//! This crate builds the synthesizer on top of the `synthone-core` primitives:
//!
//! - [`OscillatorBank`] - per-voice pulse/saw phase accumulators with unison detune
//! - [`fm`] - FM operator graphs with cached-output feedback
//! - [`SynthParams`] - registry of every tunable, readable without locks
//! - [`VoiceManager`] - fixed voice pool with release-age stealing and bend glide
//! - [`Synth`] - the context object that renders one output sample at a time
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use synthone_synth::{ParamId, Synth, SynthParams};
//!
//! let params = Arc::new(SynthParams::new());
//! params.set(ParamId::Release, 200.0);
//!
//! let mut synth = Synth::new(44100.0, Arc::clone(&params));
//! synth.note_on(37, 0.8);
//!
//! let mut out = vec![0.0f32; 1024];
//! synth.render_block(&mut out);
//!
//! synth.note_off(37);
//! synth.render_block(&mut out);
//! ```
//!
//! # Threading
//!
//! [`Synth`] is `Send` and is meant to live behind the single lock the
//! real-time producer and the control side share. [`SynthParams`] is shared
//! separately through an `Arc` so parameter edits never take that lock.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod fm;
pub mod oscillator;
pub mod params;
pub mod synth;
pub mod voice;

// Re-export main types at crate root
pub use fm::{ALGORITHMS, Algorithm, FmOperators, FmState, MAX_OPERATORS, OperatorSlot};
pub use oscillator::{MAX_OSC_COUNT, OscillatorBank, Waveform};
pub use params::{OscType, PARAM_COUNT, ParamGroup, ParamId, SynthParams};
pub use synth::{MAX_DELAY_MS, RenderedFrame, Synth};
pub use voice::{MAX_KEY, NBR_VOICES, NEVER, Voice, VoiceManager};

// Re-export commonly used types from synthone-core
pub use synthone_core::{ControlParameter, EnvelopeSettings, KeyTable};
