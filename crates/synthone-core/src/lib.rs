//! Synthone Core - DSP primitives for the synthone sound engine
//!
//! This crate provides the leaf building blocks of the synthesizer signal
//! chain, designed for real-time use with zero allocation in the audio path.
//!
//! # Core Abstractions
//!
//! ## Pitch
//!
//! - [`KeyTable`] - Piano-key to frequency lookup with cent offsets
//! - [`cents_to_ratio`] - Cent offset to frequency ratio
//!
//! ## Envelopes
//!
//! - [`Envelope`] - Frame-counter driven ADSR with linear segments
//! - [`EnvelopePhase`] - Phase derived from the two frame markers
//!
//! ## Filters
//!
//! - [`LowPassSvf`] - Two-pole state-variable low-pass (trapezoidal integration)
//!
//! ## Effects
//!
//! - [`DelayLine`] - Millisecond-addressed ring buffer backing echo and chorus
//! - [`distort`] - Fold-back / clamp waveshaper
//!
//! ## Modulation
//!
//! - [`cosine_lfo`] - Stateless cosine evaluated at an absolute frame
//!
//! ## Parameters
//!
//! - [`ControlParameter`] - Bounded, optionally quantized, lock-free parameter
//! - [`GlideParam`] - Rate-limited glide toward a target
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! synthone-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use synthone_core::{distort, DelayLine, Envelope, EnvelopeSettings, LowPassSvf};
//!
//! let sample_rate = 44100.0;
//! let mut env = Envelope::new(sample_rate);
//! let mut filter = LowPassSvf::new(sample_rate);
//! let mut delay = DelayLine::new(sample_rate, 750.0);
//!
//! let adsr = EnvelopeSettings { attack_ms: 5.0, decay_ms: 50.0, sustain: 0.7, release_ms: 200.0 };
//! env.start(0);
//! for frame in 0..1000 {
//!     let level = env.evaluate(&adsr, frame);
//!     filter.configure(2000.0, 0.2, sample_rate);
//!     let mut sample = filter.process(level);
//!     sample = distort(sample, 1.0, 1.1);
//!     sample += 0.3 * delay.read(300.0);
//!     delay.write(sample);
//! }
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: No allocations in audio processing paths
//! - **No dependencies on std**: Pure `no_std` with `libm` for math
//! - **Explicit state**: every primitive owns its state; nothing is global

#![cfg_attr(not(feature = "std"), no_std)]

pub mod delay;
pub mod envelope;
pub mod keytable;
pub mod lfo;
pub mod param;
pub mod svf;
pub mod waveshaper;

// Re-export main types at crate root
pub use delay::DelayLine;
pub use envelope::{ATTACK_FLOOR, Envelope, EnvelopePhase, EnvelopeSettings};
pub use keytable::{KeyTable, NBR_KEYS, REFERENCE_HZ, REFERENCE_KEY, cents_to_ratio};
pub use lfo::cosine_lfo;
pub use param::{ControlParameter, GlideParam};
pub use svf::LowPassSvf;
pub use waveshaper::distort;
