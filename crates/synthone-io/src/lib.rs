//! Real-time audio plumbing for the synthone synthesizer.
//!
//! This crate connects a [`Synth`](synthone_synth::Synth) to the outside world:
//!
//! - **Output queue**: [`AudioQueue`] abstracts "how much PCM is already
//!   queued downstream"; [`pcm_queue`] provides a lock-free implementation
//!   feeding the cpal callback
//! - **Buffer filler**: [`BufferFiller`] renders exactly the frames the queue
//!   is missing, converts them to 16-bit PCM and feeds the [`Visualizer`]
//! - **Engine**: [`Engine`] keeps synth, filler and visualizer behind one
//!   `parking_lot::Mutex`, so fills, note events and visualization hand-offs
//!   never interleave
//! - **Real-time task**: [`RealtimeTask`] ticks a closure on a fixed interval
//!   until an abort flag is raised
//! - **Output stream**: [`OutputStream`] plays the queue through cpal
//! - **Note sources**: [`MidiParser`] for raw MIDI bytes and [`StepSequencer`]
//!   for the built-in 16-step pattern
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::sync::atomic::AtomicBool;
//! use synthone_io::{Engine, EngineConfig, OutputStream, StreamConfig, pcm_queue, spawn_filler};
//! use synthone_synth::SynthParams;
//!
//! let config = EngineConfig::default();
//! let (producer, consumer) = pcm_queue(config.queue_capacity());
//! let engine = Engine::new(config, Arc::new(SynthParams::new()), producer);
//!
//! engine.prefill();
//! let stream = OutputStream::open(&StreamConfig::from(&config), consumer)?;
//! let abort = Arc::new(AtomicBool::new(false));
//! let filler = spawn_filler(engine.clone(), Arc::clone(&abort))?;
//!
//! engine.note_on(40, 1.0);
//! # Ok::<(), synthone_io::Error>(())
//! ```

mod engine;
mod filler;
mod midi;
mod queue;
mod realtime;
mod sequencer;
mod stream;
mod visualization;

pub use engine::{Engine, EngineConfig, EngineState};
pub use filler::{BufferFiller, to_pcm};
pub use midi::{MidiEvent, MidiParser};
pub use queue::{AudioQueue, PcmConsumer, PcmProducer, pcm_queue};
pub use realtime::{RealtimeTask, spawn_filler};
pub use sequencer::{
    DEFAULT_BPM, NBR_STEPS, STEPS_PER_BEAT, StepChange, StepSequencer, initial_pattern,
};
pub use stream::{
    OutputDevice, OutputStream, StreamConfig, default_output_device, list_output_devices,
};
pub use visualization::{DEFAULT_HEIGHT, DEFAULT_WIDTH, Visualizer};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested sample format is not supported.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
