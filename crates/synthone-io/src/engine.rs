//! Shared synthesizer state behind a single lock.
//!
//! The periodic producer and the control side both mutate the voice pool,
//! the delay line and the visualization window. [`Engine`] puts all of it in
//! one [`EngineState`] guarded by a `parking_lot::Mutex`. Each public method
//! holds the lock for exactly one critical section: a fill (measure the queue,
//! render, enqueue), a note event, or a visualization hand-off.
//!
//! Parameters are not behind the lock. They live in the shared
//! [`SynthParams`] registry, whose values are atomics, so the control side
//! can change them at any time without blocking the renderer.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use synthone_synth::{Synth, SynthParams};

use crate::filler::BufferFiller;
use crate::queue::AudioQueue;
use crate::visualization::{DEFAULT_HEIGHT, DEFAULT_WIDTH, Visualizer};

/// Timing and sizing of the real-time path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Device buffer size in frames; also the target queue depth.
    pub buffer_frames: usize,
    /// Points per visualization window.
    pub vis_width: usize,
    /// Height the visualization points are scaled to.
    pub vis_height: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            buffer_frames: 1024,
            vis_width: DEFAULT_WIDTH,
            vis_height: DEFAULT_HEIGHT,
        }
    }
}

impl EngineConfig {
    /// Largest number of frames rendered per fill: half the device buffer.
    pub fn batch_frames(&self) -> usize {
        (self.buffer_frames / 2).max(1)
    }

    /// Interval between producer ticks: half a batch worth of frames.
    pub fn tick_interval(&self) -> Duration {
        let frames = (self.batch_frames() / 2).max(1) as u64;
        Duration::from_nanos(frames * 1_000_000_000 / u64::from(self.sample_rate.max(1)))
    }

    /// Capacity for a [`pcm_queue`](crate::pcm_queue) serving this engine.
    ///
    /// Leaves room for one full batch above the target depth.
    pub fn queue_capacity(&self) -> usize {
        self.buffer_frames + self.batch_frames()
    }
}

/// Everything the render path mutates.
#[derive(Debug)]
pub struct EngineState<Q> {
    synth: Synth,
    filler: BufferFiller,
    visualizer: Visualizer,
    queue: Q,
}

impl<Q> EngineState<Q> {
    /// Synthesizer context.
    pub fn synth(&self) -> &Synth {
        &self.synth
    }

    /// Synthesizer context, mutably.
    pub fn synth_mut(&mut self) -> &mut Synth {
        &mut self.synth
    }

    /// Downstream queue.
    pub fn queue(&self) -> &Q {
        &self.queue
    }

    /// Downstream queue, mutably.
    pub fn queue_mut(&mut self) -> &mut Q {
        &mut self.queue
    }

    /// Visualization window.
    pub fn visualizer(&self) -> &Visualizer {
        &self.visualizer
    }
}

/// Cloneable handle to the shared synthesizer state.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use synthone_io::{AudioQueue, Engine, EngineConfig};
/// use synthone_synth::SynthParams;
///
/// let config = EngineConfig { buffer_frames: 512, ..EngineConfig::default() };
/// let engine = Engine::new(config, Arc::new(SynthParams::new()), Vec::new());
///
/// engine.note_on(40, 1.0);
/// assert_eq!(engine.prefill(), 256);
/// assert_eq!(engine.fill(), 256);
/// assert_eq!(engine.fill(), 0);
/// assert_eq!(engine.with_state(|s| s.queue().queued_frames()), 512);
/// ```
pub struct Engine<Q> {
    shared: Arc<Mutex<EngineState<Q>>>,
    params: Arc<SynthParams>,
    config: EngineConfig,
}

impl<Q> Clone for Engine<Q> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            params: Arc::clone(&self.params),
            config: self.config,
        }
    }
}

impl<Q: AudioQueue> Engine<Q> {
    /// Create an engine rendering into `queue`.
    pub fn new(config: EngineConfig, params: Arc<SynthParams>, queue: Q) -> Self {
        let synth = Synth::new(config.sample_rate as f32, Arc::clone(&params));
        let state = EngineState {
            synth,
            filler: BufferFiller::new(config.buffer_frames, config.batch_frames()),
            visualizer: Visualizer::new(config.vis_width.max(1), config.vis_height),
            queue,
        };
        tracing::debug!(
            sample_rate = config.sample_rate,
            buffer_frames = config.buffer_frames,
            batch_frames = config.batch_frames(),
            "engine created"
        );
        Self {
            shared: Arc::new(Mutex::new(state)),
            params,
            config,
        }
    }

    /// Shared parameter registry.
    pub fn params(&self) -> &Arc<SynthParams> {
        &self.params
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Render one full batch regardless of the queue depth.
    ///
    /// Used once before the producer starts so the device begins with data.
    pub fn prefill(&self) -> usize {
        let mut guard = self.shared.lock();
        let state = &mut *guard;
        let frames = state.filler.max_batch();
        state
            .filler
            .fill_frames(&mut state.synth, &mut state.queue, &mut state.visualizer, frames)
    }

    /// One producer tick: top the queue up, returning the frames rendered.
    pub fn fill(&self) -> usize {
        let mut guard = self.shared.lock();
        let state = &mut *guard;
        state
            .filler
            .fill(&mut state.synth, &mut state.queue, &mut state.visualizer)
    }

    /// Press `key`; returns the voice used.
    pub fn note_on(&self, key: u8, velocity: f32) -> Option<usize> {
        self.shared.lock().synth.note_on(key, velocity)
    }

    /// Release `key`; returns the voice released.
    pub fn note_off(&self, key: u8) -> Option<usize> {
        self.shared.lock().synth.note_off(key)
    }

    /// Release `off_key` and press `on_key` in one critical section.
    pub fn note_change(&self, on_key: u8, off_key: u8) {
        self.shared.lock().synth.note_change(on_key, off_key);
    }

    /// Release every held key.
    pub fn all_notes_off(&self) {
        self.shared.lock().synth.all_notes_off();
    }

    /// Take the visualization window if it is full.
    pub fn take_visualization(&self) -> Option<Vec<f32>> {
        self.shared.lock().visualizer.take()
    }

    /// Index of the next frame to be rendered.
    pub fn frame(&self) -> i64 {
        self.shared.lock().synth.frame()
    }

    /// Run `f` with the lock held.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut EngineState<Q>) -> R) -> R {
        f(&mut self.shared.lock())
    }
}
