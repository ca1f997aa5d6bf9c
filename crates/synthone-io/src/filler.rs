//! Buffer filler: tops the output queue up to its target depth.

use synthone_synth::Synth;

use crate::queue::AudioQueue;
use crate::visualization::Visualizer;

/// Convert a float sample to 16-bit PCM.
///
/// The cast saturates, so out-of-range input clips instead of wrapping.
#[inline]
pub fn to_pcm(sample: f32) -> i16 {
    (sample * f32::from(i16::MAX)) as i16
}

/// Renders the frames the downstream queue is missing.
///
/// Each fill computes `target − queued`, clamps it to the maximum batch size
/// and renders exactly that many frames. The scratch buffer is allocated once
/// at construction, so filling never allocates.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use synthone_io::{AudioQueue, BufferFiller, Visualizer};
/// use synthone_synth::{Synth, SynthParams};
///
/// let mut synth = Synth::new(44100.0, Arc::new(SynthParams::new()));
/// let mut vis = Visualizer::default();
/// let mut queue: Vec<i16> = Vec::new();
///
/// let mut filler = BufferFiller::new(1024, 512);
/// assert_eq!(filler.fill(&mut synth, &mut queue, &mut vis), 512);
/// assert_eq!(filler.fill(&mut synth, &mut queue, &mut vis), 512);
/// assert_eq!(filler.fill(&mut synth, &mut queue, &mut vis), 0);
/// assert_eq!(queue.queued_frames(), 1024);
/// ```
#[derive(Debug, Clone)]
pub struct BufferFiller {
    target_frames: usize,
    max_batch: usize,
    scratch: Vec<i16>,
}

impl BufferFiller {
    /// Create a filler keeping `target_frames` queued, rendering at most
    /// `max_batch` frames per fill.
    pub fn new(target_frames: usize, max_batch: usize) -> Self {
        let max_batch = max_batch.max(1);
        Self {
            target_frames,
            max_batch,
            scratch: Vec::with_capacity(max_batch),
        }
    }

    /// Queue depth the filler aims for.
    pub fn target_frames(&self) -> usize {
        self.target_frames
    }

    /// Largest number of frames rendered per fill.
    pub fn max_batch(&self) -> usize {
        self.max_batch
    }

    /// Frames to render when `queued` frames are already waiting.
    pub fn frames_needed(&self, queued: usize) -> usize {
        self.target_frames
            .saturating_sub(queued)
            .min(self.max_batch)
    }

    /// Top `queue` up toward the target depth; returns the frames rendered.
    pub fn fill<Q: AudioQueue + ?Sized>(
        &mut self,
        synth: &mut Synth,
        queue: &mut Q,
        visualizer: &mut Visualizer,
    ) -> usize {
        let frames = self.frames_needed(queue.queued_frames());
        self.fill_frames(synth, queue, visualizer, frames)
    }

    /// Render `frames` (clamped to the batch size) and enqueue them
    /// regardless of the current queue depth.
    pub fn fill_frames<Q: AudioQueue + ?Sized>(
        &mut self,
        synth: &mut Synth,
        queue: &mut Q,
        visualizer: &mut Visualizer,
        frames: usize,
    ) -> usize {
        if frames == 0 {
            return 0;
        }
        let rendered = self.render(synth, visualizer, frames).len();
        let accepted = queue.enqueue(&self.scratch);
        if accepted < rendered {
            tracing::debug!(rendered, accepted, "queue accepted a partial batch");
        }
        rendered
    }

    /// Render up to one batch of PCM into the scratch buffer and return it.
    ///
    /// The lowest held voice is captured once per batch; it drives bend
    /// stepping and the visualization period for every frame in the batch.
    pub fn render(
        &mut self,
        synth: &mut Synth,
        visualizer: &mut Visualizer,
        frames: usize,
    ) -> &[i16] {
        let frames = frames.min(self.max_batch);
        self.scratch.clear();

        let reference = synth.lowest_held_voice();
        let display_key = synth.lowest_held_key().unwrap_or(1);
        let sample_rate = synth.sample_rate();

        for _ in 0..frames {
            let rendered = synth.render_frame(reference);
            self.scratch.push(to_pcm(rendered.sample));

            let period_hz = synth.bend() * synth.key_table().frequency(display_key, 0.0);
            visualizer.observe(&rendered, sample_rate, period_hz);
        }

        &self.scratch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use synthone_synth::SynthParams;

    fn synth() -> Synth {
        Synth::new(44100.0, Arc::new(SynthParams::new()))
    }

    #[test]
    fn pcm_conversion_scales_and_saturates() {
        assert_eq!(to_pcm(0.0), 0);
        assert_eq!(to_pcm(1.0), 0x7FFF);
        assert_eq!(to_pcm(-1.0), -0x7FFF);
        assert_eq!(to_pcm(0.5), 0x3FFF);
        assert_eq!(to_pcm(2.0), i16::MAX);
        assert_eq!(to_pcm(-2.0), i16::MIN);
    }

    #[test]
    fn frames_needed_is_clamped() {
        let filler = BufferFiller::new(1000, 300);
        assert_eq!(filler.frames_needed(0), 300);
        assert_eq!(filler.frames_needed(800), 200);
        assert_eq!(filler.frames_needed(1000), 0);
        assert_eq!(filler.frames_needed(5000), 0);
    }

    #[test]
    fn fill_advances_the_frame_counter() {
        let mut synth = synth();
        let mut vis = Visualizer::default();
        let mut queue: Vec<i16> = vec![0; 900];
        let mut filler = BufferFiller::new(1000, 300);

        assert_eq!(filler.fill(&mut synth, &mut queue, &mut vis), 100);
        assert_eq!(synth.frame(), 100);
        assert_eq!(queue.len(), 1000);
    }

    #[test]
    fn rendered_pcm_matches_the_float_path() {
        let params = Arc::new(SynthParams::new());
        let mut a = Synth::new(44100.0, Arc::clone(&params));
        let mut b = Synth::new(44100.0, params);
        a.note_on(40, 1.0);
        b.note_on(40, 1.0);

        let mut vis = Visualizer::default();
        let mut filler = BufferFiller::new(256, 256);
        let pcm = filler.render(&mut a, &mut vis, 256).to_vec();

        let mut float = [0.0f32; 256];
        b.render_block(&mut float);
        let expected: Vec<i16> = float.iter().map(|&s| to_pcm(s)).collect();
        assert_eq!(pcm, expected);
    }

    #[test]
    fn visualization_fills_while_a_key_is_held() {
        let mut synth = synth();
        synth.note_on(40, 1.0);
        let mut vis = Visualizer::new(64, 100.0);
        let mut filler = BufferFiller::new(4096, 4096);
        filler.render(&mut synth, &mut vis, 4096);
        assert!(vis.is_full());
        assert!(vis.points().iter().all(|y| (0.0..=100.0).contains(y)));
    }
}
