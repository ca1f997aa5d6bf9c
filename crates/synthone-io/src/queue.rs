//! PCM output queue.
//!
//! The buffer filler only needs two things from the downstream audio path:
//! how many frames are still waiting to be played, and a place to put new
//! ones. [`AudioQueue`] captures exactly that. [`pcm_queue`] returns the
//! lock-free pair used with a real output device: the producer side is
//! filled under the engine lock, the consumer side is drained by the cpal
//! callback without ever taking that lock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

/// Downstream sink for mono 16-bit PCM frames.
pub trait AudioQueue {
    /// Frames queued but not yet consumed.
    fn queued_frames(&self) -> usize;

    /// Append `frames`, returning how many were accepted.
    fn enqueue(&mut self, frames: &[i16]) -> usize;
}

/// Unbounded in-memory queue; nothing is ever consumed.
impl AudioQueue for Vec<i16> {
    fn queued_frames(&self) -> usize {
        self.len()
    }

    fn enqueue(&mut self, frames: &[i16]) -> usize {
        self.extend_from_slice(frames);
        frames.len()
    }
}

/// Create a bounded PCM queue holding at most `capacity` frames.
pub fn pcm_queue(capacity: usize) -> (PcmProducer, PcmConsumer) {
    let (tx, rx) = bounded(capacity.max(1));
    (
        PcmProducer {
            tx,
            overflowing: false,
        },
        PcmConsumer {
            rx,
            underruns: Arc::new(AtomicU64::new(0)),
            starved: false,
        },
    )
}

/// Writing half of [`pcm_queue`].
#[derive(Debug)]
pub struct PcmProducer {
    tx: Sender<i16>,
    /// Set while frames are being dropped, so the overflow is reported once.
    overflowing: bool,
}

impl PcmProducer {
    /// Maximum number of frames the queue holds.
    pub fn capacity(&self) -> usize {
        self.tx.capacity().unwrap_or(usize::MAX)
    }
}

impl AudioQueue for PcmProducer {
    fn queued_frames(&self) -> usize {
        self.tx.len()
    }

    fn enqueue(&mut self, frames: &[i16]) -> usize {
        let mut accepted = 0;
        for &frame in frames {
            match self.tx.try_send(frame) {
                Ok(()) => accepted += 1,
                Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => break,
            }
        }

        let dropped = frames.len() - accepted;
        if dropped > 0 {
            if !self.overflowing {
                tracing::warn!(dropped, "PCM queue full, dropping frames");
            }
            self.overflowing = true;
        } else {
            self.overflowing = false;
        }
        accepted
    }
}

/// Reading half of [`pcm_queue`], owned by the output callback.
#[derive(Debug)]
pub struct PcmConsumer {
    rx: Receiver<i16>,
    underruns: Arc<AtomicU64>,
    /// Set while the queue is running dry, so each underrun episode is reported once.
    starved: bool,
}

impl PcmConsumer {
    /// Fill an interleaved `f32` buffer of `channels` channels.
    ///
    /// Each queued mono frame is copied to every channel. Frames the queue
    /// could not supply are filled with silence and counted as one underrun.
    /// Returns the number of frames taken from the queue.
    pub fn fill(&mut self, out: &mut [f32], channels: usize) -> usize {
        let channels = channels.max(1);
        let mut taken = 0;

        for frame in out.chunks_mut(channels) {
            match self.rx.try_recv() {
                Ok(pcm) => {
                    frame.fill(pcm_to_f32(pcm));
                    taken += 1;
                }
                Err(_) => frame.fill(0.0),
            }
        }

        let wanted = out.len().div_ceil(channels);
        if taken < wanted {
            self.underruns.fetch_add(1, Ordering::Relaxed);
            if !self.starved {
                tracing::warn!(missing = wanted - taken, "output underrun, playing silence");
            }
            self.starved = true;
        } else {
            self.starved = false;
        }
        taken
    }

    /// Frames waiting to be played.
    pub fn queued_frames(&self) -> usize {
        self.rx.len()
    }

    /// Number of fills so far that came up short.
    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }

    /// Shared handle to the underrun counter, readable after the consumer
    /// has moved into the audio callback.
    pub fn underrun_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.underruns)
    }
}

fn pcm_to_f32(pcm: i16) -> f32 {
    f32::from(pcm) / f32::from(i16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_queue_counts_everything() {
        let mut queue = Vec::new();
        assert_eq!(queue.enqueue(&[1, 2, 3]), 3);
        assert_eq!(queue.queued_frames(), 3);
    }

    #[test]
    fn producer_stops_at_capacity() {
        let (mut producer, consumer) = pcm_queue(4);
        assert_eq!(producer.capacity(), 4);
        assert_eq!(producer.enqueue(&[1, 2, 3, 4, 5, 6]), 4);
        assert_eq!(producer.queued_frames(), 4);
        assert_eq!(consumer.queued_frames(), 4);
    }

    #[test]
    fn consumer_duplicates_mono_to_every_channel() {
        let (mut producer, mut consumer) = pcm_queue(8);
        producer.enqueue(&[i16::MAX, 0]);
        let mut out = [9.0f32; 4];
        assert_eq!(consumer.fill(&mut out, 2), 2);
        assert_eq!(out, [1.0, 1.0, 0.0, 0.0]);
        assert_eq!(consumer.underruns(), 0);
    }

    #[test]
    fn short_queue_is_padded_and_counted() {
        let (mut producer, mut consumer) = pcm_queue(8);
        producer.enqueue(&[i16::MAX]);
        let mut out = [9.0f32; 3];
        assert_eq!(consumer.fill(&mut out, 1), 1);
        assert_eq!(out, [1.0, 0.0, 0.0]);
        assert_eq!(consumer.underruns(), 1);

        let counter = consumer.underrun_counter();
        consumer.fill(&mut out, 1);
        assert_eq!(counter.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn disconnected_consumer_accepts_nothing() {
        let (mut producer, consumer) = pcm_queue(8);
        drop(consumer);
        assert_eq!(producer.enqueue(&[1, 2]), 0);
    }
}
