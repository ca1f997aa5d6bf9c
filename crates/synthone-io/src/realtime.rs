//! Periodic real-time task.
//!
//! A [`RealtimeTask`] runs a closure on its own thread at a fixed interval.
//! Ticks are scheduled against absolute deadlines so sleep jitter does not
//! accumulate; if a tick overruns by more than a whole interval, the
//! schedule restarts from now instead of bursting to catch up.
//!
//! Two flags stop the loop: the shared abort flag, raised by whoever owns
//! the process lifecycle, and a private stop flag set when the task is
//! dropped. A tick in progress always runs to completion.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::Result;
use crate::engine::Engine;
use crate::queue::AudioQueue;

/// Handle to a running periodic task. Dropping it stops and joins the thread.
#[derive(Debug)]
pub struct RealtimeTask {
    name: String,
    stop: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl RealtimeTask {
    /// Spawn a thread calling `tick` every `interval` until `abort` is set.
    pub fn spawn<F>(
        name: &str,
        interval: Duration,
        abort: Arc<AtomicBool>,
        mut tick: F,
    ) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let ticks = Arc::new(AtomicU64::new(0));

        let thread_stop = Arc::clone(&stop);
        let thread_ticks = Arc::clone(&ticks);
        let thread_name = name.to_string();

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut deadline = Instant::now();
                while !abort.load(Ordering::Relaxed) && !thread_stop.load(Ordering::Relaxed) {
                    tick();
                    thread_ticks.fetch_add(1, Ordering::Relaxed);

                    deadline += interval;
                    let now = Instant::now();
                    if deadline > now {
                        thread::sleep(deadline - now);
                    } else if now - deadline > interval {
                        tracing::debug!(task = %thread_name, late = ?(now - deadline), "tick overran");
                        deadline = now;
                    }
                }
                tracing::debug!(task = %thread_name, "task stopped");
            })?;

        tracing::debug!(task = name, ?interval, "task started");
        Ok(Self {
            name: name.to_string(),
            stop,
            ticks,
            handle: Some(handle),
        })
    }

    /// Thread name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Whether the thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stop the task and wait for the current tick to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!(task = %self.name, "task panicked");
            }
        }
    }
}

impl Drop for RealtimeTask {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Start the periodic producer for `engine`.
///
/// Ticks every [`EngineConfig::tick_interval`](crate::EngineConfig::tick_interval),
/// topping the queue up on each tick.
pub fn spawn_filler<Q>(engine: Engine<Q>, abort: Arc<AtomicBool>) -> Result<RealtimeTask>
where
    Q: AudioQueue + Send + 'static,
{
    let interval = engine.config().tick_interval();
    RealtimeTask::spawn("synthone-filler", interval, abort, move || {
        engine.fill();
    })
}
