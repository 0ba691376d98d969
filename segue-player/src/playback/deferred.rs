//! One-shot deferred callbacks on the playback timeline
//!
//! Fade steps and the delayed track-repeat replay are not run on their own
//! threads: a short-lived task sleeps until the fire time and then posts the
//! callback back to the timeline, where it is applied in order with ticks,
//! engine callbacks and user commands. Each callback carries the generation
//! of whatever scheduled it, so a superseded callback discards itself.

use super::envelope::EnvelopeStep;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Callback delivered back to the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// One volume step of a fade run
    Envelope(EnvelopeStep),

    /// Seek-to-zero and resume after the track-repeat settle delay
    Replay { generation: u64 },
}

pub type DeferredReceiver = mpsc::UnboundedReceiver<Deferred>;

/// Schedules deferred callbacks onto the timeline channel
#[derive(Debug, Clone)]
pub struct DeferredScheduler {
    tx: mpsc::UnboundedSender<Deferred>,
}

impl DeferredScheduler {
    pub fn new() -> (Self, DeferredReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Post `callback` after `delay`
    pub fn schedule(&self, delay: Duration, callback: Deferred) {
        self.schedule_at(Instant::now() + delay, callback);
    }

    /// Post `callback` at an absolute fire time
    ///
    /// Best effort: the callback is never delivered early, and is silently
    /// dropped if the timeline has shut down.
    pub fn schedule_at(&self, deadline: Instant, callback: Deferred) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let _ = tx.send(callback);
        });
    }

    /// Schedule a batch of steps relative to one run start
    pub fn schedule_run(&self, steps: Vec<(Duration, EnvelopeStep)>) {
        let start = Instant::now();
        for (offset, step) in steps {
            self.schedule_at(start + offset, Deferred::Envelope(step));
        }
    }
}
