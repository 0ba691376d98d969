//! Playback orchestrator
//!
//! Composes the queue, the transition detector and the envelope scheduler
//! with an external [`PlaybackEngine`]. The controller is a plain state
//! machine: it is driven by user commands, position ticks, engine callbacks
//! and deferred callbacks, all delivered one at a time by the playback
//! timeline (see `player`), so no locking happens here.
//!
//! **Boundary handling:** the tick-driven detector and the engine's
//! end-of-media callback both call [`PlaybackController::finish_boundary`],
//! which claims the [`TransitionGuard`](super::detector::TransitionGuard)
//! for the ending load before touching the queue.

use super::deferred::{Deferred, DeferredScheduler};
use super::detector::{Detection, PositionSample, TransitionDetector};
use super::engine::{EngineEvent, EngineState, LoadToken, PlaybackEngine};
use super::envelope::EnvelopeScheduler;
use super::queue::{Navigation, Queue, QueueChange};
use crate::config::PlayerConfig;
use crate::error::{QueueError, Result};
use segue_common::events::{
    EventBus, PlaybackEndReason, PlayerEvent, QueueChangeTrigger, RepeatMode,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Which trigger reported a track boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryTrigger {
    /// Near-end detection on the position tick
    PositionPoll,
    /// Engine's own end-of-media callback
    EngineCallback,
}

/// Queue-driven playback-transition controller
pub struct PlaybackController<E: PlaybackEngine> {
    engine: E,
    queue: Queue<E::Item>,
    detector: TransitionDetector,
    envelopes: EnvelopeScheduler,
    deferred: DeferredScheduler,
    events: EventBus<E::Item>,
    config: PlayerConfig,
    repeat_mode: RepeatMode,

    /// Token of the load currently in the engine
    current_token: Option<LoadToken>,
    last_token: LoadToken,

    /// Bumped to supersede a pending track-repeat replay
    replay_generation: u64,

    /// Boundary handoffs performed (queue advances at track end)
    handoffs: u64,
}

impl<E: PlaybackEngine> PlaybackController<E> {
    pub fn new(
        engine: E,
        config: PlayerConfig,
        deferred: DeferredScheduler,
        events: EventBus<E::Item>,
    ) -> Self {
        let mut envelopes = EnvelopeScheduler::new(&config);
        envelopes.set_base_volume(engine.volume());

        Self {
            detector: TransitionDetector::new(config.end_threshold(), config.fade_out_lead()),
            repeat_mode: config.repeat_mode,
            engine,
            queue: Queue::new(),
            envelopes,
            deferred,
            events,
            config,
            current_token: None,
            last_token: LoadToken::new(0),
            replay_generation: 0,
            handoffs: 0,
        }
    }

    // ========================================
    // Queue operations
    // ========================================

    /// Replace the current item (or make `item` the sole entry)
    pub fn load(&mut self, item: E::Item, play_when_ready: Option<bool>) {
        let play_when_ready = self.play_when_ready(play_when_ready);
        let change = self.queue.replace_current(item);
        self.dispatch(change, play_when_ready);
        self.emit_queue_changed(QueueChangeTrigger::UserEnqueue);
    }

    /// Append items; the first item ever added becomes current
    pub fn add(&mut self, items: Vec<E::Item>, play_when_ready: Option<bool>) {
        let play_when_ready = self.play_when_ready(play_when_ready);
        if let Some(change) = self.queue.add(items) {
            self.dispatch(change, play_when_ready);
        }
        self.emit_queue_changed(QueueChangeTrigger::UserEnqueue);
    }

    /// Insert items at `index` (`0..=len`)
    pub fn add_at(
        &mut self,
        items: Vec<E::Item>,
        index: usize,
        play_when_ready: Option<bool>,
    ) -> Result<()> {
        let play_when_ready = self.play_when_ready(play_when_ready);
        if let Some(change) = self.queue.add_at(items, index)? {
            self.dispatch(change, play_when_ready);
        }
        self.emit_queue_changed(QueueChangeTrigger::UserEnqueue);
        Ok(())
    }

    pub fn next(&mut self, play_when_ready: Option<bool>) {
        self.skip(true, play_when_ready);
    }

    pub fn previous(&mut self, play_when_ready: Option<bool>) {
        self.skip(false, play_when_ready);
    }

    /// Remove the entry at `index`; removing the current item loads its successor
    pub fn remove_item(&mut self, index: usize, play_when_ready: Option<bool>) -> Result<E::Item> {
        let play_when_ready = self.play_when_ready(play_when_ready);
        let (removed, change) = self.queue.remove(index)?;
        if let Some(change) = change {
            self.dispatch(change, play_when_ready);
        }
        self.emit_queue_changed(QueueChangeTrigger::UserDequeue);
        Ok(removed)
    }

    /// Jump to `index`; the already-current index restarts from zero without reloading
    pub fn jump_to_item(&mut self, index: usize, play_when_ready: Option<bool>) -> Result<()> {
        let len = self.queue.len();
        if index >= len {
            return Err(QueueError::IndexOutOfRange { index, len }.into());
        }

        self.emit_ended(PlaybackEndReason::JumpedToIndex);

        if self.queue.current_index() == Some(index) {
            debug!("Jump to current index {}: seeking to start", index);
            self.restart_current();
        } else {
            let play_when_ready = self.play_when_ready(play_when_ready);
            let change = self.queue.jump(index)?;
            self.dispatch(change, play_when_ready);
            self.emit_queue_changed(QueueChangeTrigger::Navigation);
        }
        Ok(())
    }

    /// Reorder entries; the current item keeps playing
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        self.queue.move_item(from, to)?;
        self.emit_queue_changed(QueueChangeTrigger::UserReorder);
        Ok(())
    }

    pub fn remove_upcoming_items(&mut self) -> usize {
        let removed = self.queue.remove_upcoming();
        self.emit_queue_changed(QueueChangeTrigger::UserDequeue);
        removed
    }

    pub fn remove_previous_items(&mut self) -> usize {
        let removed = self.queue.remove_previous();
        self.emit_queue_changed(QueueChangeTrigger::UserDequeue);
        removed
    }

    /// Empty the queue and unload the engine
    pub fn clear(&mut self) {
        self.cancel_deferred();
        if let Some(change) = self.queue.clear() {
            // Nothing is left to load
            self.dispatch(change, false);
        }
        self.detector.rearm();
        self.emit_queue_changed(QueueChangeTrigger::Cleared);
    }

    // ========================================
    // Transport and policy
    // ========================================

    /// Resume playback; an ended item restarts from zero
    pub fn play(&mut self) {
        if self.current_token.is_none() {
            return;
        }
        if self.engine.state() == EngineState::Ended {
            self.engine.seek(Duration::ZERO);
            self.detector.rearm();
        }
        self.engine.play();
    }

    pub fn pause(&mut self) {
        self.cancel_deferred();
        self.detector.rearm();
        self.engine.pause();
    }

    pub fn seek(&mut self, position: Duration) {
        self.cancel_deferred();
        self.detector.rearm();
        self.engine.seek(position);
    }

    /// Set the output level that fades are computed against
    pub fn set_volume(&mut self, volume: f32) {
        self.envelopes.set_base_volume(volume);
        if !self.envelopes.is_active() {
            self.engine.set_volume(self.envelopes.base_volume());
        }
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        if self.repeat_mode == mode {
            return;
        }
        info!("Repeat mode {} -> {}", self.repeat_mode, mode);
        self.repeat_mode = mode;
        self.events.emit_lossy(PlayerEvent::RepeatModeChanged {
            mode,
            timestamp: chrono::Utc::now(),
        });
    }

    // ========================================
    // Read-only views
    // ========================================

    pub fn current_item(&self) -> Option<&E::Item> {
        self.queue.current()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.queue.current_index()
    }

    pub fn items(&self) -> &[E::Item] {
        self.queue.items()
    }

    pub fn previous_items(&self) -> &[E::Item] {
        self.queue.previous_items()
    }

    pub fn next_items(&self) -> &[E::Item] {
        self.queue.next_items()
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    pub fn volume(&self) -> f32 {
        self.envelopes.base_volume()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Number of automatic queue advances at track boundaries
    pub fn handoff_count(&self) -> u64 {
        self.handoffs
    }

    // ========================================
    // Timeline inputs
    // ========================================

    /// Position tick: sample the engine and run the transition detector
    ///
    /// Dormant under track repeat, which is handled by the end-of-media
    /// callback alone.
    pub fn on_tick(&mut self) {
        if self.repeat_mode == RepeatMode::Track || self.engine.state() != EngineState::Playing {
            return;
        }
        let (Some(token), Some(duration)) = (self.current_token, self.engine.duration()) else {
            return;
        };

        let sample = PositionSample {
            elapsed: self.engine.position(),
            duration,
            token,
        };

        match self.detector.on_sample(sample) {
            Detection::Idle => {}
            Detection::BeginFadeOut => {
                debug!("Fade-out starting, {:?} remaining", sample.remaining());
                if self.envelopes.cancel_fade_in() {
                    debug!("Fade-in cut short at volume {}", self.engine.volume());
                }
                let steps = self.envelopes.start_fade_out(self.engine.volume());
                self.deferred.schedule_run(steps);
            }
            Detection::Boundary => self.finish_boundary(token, BoundaryTrigger::PositionPoll),
        }
    }

    pub fn on_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::PlayedToEnd { token } => self.on_item_played_to_end(token),
        }
    }

    /// Apply a deferred callback unless it was superseded
    pub fn on_deferred(&mut self, callback: Deferred) {
        match callback {
            Deferred::Envelope(step) => {
                let Some(effect) = self.envelopes.apply(step) else {
                    return;
                };
                self.engine.set_volume(effect.volume);
                if effect.preload {
                    if let Some(next) = self.successor().cloned() {
                        debug!("Preloading next item mid-fade");
                        self.engine.preload(&next);
                    }
                }
            }
            Deferred::Replay { generation } => {
                if generation != self.replay_generation || self.current_token.is_none() {
                    debug!("Discarding superseded replay (generation {})", generation);
                    return;
                }
                info!("Replaying current item");
                self.detector.rearm();
                self.engine.seek(Duration::ZERO);
                self.engine.play();
            }
        }
    }

    /// Stop all deferred work before the timeline exits
    pub fn teardown(&mut self) {
        self.cancel_deferred();
    }

    /// Guarded advance shared by both boundary triggers
    ///
    /// At most one advance per load: the second trigger for the same
    /// boundary finds the guard already claimed and returns.
    pub fn finish_boundary(&mut self, token: LoadToken, trigger: BoundaryTrigger) {
        if self.current_token != Some(token) {
            debug!("Ignoring boundary of stale load {} ({:?})", token, trigger);
            return;
        }
        if !self.detector.guard_mut().try_begin(token) {
            debug!("Boundary of {} already handled ({:?})", token, trigger);
            return;
        }

        self.emit_ended(PlaybackEndReason::PlayedUntilEnd);

        let wrap = self.repeat_mode.wraps();
        if self.queue.has_next(wrap) {
            info!("Track boundary via {:?}: handing off", trigger);
            match self.queue.next(wrap).change {
                Some(QueueChange::SkippedToSameCurrentItem) => self.reload_current(),
                Some(change) => self.dispatch(change, true),
                None => {}
            }

            if self.config.fade_in_enabled {
                self.engine.set_volume(0.0);
                let steps = self.envelopes.start_fade_in();
                self.deferred.schedule_run(steps);
            }
            self.engine.play();
            self.handoffs += 1;
            self.emit_queue_changed(QueueChangeTrigger::Handoff);
        } else {
            info!("Track boundary via {:?}: end of queue", trigger);
            self.cancel_envelopes();
            self.engine.set_ended();
        }

        self.detector.guard_mut().finish();
    }

    // ========================================
    // Queue change listener
    // ========================================

    fn dispatch(&mut self, change: QueueChange<E::Item>, play_when_ready: bool) {
        match change {
            QueueChange::CurrentItemChanged {
                item,
                index,
                previous_item,
                previous_index,
            } => self.on_current_item_changed(
                item,
                index,
                previous_item,
                previous_index,
                play_when_ready,
            ),
            QueueChange::SkippedToSameCurrentItem => self.on_skipped_to_same_current_item(),
            QueueChange::ReceivedFirstItem => self.on_received_first_item(play_when_ready),
        }
    }

    fn on_current_item_changed(
        &mut self,
        item: Option<E::Item>,
        index: Option<usize>,
        previous_item: Option<E::Item>,
        previous_index: Option<usize>,
        play_when_ready: bool,
    ) {
        let previous_position = if self.current_token.is_some() {
            self.engine.position()
        } else {
            Duration::ZERO
        };

        self.cancel_deferred();

        match &item {
            Some(next) => {
                let token = self.issue_token();
                info!("Loading item {:?} at index {:?} ({})", next, index, token);
                self.engine.load(next, token, play_when_ready);
            }
            None => {
                info!("Queue empty, clearing engine");
                self.current_token = None;
                self.engine.clear();
            }
        }

        self.events.emit_lossy(PlayerEvent::CurrentItemChanged {
            item,
            index,
            previous_item,
            previous_index,
            previous_position_ms: previous_position.as_millis() as u64,
            timestamp: chrono::Utc::now(),
        });
    }

    fn on_skipped_to_same_current_item(&mut self) {
        if self.engine.state() == EngineState::Playing {
            debug!("Navigation resolved to current item: restarting");
            self.restart_current();
        }
    }

    fn on_received_first_item(&mut self, play_when_ready: bool) {
        if self.queue.current_index().is_some() {
            return;
        }
        match self.queue.jump(0) {
            Ok(change) => self.dispatch(change, play_when_ready),
            Err(e) => warn!("Could not activate first item: {}", e),
        }
    }

    // ========================================
    // Helpers
    // ========================================

    fn skip(&mut self, forward: bool, play_when_ready: Option<bool>) {
        let play_when_ready = self.play_when_ready(play_when_ready);
        let was_playing = self.engine.state() == EngineState::Playing;
        let wrap = self.repeat_mode.wraps();

        let nav: Navigation<E::Item> = if forward {
            self.queue.next(wrap)
        } else {
            self.queue.previous(wrap)
        };
        let moved = nav.moved();
        let Some(change) = nav.change else {
            return;
        };

        if was_playing && (moved || wrap) {
            self.emit_ended(if forward {
                PlaybackEndReason::SkippedToNext
            } else {
                PlaybackEndReason::SkippedToPrevious
            });
        }

        self.dispatch(change, play_when_ready);
        if moved {
            self.emit_queue_changed(QueueChangeTrigger::Navigation);
        }
    }

    /// Seek the loaded item back to zero without reloading it
    fn restart_current(&mut self) {
        self.cancel_deferred();
        self.detector.rearm();
        self.engine.seek(Duration::ZERO);
    }

    /// Load the current item again under a fresh token
    fn reload_current(&mut self) {
        let item = self.queue.current().cloned();
        let index = self.queue.current_index();
        self.on_current_item_changed(item.clone(), index, item, index, true);
    }

    /// Item that would play after the current one under the repeat policy
    fn successor(&self) -> Option<&E::Item> {
        match self.queue.next_items().first() {
            Some(next) => Some(next),
            None if self.repeat_mode.wraps() => self.queue.items().first(),
            None => None,
        }
    }

    fn on_item_played_to_end(&mut self, token: LoadToken) {
        if self.current_token != Some(token) {
            debug!("Ignoring end-of-media for stale load {}", token);
            return;
        }

        if self.repeat_mode == RepeatMode::Track {
            info!("Track repeat: replaying in {:?}", self.config.repeat_settle_delay());
            self.cancel_deferred();
            self.engine.pause();
            self.emit_ended(PlaybackEndReason::PlayedUntilEnd);
            self.deferred.schedule(
                self.config.repeat_settle_delay(),
                Deferred::Replay {
                    generation: self.replay_generation,
                },
            );
            return;
        }

        self.finish_boundary(token, BoundaryTrigger::EngineCallback);
    }

    fn issue_token(&mut self) -> LoadToken {
        self.last_token = self.last_token.next();
        self.current_token = Some(self.last_token);
        self.last_token
    }

    fn play_when_ready(&self, requested: Option<bool>) -> bool {
        requested.unwrap_or(self.config.play_when_ready)
    }

    /// Cancel fades and any pending replay
    fn cancel_deferred(&mut self) {
        self.cancel_envelopes();
        self.replay_generation += 1;
    }

    /// Cancel fades and put the output back at the base volume
    fn cancel_envelopes(&mut self) {
        self.envelopes.cancel_all();
        let base = self.envelopes.base_volume();
        if (self.engine.volume() - base).abs() > f32::EPSILON {
            debug!("Restoring volume to {}", base);
            self.engine.set_volume(base);
        }
    }

    fn emit_ended(&self, reason: PlaybackEndReason) {
        self.events.emit_lossy(PlayerEvent::PlaybackEnded {
            reason,
            timestamp: chrono::Utc::now(),
        });
    }

    fn emit_queue_changed(&self, trigger: QueueChangeTrigger) {
        self.events.emit_lossy(PlayerEvent::QueueChanged {
            length: self.queue.len(),
            current_index: self.queue.current_index(),
            trigger,
            timestamp: chrono::Utc::now(),
        });
    }
}
