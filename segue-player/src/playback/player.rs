//! Playback timeline task
//!
//! Owns the [`PlaybackController`] on a single task. User commands, position
//! ticks, engine callbacks and deferred callbacks are all delivered through
//! one `select!` loop, so the controller's state is only ever touched from
//! this task and each input runs to completion before the next.

use super::controller::PlaybackController;
use super::deferred::{DeferredReceiver, DeferredScheduler};
use super::engine::{EngineEventReceiver, PlaybackEngine};
use crate::config::PlayerConfig;
use crate::error::{Error, Result};
use segue_common::events::{EventBus, PlayerEvent, RepeatMode};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

type Job<E> = Box<dyn FnOnce(&mut PlaybackController<E>) + Send>;

enum Message<E: PlaybackEngine> {
    Job(Job<E>),
    Shutdown,
}

/// Running playback timeline
pub struct Player<E: PlaybackEngine> {
    handle: PlayerHandle<E>,
    task: JoinHandle<()>,
}

impl<E: PlaybackEngine> Player<E> {
    /// Spawn the timeline for `engine`, whose callbacks arrive on `engine_events`
    pub fn spawn(engine: E, engine_events: EngineEventReceiver, config: PlayerConfig) -> Self {
        let events = EventBus::new(config.event_capacity);
        let (deferred, deferred_rx) = DeferredScheduler::new();
        let tick = config.tick_interval();
        let controller = PlaybackController::new(engine, config, deferred, events.clone());

        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_timeline(controller, rx, engine_events, deferred_rx, tick));

        Self {
            handle: PlayerHandle { tx, events },
            task,
        }
    }

    pub fn handle(&self) -> PlayerHandle<E> {
        self.handle.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent<E::Item>> {
        self.handle.subscribe()
    }

    /// Stop the timeline and wait for it to exit
    ///
    /// Safe to call while commands are still queued; they run first.
    pub async fn shutdown(self) {
        let _ = self.handle.tx.send(Message::Shutdown);
        if let Err(e) = self.task.await {
            tracing::error!("Playback timeline task failed: {}", e);
        }
    }
}

async fn run_timeline<E: PlaybackEngine>(
    mut controller: PlaybackController<E>,
    mut commands: mpsc::UnboundedReceiver<Message<E>>,
    mut engine_events: EngineEventReceiver,
    mut deferred: DeferredReceiver,
    tick: Duration,
) {
    let mut interval = time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Playback timeline started ({}ms tick)", tick.as_millis());

    loop {
        tokio::select! {
            biased;

            message = commands.recv() => match message {
                Some(Message::Job(job)) => job(&mut controller),
                Some(Message::Shutdown) | None => break,
            },
            Some(event) = engine_events.recv() => {
                debug!("Engine event: {:?}", event);
                controller.on_engine_event(event);
            }
            Some(callback) = deferred.recv() => controller.on_deferred(callback),
            _ = interval.tick() => controller.on_tick(),
        }
    }

    // Release the position subscription before anything else is torn down
    drop(interval);
    controller.teardown();
    info!("Playback timeline stopped");
}

/// Cloneable handle for sending commands to the timeline
pub struct PlayerHandle<E: PlaybackEngine> {
    tx: mpsc::UnboundedSender<Message<E>>,
    events: EventBus<E::Item>,
}

impl<E: PlaybackEngine> Clone for PlayerHandle<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            events: self.events.clone(),
        }
    }
}

impl<E: PlaybackEngine> PlayerHandle<E> {
    /// Run `f` against the controller on the timeline and return its result
    pub async fn with<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut PlaybackController<E>) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job<E> = Box::new(move |controller| {
            let _ = reply_tx.send(f(controller));
        });
        self.tx
            .send(Message::Job(job))
            .map_err(|_| Error::PlayerStopped)?;
        reply_rx.await.map_err(|_| Error::PlayerStopped)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent<E::Item>> {
        self.events.subscribe()
    }

    pub async fn load(&self, item: E::Item, play_when_ready: Option<bool>) -> Result<()> {
        self.with(move |c| c.load(item, play_when_ready)).await
    }

    pub async fn add(&self, items: Vec<E::Item>, play_when_ready: Option<bool>) -> Result<()> {
        self.with(move |c| c.add(items, play_when_ready)).await
    }

    pub async fn add_at(
        &self,
        items: Vec<E::Item>,
        index: usize,
        play_when_ready: Option<bool>,
    ) -> Result<()> {
        self.with(move |c| c.add_at(items, index, play_when_ready)).await?
    }

    pub async fn next(&self, play_when_ready: Option<bool>) -> Result<()> {
        self.with(move |c| c.next(play_when_ready)).await
    }

    pub async fn previous(&self, play_when_ready: Option<bool>) -> Result<()> {
        self.with(move |c| c.previous(play_when_ready)).await
    }

    pub async fn remove_item(
        &self,
        index: usize,
        play_when_ready: Option<bool>,
    ) -> Result<E::Item> {
        self.with(move |c| c.remove_item(index, play_when_ready)).await?
    }

    pub async fn jump_to_item(&self, index: usize, play_when_ready: Option<bool>) -> Result<()> {
        self.with(move |c| c.jump_to_item(index, play_when_ready)).await?
    }

    pub async fn move_item(&self, from: usize, to: usize) -> Result<()> {
        self.with(move |c| c.move_item(from, to)).await?
    }

    pub async fn remove_upcoming_items(&self) -> Result<usize> {
        self.with(|c| c.remove_upcoming_items()).await
    }

    pub async fn remove_previous_items(&self) -> Result<usize> {
        self.with(|c| c.remove_previous_items()).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.with(|c| c.clear()).await
    }

    pub async fn play(&self) -> Result<()> {
        self.with(|c| c.play()).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.with(|c| c.pause()).await
    }

    pub async fn seek(&self, position: Duration) -> Result<()> {
        self.with(move |c| c.seek(position)).await
    }

    pub async fn set_volume(&self, volume: f32) -> Result<()> {
        self.with(move |c| c.set_volume(volume)).await
    }

    pub async fn set_repeat_mode(&self, mode: RepeatMode) -> Result<()> {
        self.with(move |c| c.set_repeat_mode(mode)).await
    }

    pub async fn current_item(&self) -> Result<Option<E::Item>> {
        self.with(|c| c.current_item().cloned()).await
    }

    pub async fn current_index(&self) -> Result<Option<usize>> {
        self.with(|c| c.current_index()).await
    }

    pub async fn items(&self) -> Result<Vec<E::Item>> {
        self.with(|c| c.items().to_vec()).await
    }

    pub async fn previous_items(&self) -> Result<Vec<E::Item>> {
        self.with(|c| c.previous_items().to_vec()).await
    }

    pub async fn next_items(&self) -> Result<Vec<E::Item>> {
        self.with(|c| c.next_items().to_vec()).await
    }

    pub async fn repeat_mode(&self) -> Result<RepeatMode> {
        self.with(|c| c.repeat_mode()).await
    }

    pub async fn handoff_count(&self) -> Result<u64> {
        self.with(|c| c.handoff_count()).await
    }
}
