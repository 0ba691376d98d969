//! Shared harness for playback timeline tests
//!
//! Runs a [`Player`] over the clock-driven [`SimulatedEngine`]; tests use
//! `#[tokio::test(start_paused = true)]` so track time is virtual.

#![allow(dead_code)]

use segue_common::{PlaybackEndReason, PlayerEvent};
use segue_player::playback::{
    engine_channel, EngineEvent, EngineLog, LoadToken, PlaybackEngine, SimulatedEngine, Track,
};
use segue_player::{Player, PlayerConfig, PlayerHandle};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::mpsc::UnboundedSender;

pub struct Harness {
    pub player: Player<SimulatedEngine>,
    pub handle: PlayerHandle<SimulatedEngine>,
    pub log: EngineLog,
    pub events: broadcast::Receiver<PlayerEvent<Track>>,
    /// Extra sender into the engine callback channel, for injecting callbacks
    pub callbacks: UnboundedSender<EngineEvent>,
}

impl Harness {
    pub fn start(config: PlayerConfig) -> Self {
        let (callbacks, engine_events) = engine_channel();
        let engine = SimulatedEngine::new(callbacks.clone());
        let log = engine.log();
        let player = Player::spawn(engine, engine_events, config);
        let handle = player.handle();
        let events = handle.subscribe();

        Self {
            player,
            handle,
            log,
            events,
            callbacks,
        }
    }

    /// Inject an end-of-media callback as the engine would send it
    pub fn played_to_end(&self, token: LoadToken) {
        self.callbacks
            .send(EngineEvent::PlayedToEnd { token })
            .expect("timeline should be running");
    }

    /// Everything emitted since the last drain
    pub fn drain(&mut self) -> Vec<PlayerEvent<Track>> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }

    pub async fn engine_volume(&self) -> f32 {
        self.handle.with(|c| c.engine().volume()).await.unwrap()
    }

    pub async fn engine_state(&self) -> segue_player::playback::EngineState {
        self.handle.with(|c| c.engine().state()).await.unwrap()
    }
}

/// Config with fade-in disabled, so volume logs only show the fade-out
pub fn no_fade_in() -> PlayerConfig {
    PlayerConfig {
        fade_in_enabled: false,
        ..PlayerConfig::default()
    }
}

pub fn tracks(count: usize, ms: u64) -> Vec<Track> {
    (1..=count)
        .map(|n| Track::new(format!("Track {}", n), Duration::from_millis(ms)))
        .collect()
}

pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

pub fn ended_reasons(events: &[PlayerEvent<Track>]) -> Vec<PlaybackEndReason> {
    events
        .iter()
        .filter_map(|event| match event {
            PlayerEvent::PlaybackEnded { reason, .. } => Some(*reason),
            _ => None,
        })
        .collect()
}

/// (item, index, previous_item, previous_index) of each item change
pub fn item_changes(
    events: &[PlayerEvent<Track>],
) -> Vec<(Option<Track>, Option<usize>, Option<Track>, Option<usize>)> {
    events
        .iter()
        .filter_map(|event| match event {
            PlayerEvent::CurrentItemChanged {
                item,
                index,
                previous_item,
                previous_index,
                ..
            } => Some((
                item.clone(),
                *index,
                previous_item.clone(),
                *previous_index,
            )),
            _ => None,
        })
        .collect()
}

pub fn assert_volumes(actual: &[f32], expected: &[f32]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "volume sequence {:?} != {:?}",
        actual,
        expected
    );
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-4, "volume sequence {:?} != {:?}", actual, expected);
    }
}
