//! Clock-driven playback engine without audio output
//!
//! Position advances with the tokio clock, so paused-time tests can drive a
//! whole playlist deterministically. Every command is recorded in an
//! [`EngineLog`] shared with the caller.

use super::engine::{EngineEvent, EngineEventSender, EngineState, LoadToken, PlaybackEngine};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};
use uuid::Uuid;

/// Playable item for the simulated engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: Uuid,
    pub title: String,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

impl Track {
    pub fn new(title: impl Into<String>, duration: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            duration,
        }
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}ms)", self.title, self.duration.as_millis())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

/// Command received by the simulated engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    Load {
        track: Track,
        token: LoadToken,
        play_when_ready: bool,
    },
    Preload(Track),
    Play,
    Pause,
    Seek(Duration),
    Clear,
    SetEnded,
    SetVolume(f32),
}

/// Shared record of engine commands
#[derive(Debug, Clone, Default)]
pub struct EngineLog {
    commands: Arc<Mutex<Vec<EngineCommand>>>,
}

impl EngineLog {
    fn push(&self, command: EngineCommand) {
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(command);
        }
    }

    pub fn commands(&self) -> Vec<EngineCommand> {
        self.commands
            .lock()
            .map(|commands| commands.clone())
            .unwrap_or_default()
    }

    /// Every load in order, with its token
    pub fn loads(&self) -> Vec<(Track, LoadToken)> {
        self.commands()
            .into_iter()
            .filter_map(|command| match command {
                EngineCommand::Load { track, token, .. } => Some((track, token)),
                _ => None,
            })
            .collect()
    }

    pub fn last_token(&self) -> Option<LoadToken> {
        self.loads().last().map(|(_, token)| *token)
    }

    pub fn seeks(&self) -> Vec<Duration> {
        self.commands()
            .into_iter()
            .filter_map(|command| match command {
                EngineCommand::Seek(position) => Some(position),
                _ => None,
            })
            .collect()
    }

    pub fn volumes(&self) -> Vec<f32> {
        self.commands()
            .into_iter()
            .filter_map(|command| match command {
                EngineCommand::SetVolume(volume) => Some(volume),
                _ => None,
            })
            .collect()
    }

    pub fn preloads(&self) -> Vec<Track> {
        self.commands()
            .into_iter()
            .filter_map(|command| match command {
                EngineCommand::Preload(track) => Some(track),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&EngineCommand) -> bool) -> usize {
        self.commands().iter().filter(|command| predicate(command)).count()
    }
}

/// Engine whose position is driven by the tokio clock
pub struct SimulatedEngine {
    callbacks: EngineEventSender,
    log: EngineLog,
    loaded: Option<(Track, LoadToken)>,
    state: EngineState,
    volume: f32,
    /// Position accumulated up to `playing_since`
    offset: Duration,
    playing_since: Option<Instant>,
    end_timer: Option<JoinHandle<()>>,
}

impl SimulatedEngine {
    pub fn new(callbacks: EngineEventSender) -> Self {
        Self {
            callbacks,
            log: EngineLog::default(),
            loaded: None,
            state: EngineState::Idle,
            volume: 1.0,
            offset: Duration::ZERO,
            playing_since: None,
            end_timer: None,
        }
    }

    /// Shared command log, usable after the engine moves onto the timeline
    pub fn log(&self) -> EngineLog {
        self.log.clone()
    }

    pub fn loaded(&self) -> Option<&Track> {
        self.loaded.as_ref().map(|(track, _)| track)
    }

    fn track_duration(&self) -> Duration {
        self.loaded
            .as_ref()
            .map(|(track, _)| track.duration)
            .unwrap_or_default()
    }

    /// Freeze the clock-driven position into `offset`
    fn freeze(&mut self) {
        if let Some(since) = self.playing_since.take() {
            self.offset = (self.offset + since.elapsed()).min(self.track_duration());
        }
        self.cancel_timer();
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.end_timer.take() {
            timer.abort();
        }
    }

    fn start_clock(&mut self) {
        let Some((_, token)) = self.loaded.as_ref() else {
            return;
        };
        let token = *token;
        self.state = EngineState::Playing;
        self.playing_since = Some(Instant::now());

        let remaining = self.track_duration().saturating_sub(self.offset);
        let callbacks = self.callbacks.clone();
        self.cancel_timer();
        self.end_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            trace!("Simulated end of media for {}", token);
            let _ = callbacks.send(EngineEvent::PlayedToEnd { token });
        }));
    }
}

impl PlaybackEngine for SimulatedEngine {
    type Item = Track;

    fn load(&mut self, item: &Track, token: LoadToken, play_when_ready: bool) {
        self.log.push(EngineCommand::Load {
            track: item.clone(),
            token,
            play_when_ready,
        });
        self.freeze();
        debug!("Simulated load of {} ({})", item, token);

        self.loaded = Some((item.clone(), token));
        self.offset = Duration::ZERO;
        self.state = EngineState::Ready;
        if play_when_ready {
            self.start_clock();
        }
    }

    fn preload(&mut self, item: &Track) {
        self.log.push(EngineCommand::Preload(item.clone()));
    }

    fn play(&mut self) {
        self.log.push(EngineCommand::Play);
        match self.state {
            EngineState::Ready | EngineState::Paused => self.start_clock(),
            _ => {}
        }
    }

    fn pause(&mut self) {
        self.log.push(EngineCommand::Pause);
        if self.state == EngineState::Playing {
            self.freeze();
            self.state = EngineState::Paused;
        }
    }

    fn seek(&mut self, position: Duration) {
        self.log.push(EngineCommand::Seek(position));
        if self.loaded.is_none() {
            return;
        }
        let was_playing = self.state == EngineState::Playing;
        self.freeze();
        self.offset = position.min(self.track_duration());
        if self.state == EngineState::Ended {
            self.state = EngineState::Ready;
        }
        if was_playing {
            self.start_clock();
        }
    }

    fn clear(&mut self) {
        self.log.push(EngineCommand::Clear);
        self.freeze();
        self.loaded = None;
        self.offset = Duration::ZERO;
        self.state = EngineState::Idle;
    }

    fn position(&self) -> Duration {
        let running = self
            .playing_since
            .map(|since| since.elapsed())
            .unwrap_or_default();
        (self.offset + running).min(self.track_duration())
    }

    fn duration(&self) -> Option<Duration> {
        self.loaded.as_ref().map(|(track, _)| track.duration)
    }

    fn state(&self) -> EngineState {
        self.state
    }

    fn set_ended(&mut self) {
        self.log.push(EngineCommand::SetEnded);
        self.freeze();
        self.state = EngineState::Ended;
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.log.push(EngineCommand::SetVolume(volume));
        self.volume = volume;
    }
}

impl Drop for SimulatedEngine {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
