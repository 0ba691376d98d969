//! Playback engine boundary
//!
//! The decode/render engine is an external collaborator. The controller
//! drives it through [`PlaybackEngine`] (fire-and-forget commands plus
//! position/state readouts) and observes its callbacks as [`EngineEvent`]s
//! delivered on the controller's timeline.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;
use tokio::sync::mpsc;

/// Identifies one `load` of an item into the engine
///
/// Issued by the controller, strictly increasing. The engine echoes it back
/// in callbacks so that callbacks about an item that has already been
/// replaced can be recognised as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LoadToken(u64);

impl LoadToken {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for LoadToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Engine playback state as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    /// Nothing loaded
    Idle,
    /// Item loaded, preparing
    Loading,
    /// Prepared, not playing
    Ready,
    Playing,
    Paused,
    /// Terminal: played to the end with nothing to advance to
    Ended,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::Idle => write!(f, "idle"),
            EngineState::Loading => write!(f, "loading"),
            EngineState::Ready => write!(f, "ready"),
            EngineState::Playing => write!(f, "playing"),
            EngineState::Paused => write!(f, "paused"),
            EngineState::Ended => write!(f, "ended"),
        }
    }
}

/// Callbacks from the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// The item loaded under `token` played to its end
    PlayedToEnd { token: LoadToken },
}

/// Sending half handed to an engine for its callbacks
pub type EngineEventSender = mpsc::UnboundedSender<EngineEvent>;

/// Receiving half consumed by the playback timeline
pub type EngineEventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

/// Create the callback channel between an engine and the timeline
pub fn engine_channel() -> (EngineEventSender, EngineEventReceiver) {
    mpsc::unbounded_channel()
}

/// Commands and readouts the controller needs from a playback engine
///
/// All commands are fire-and-forget; results are observed through later
/// readouts and [`EngineEvent`] callbacks.
pub trait PlaybackEngine: Send + 'static {
    /// Opaque playable unit; only identity/equality is used
    type Item: Clone + PartialEq + Debug + Send + Sync + 'static;

    /// Replace whatever is loaded with `item`
    ///
    /// `play_when_ready` asks the engine to start playback once prepared.
    fn load(&mut self, item: &Self::Item, token: LoadToken, play_when_ready: bool);

    /// Hint that `item` will be loaded soon
    fn preload(&mut self, _item: &Self::Item) {}

    fn play(&mut self);

    fn pause(&mut self);

    fn seek(&mut self, position: Duration);

    /// Unload everything
    fn clear(&mut self);

    /// Elapsed position of the loaded item
    fn position(&self) -> Duration;

    /// Duration of the loaded item, if known
    fn duration(&self) -> Option<Duration>;

    fn state(&self) -> EngineState;

    /// Enter the terminal `Ended` state
    fn set_ended(&mut self);

    fn volume(&self) -> f32;

    fn set_volume(&mut self, volume: f32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_ordering() {
        let first = LoadToken::new(1);
        let second = first.next();
        assert!(second > first);
        assert_eq!(second.value(), 2);
        assert_eq!(second.to_string(), "#2");
    }

    #[tokio::test]
    async fn test_engine_channel_delivers_callbacks() {
        let (tx, mut rx) = engine_channel();
        tx.send(EngineEvent::PlayedToEnd {
            token: LoadToken::new(7),
        })
        .unwrap();

        assert_eq!(
            rx.recv().await,
            Some(EngineEvent::PlayedToEnd {
                token: LoadToken::new(7)
            })
        );
    }
}
