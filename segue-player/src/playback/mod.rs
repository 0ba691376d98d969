//! Queue-driven playback transitions
//!
//! The queue, transition detector and fade envelopes are plain state; the
//! controller composes them with a [`PlaybackEngine`], and the player runs the
//! controller on a single timeline task.

pub mod controller;
pub mod deferred;
pub mod detector;
pub mod engine;
pub mod envelope;
pub mod player;
pub mod queue;
pub mod simulated;

pub use controller::{BoundaryTrigger, PlaybackController};
pub use engine::{engine_channel, EngineEvent, EngineState, LoadToken, PlaybackEngine};
pub use player::{Player, PlayerHandle};
pub use queue::{Queue, QueueChange};
pub use simulated::{EngineCommand, EngineLog, SimulatedEngine, Track};
