//! # Segue Player Library (segue-player)
//!
//! Queue-driven playback-transition controller.
//!
//! **Purpose:** Keep an ordered queue with a current item, detect the end of
//! each item, fade out and hand off to the next item exactly once per
//! boundary, and report queue and playback events to subscribers.
//!
//! **Architecture:** One timeline task per player. The external decode/render
//! engine is reached through the [`playback::PlaybackEngine`] trait; a
//! clock-driven [`playback::SimulatedEngine`] is included for the demo binary
//! and tests.

pub mod config;
pub mod error;
pub mod playback;

pub use config::PlayerConfig;
pub use error::{Error, QueueError, Result};
pub use playback::{Player, PlayerHandle};
