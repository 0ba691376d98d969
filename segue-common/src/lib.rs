//! # Segue Common Library
//!
//! Shared code for the segue playback controller and its consumers:
//! - Event types (`PlayerEvent`) and the broadcast `EventBus`
//! - Repeat-mode policy
//! - Fade curve definitions and calculations
//! - Configuration file discovery and TOML loading

pub mod config;
pub mod error;
pub mod events;
pub mod fade_curves;

pub use error::{Error, Result};
pub use events::{EventBus, PlaybackEndReason, PlayerEvent, QueueChangeTrigger, RepeatMode};
pub use fade_curves::FadeCurve;
