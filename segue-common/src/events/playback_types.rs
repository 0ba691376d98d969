//! Playback-related type definitions
//!
//! Supporting types for track-boundary completion events.

use serde::{Deserialize, Serialize};

/// Why the previously current item stopped playing
///
/// Carried by `PlayerEvent::PlaybackEnded`. Consumers use it to tell a
/// natural end of track apart from user navigation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackEndReason {
    /// Item reached its end (detector handoff or engine end-of-media)
    PlayedUntilEnd,
    /// User skipped forward
    SkippedToNext,
    /// User skipped backward
    SkippedToPrevious,
    /// User jumped to an explicit queue index
    JumpedToIndex,
}

impl std::fmt::Display for PlaybackEndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackEndReason::PlayedUntilEnd => write!(f, "playedUntilEnd"),
            PlaybackEndReason::SkippedToNext => write!(f, "skippedToNext"),
            PlaybackEndReason::SkippedToPrevious => write!(f, "skippedToPrevious"),
            PlaybackEndReason::JumpedToIndex => write!(f, "jumpedToIndex"),
        }
    }
}
