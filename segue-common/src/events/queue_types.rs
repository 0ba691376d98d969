//! Queue and repeat-mode type definitions
//!
//! Supporting types for queue management and navigation policy.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Repeat policy applied at the end of the current item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop after the last item
    #[default]
    Off,
    /// Replay the current item indefinitely
    Track,
    /// Wrap to the start after the last item (and to the end before the first)
    Queue,
}

impl RepeatMode {
    /// Whether cursor navigation wraps around the queue ends
    pub fn wraps(&self) -> bool {
        matches!(self, RepeatMode::Queue)
    }
}

impl std::fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepeatMode::Off => write!(f, "off"),
            RepeatMode::Track => write!(f, "track"),
            RepeatMode::Queue => write!(f, "queue"),
        }
    }
}

impl FromStr for RepeatMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" | "none" => Ok(RepeatMode::Off),
            "track" | "one" => Ok(RepeatMode::Track),
            "queue" | "all" => Ok(RepeatMode::Queue),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown repeat mode '{}'",
                other
            ))),
        }
    }
}

/// Why the queue changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum QueueChangeTrigger {
    UserEnqueue,
    UserDequeue,
    UserReorder,
    Navigation,
    Handoff,
    Cleared,
}

impl std::fmt::Display for QueueChangeTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueChangeTrigger::UserEnqueue => write!(f, "UserEnqueue"),
            QueueChangeTrigger::UserDequeue => write!(f, "UserDequeue"),
            QueueChangeTrigger::UserReorder => write!(f, "UserReorder"),
            QueueChangeTrigger::Navigation => write!(f, "Navigation"),
            QueueChangeTrigger::Handoff => write!(f, "Handoff"),
            QueueChangeTrigger::Cleared => write!(f, "Cleared"),
        }
    }
}
