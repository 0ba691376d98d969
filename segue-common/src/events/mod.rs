//! Event types for the segue event system
//!
//! Provides the observer-facing event definitions and the EventBus used to
//! publish them.

mod playback_types;
mod queue_types;

pub use playback_types::PlaybackEndReason;
pub use queue_types::{QueueChangeTrigger, RepeatMode};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Events published by the playback controller
///
/// Generic over the queue item type. Events are broadcast via EventBus and
/// can be serialized (one JSON object per event, tagged by `type`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent<T> {
    /// The queue's current item changed and the engine was (re)loaded
    ///
    /// `previous_position_ms` is the engine position captured just before
    /// the change, so consumers can tell "track changed" apart from
    /// "position reset within the same track".
    CurrentItemChanged {
        /// New current item (None when the queue became empty)
        item: Option<T>,
        /// New cursor
        index: Option<usize>,
        /// Item that was current before the change
        previous_item: Option<T>,
        /// Cursor before the change
        previous_index: Option<usize>,
        /// Playback position of the previous item at the moment of change
        previous_position_ms: u64,
        /// When the change happened
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback of the previously current item ended
    PlaybackEnded {
        /// How it ended
        reason: PlaybackEndReason,
        /// When it ended
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Queue contents or cursor changed
    QueueChanged {
        /// Number of entries after the change
        length: usize,
        /// Cursor after the change
        current_index: Option<usize>,
        /// Why the queue changed
        trigger: QueueChangeTrigger,
        /// When the queue changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Repeat policy changed
    RepeatModeChanged {
        mode: RepeatMode,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl<T> PlayerEvent<T> {
    /// Short event name, used for logging
    pub fn name(&self) -> &'static str {
        match self {
            PlayerEvent::CurrentItemChanged { .. } => "CurrentItemChanged",
            PlayerEvent::PlaybackEnded { .. } => "PlaybackEnded",
            PlayerEvent::QueueChanged { .. } => "QueueChanged",
            PlayerEvent::RepeatModeChanged { .. } => "RepeatModeChanged",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus for controller events
///
/// Uses tokio::broadcast internally:
/// - Non-blocking publish (slow subscribers don't block the controller)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use segue_common::events::{EventBus, PlaybackEndReason, PlayerEvent};
///
/// let event_bus: EventBus<String> = EventBus::new(16);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(PlayerEvent::PlaybackEnded {
///     reason: PlaybackEndReason::SkippedToNext,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(PlayerEvent::PlaybackEnded { .. })));
/// ```
#[derive(Clone)]
pub struct EventBus<T> {
    tx: broadcast::Sender<PlayerEvent<T>>,
    capacity: usize,
}

impl<T: Clone> EventBus<T> {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent<T>> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PlayerEvent<T>,
    ) -> Result<usize, broadcast::error::SendError<PlayerEvent<T>>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: PlayerEvent<T>) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
