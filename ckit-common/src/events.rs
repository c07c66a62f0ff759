//! Event types for the CutsceneKit event system
//!
//! Provides the playback lifecycle events and the EventBus used to observe a
//! running playlist from outside the scheduler.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Playlist lifecycle events
///
/// Events are broadcast via EventBus and can be serialized as JSON lines.
/// Observers never influence scheduling; a playlist with no bus attached
/// behaves identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CutsceneEvent {
    /// `begin` started a new drain
    PlaylistStarted {
        playlist_id: Uuid,
        /// Groups waiting in the queue when the drain started
        queued_groups: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A group became active and its members were started
    GroupStarted {
        playlist_id: Uuid,
        group_id: Uuid,
        label: Option<String>,
        member_count: usize,
        /// Index of the member driving the group's completion (None for empty groups)
        designated: Option<usize>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The active group's designated member completed
    GroupCompleted {
        playlist_id: Uuid,
        group_id: Uuid,
        label: Option<String>,
        /// Whether a skip was requested before completion (informational only)
        skip_requested: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// `skip_current` was routed to the active group
    SkipRequested {
        playlist_id: Uuid,
        group_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Groups were appended to the queue
    GroupsAppended {
        playlist_id: Uuid,
        count: usize,
        /// Queue length after the append (active group excluded)
        queue_len: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The queue drained; the playlist completion callback fired
    PlaylistCompleted {
        playlist_id: Uuid,
        groups_played: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl CutsceneEvent {
    /// Short event name, matching the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            CutsceneEvent::PlaylistStarted { .. } => "PlaylistStarted",
            CutsceneEvent::GroupStarted { .. } => "GroupStarted",
            CutsceneEvent::GroupCompleted { .. } => "GroupCompleted",
            CutsceneEvent::SkipRequested { .. } => "SkipRequested",
            CutsceneEvent::GroupsAppended { .. } => "GroupsAppended",
            CutsceneEvent::PlaylistCompleted { .. } => "PlaylistCompleted",
        }
    }

    /// Playlist that emitted the event
    pub fn playlist_id(&self) -> Uuid {
        match self {
            CutsceneEvent::PlaylistStarted { playlist_id, .. }
            | CutsceneEvent::GroupStarted { playlist_id, .. }
            | CutsceneEvent::GroupCompleted { playlist_id, .. }
            | CutsceneEvent::SkipRequested { playlist_id, .. }
            | CutsceneEvent::GroupsAppended { playlist_id, .. }
            | CutsceneEvent::PlaylistCompleted { playlist_id, .. } => *playlist_id,
        }
    }

    /// Serialize as a single JSON line
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Event distribution bus for playlist lifecycle events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block the scheduler)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use ckit_common::events::{CutsceneEvent, EventBus};
/// use uuid::Uuid;
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(CutsceneEvent::PlaylistCompleted {
///     playlist_id: Uuid::new_v4(),
///     groups_played: 3,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CutsceneEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<CutsceneEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: CutsceneEvent,
    ) -> Result<usize, broadcast::error::SendError<CutsceneEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: CutsceneEvent) {
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

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("capacity", &self.capacity)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(playlist_id: Uuid) -> CutsceneEvent {
        CutsceneEvent::PlaylistCompleted {
            playlist_id,
            groups_played: 2,
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_emit_without_subscribers_errors() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        assert!(bus.emit(completed(Uuid::new_v4())).is_err());

        // Lossy variant silently drops
        bus.emit_lossy(completed(Uuid::new_v4()));
    }

    #[tokio::test]
    async fn test_subscribers_receive_events_in_order() {
        let bus = EventBus::new(10);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        let playlist_id = Uuid::new_v4();
        bus.emit(CutsceneEvent::SkipRequested {
            playlist_id,
            group_id: Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
        })
        .unwrap();
        bus.emit(completed(playlist_id)).unwrap();

        for rx in [&mut rx1, &mut rx2] {
            let first = rx.recv().await.unwrap();
            let second = rx.recv().await.unwrap();
            assert_eq!(first.event_type(), "SkipRequested");
            assert_eq!(second.event_type(), "PlaylistCompleted");
            assert_eq!(second.playlist_id(), playlist_id);
        }
    }

    #[test]
    fn test_capacity_reported() {
        let bus = EventBus::new(42);
        assert_eq!(bus.capacity(), 42);
    }

    #[test]
    fn test_json_line_carries_type_tag() {
        let playlist_id = Uuid::new_v4();
        let line = completed(playlist_id).to_json_line().unwrap();
        assert!(!line.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["type"], "PlaylistCompleted");
        assert_eq!(value["groups_played"], 2);
        assert_eq!(value["playlist_id"], playlist_id.to_string());

        let parsed: CutsceneEvent = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed.playlist_id(), playlist_id);
    }
}
