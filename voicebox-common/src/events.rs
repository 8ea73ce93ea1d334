//! Event types for the voicebox event system
//!
//! Provides the shared `PlayerEvent` definitions and the `EventBus` used by
//! the playback engine and any observing layer (command transport, metrics,
//! tests).
//!
//! Asynchronous transport failures never reach a particular caller (nobody is
//! awaiting them), so they surface here as `TransportFailed` events instead.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

use crate::types::{GuildId, LoopMode, PlaybackState};

/// Voicebox event types
///
/// Events are broadcast via `EventBus`; all carry the originating guild and a
/// timestamp. The enum is serde-tagged so it can be serialized onto whatever
/// observation channel the embedding application uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// Playback state changed (idle / playing / paused)
    StateChanged {
        guild_id: GuildId,
        old_state: PlaybackState,
        new_state: PlaybackState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Transport playback of a track started
    TrackStarted {
        guild_id: GuildId,
        track_id: Uuid,
        title: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A track finished or was skipped
    TrackFinished {
        guild_id: GuildId,
        track_id: Uuid,
        /// false when the track was cut short by a skip/jump/removal
        completed: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Queue contents changed (enqueue, remove, clear)
    QueueChanged {
        guild_id: GuildId,
        /// Queue length after the change
        len: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Loop mode changed
    LoopModeChanged {
        guild_id: GuildId,
        mode: LoopMode,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The voice transport reported an error for the current track
    ///
    /// The engine treats this as a forced skip; the event is the only place
    /// the failure is observable.
    TransportFailed {
        guild_id: GuildId,
        track_id: Option<Uuid>,
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A guild's engine was disposed (guild departure)
    EngineDisposed {
        guild_id: GuildId,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl PlayerEvent {
    /// Guild the event originated from
    pub fn guild_id(&self) -> GuildId {
        match self {
            PlayerEvent::StateChanged { guild_id, .. }
            | PlayerEvent::TrackStarted { guild_id, .. }
            | PlayerEvent::TrackFinished { guild_id, .. }
            | PlayerEvent::QueueChanged { guild_id, .. }
            | PlayerEvent::LoopModeChanged { guild_id, .. }
            | PlayerEvent::TransportFailed { guild_id, .. }
            | PlayerEvent::EngineDisposed { guild_id, .. } => *guild_id,
        }
    }
}

/// Broadcast bus for `PlayerEvent`
///
/// Thin wrapper over `tokio::sync::broadcast`: multiple producers, multiple
/// subscribers, bounded buffer with lagging-receiver semantics. Engines for
/// all guilds share one bus; subscribers filter by `guild_id` as needed.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<PlayerEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns the number of subscribers that received the event. A bus with
    /// no subscribers is not an error; the event is dropped.
    pub fn emit(&self, event: PlayerEvent) -> usize {
        match self.tx.send(event) {
            Ok(n) => n,
            Err(_) => {
                trace!("event emitted with no subscribers");
                0
            }
        }
    }

    /// Number of currently attached subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
