//! Guild-to-engine registry
//!
//! **Responsibilities:**
//! - Lazily create one engine actor per guild on first use
//! - Hand out cheap cloneable `PlayerHandle`s
//! - Tear engines down on guild departure
//!
//! Creation is guarded by the map's write lock, so two concurrent first
//! commands for the same guild still end up sharing a single engine.
//! Disposal removes the entry before awaiting teardown, so a slow
//! disconnect never blocks other guilds.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use voicebox_common::config::BotConfig;
use voicebox_common::events::{EventBus, PlayerEvent};
use voicebox_common::types::GuildId;

use crate::connector::VoiceConnector;
use crate::engine::{self, PlayerHandle};

/// Produces the transport for a newly created guild engine
pub type ConnectorFactory = Arc<dyn Fn(GuildId) -> Arc<dyn VoiceConnector> + Send + Sync>;

struct EngineEntry {
    handle: PlayerHandle,
    task: JoinHandle<()>,
}

/// Owns every live engine actor, keyed by guild
pub struct EngineRegistry {
    engines: RwLock<HashMap<GuildId, EngineEntry>>,
    connectors: ConnectorFactory,
    events: Arc<EventBus>,
    connect_timeout: Duration,
}

impl EngineRegistry {
    pub fn new(config: &BotConfig, connectors: ConnectorFactory, events: Arc<EventBus>) -> Self {
        Self {
            engines: RwLock::new(HashMap::new()),
            connectors,
            events,
            connect_timeout: config.connect_timeout(),
        }
    }

    /// Handle for a guild's engine, creating the actor on first use
    pub async fn get(&self, guild_id: GuildId) -> PlayerHandle {
        if let Some(entry) = self.engines.read().await.get(&guild_id) {
            return entry.handle.clone();
        }
        let mut engines = self.engines.write().await;
        let entry = engines.entry(guild_id).or_insert_with(|| {
            info!(guild = %guild_id, "creating playback engine");
            let connector = (self.connectors)(guild_id);
            let (handle, task) = engine::spawn(
                guild_id,
                connector,
                Arc::clone(&self.events),
                self.connect_timeout,
            );
            EngineEntry { handle, task }
        });
        entry.handle.clone()
    }

    /// Tear down a guild's engine, releasing its transport
    ///
    /// Unknown guilds are a no-op. A later `get` for the same guild creates
    /// a fresh engine with an empty queue.
    pub async fn dispose(&self, guild_id: GuildId) {
        let entry = self.engines.write().await.remove(&guild_id);
        let Some(entry) = entry else {
            debug!(guild = %guild_id, "dispose for guild with no engine");
            return;
        };
        info!(guild = %guild_id, "disposing playback engine");
        if entry.handle.shutdown().await.is_err() {
            // Actor already gone; nothing left to wind down
            entry.task.abort();
        }
        let _ = entry.task.await;
        self.events.emit(PlayerEvent::EngineDisposed {
            guild_id,
            timestamp: Utc::now(),
        });
    }

    pub async fn contains(&self, guild_id: GuildId) -> bool {
        self.engines.read().await.contains_key(&guild_id)
    }

    /// Number of live engines
    pub async fn len(&self) -> usize {
        self.engines.read().await.len()
    }
}
