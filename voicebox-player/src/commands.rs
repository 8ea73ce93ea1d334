//! Guild command facade
//!
//! Thin adapter between a chat frontend and the engine layer. It owns the
//! two caller-facing conventions:
//!
//! - **1-based positions.** Every position crossing this boundary — enqueue
//!   receipts, queue listings, `remove`, `jump` — is 1-based. Conversion to
//!   the engines' 0-based indices happens here and nowhere else.
//! - **Resolution before serialization.** `play` resolves its query before
//!   touching the guild's engine, so a slow media lookup never delays other
//!   commands for the same guild.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use voicebox_common::types::{ChannelId, GuildId, LoopMode, Track, UserRef};

use crate::engine::QueueSnapshot;
use crate::error::{PlayerError, Result};
use crate::registry::EngineRegistry;
use crate::resolver::TrackResolver;

/// Receipt for a successfully queued track
#[derive(Debug, Clone, Serialize)]
pub struct Enqueued {
    /// 1-based queue position
    pub position: usize,
    pub track: Track,
}

/// One row of a queue listing
#[derive(Debug, Clone, Serialize)]
pub struct QueueItemView {
    /// 1-based queue position
    pub position: usize,
    pub title: String,
    pub requested_by: UserRef,
    pub is_current: bool,
}

/// Frontend-facing command set, one method per user command
pub struct GuildCommands {
    registry: Arc<EngineRegistry>,
    resolver: Arc<dyn TrackResolver>,
}

impl GuildCommands {
    pub fn new(registry: Arc<EngineRegistry>, resolver: Arc<dyn TrackResolver>) -> Self {
        Self { registry, resolver }
    }

    pub fn registry(&self) -> &Arc<EngineRegistry> {
        &self.registry
    }

    /// Resolve a query, join the channel if needed, and queue the track
    pub async fn play(
        &self,
        guild_id: GuildId,
        channel: ChannelId,
        query: &str,
        requester: &UserRef,
    ) -> Result<Enqueued> {
        let track = self.resolver.resolve(query, requester).await?;
        debug!(guild = %guild_id, title = %track.title, "query resolved");
        let handle = self.registry.get(guild_id).await;
        handle.connect(channel).await?;
        let index = handle.enqueue(track.clone()).await?;
        Ok(Enqueued {
            position: index + 1,
            track,
        })
    }

    /// Join a voice channel without queueing anything
    pub async fn join(&self, guild_id: GuildId, channel: ChannelId) -> Result<()> {
        self.registry.get(guild_id).await.connect(channel).await
    }

    pub async fn skip(&self, guild_id: GuildId) -> Result<()> {
        self.registry.get(guild_id).await.skip().await
    }

    pub async fn pause(&self, guild_id: GuildId) -> Result<()> {
        self.registry.get(guild_id).await.pause().await
    }

    pub async fn resume(&self, guild_id: GuildId) -> Result<()> {
        self.registry.get(guild_id).await.resume().await
    }

    /// Stop playback, drop the queue, and leave the channel
    pub async fn stop(&self, guild_id: GuildId) -> Result<()> {
        self.registry.get(guild_id).await.stop().await
    }

    /// Leave the channel and fully release the transport
    pub async fn leave(&self, guild_id: GuildId) -> Result<()> {
        self.registry.get(guild_id).await.reset().await
    }

    pub async fn set_loop_mode(&self, guild_id: GuildId, mode: LoopMode) -> Result<()> {
        self.registry.get(guild_id).await.set_loop_mode(mode).await
    }

    pub async fn clear(&self, guild_id: GuildId) -> Result<()> {
        self.registry.get(guild_id).await.clear().await
    }

    /// Remove the track at a 1-based position
    pub async fn remove(&self, guild_id: GuildId, position: usize) -> Result<()> {
        let index = to_zero_based(position)?;
        self.registry.get(guild_id).await.remove(index).await
    }

    /// Jump playback to a 1-based position
    pub async fn jump(&self, guild_id: GuildId, position: usize) -> Result<()> {
        let index = to_zero_based(position)?;
        self.registry.get(guild_id).await.jump_to(index).await
    }

    /// Queue listing with 1-based positions and the current track marked
    pub async fn list(&self, guild_id: GuildId) -> Result<Vec<QueueItemView>> {
        let snapshot = self.registry.get(guild_id).await.snapshot().await?;
        Ok(listing(&snapshot))
    }

    pub async fn now_playing(&self, guild_id: GuildId) -> Result<Option<Track>> {
        self.registry.get(guild_id).await.now_playing().await
    }
}

fn to_zero_based(position: usize) -> Result<usize> {
    // Position 0 never exists in the 1-based convention
    if position == 0 {
        return Err(PlayerError::OutOfRange(0));
    }
    Ok(position - 1)
}

fn listing(snapshot: &QueueSnapshot) -> Vec<QueueItemView> {
    snapshot
        .tracks
        .iter()
        .enumerate()
        .map(|(i, track)| QueueItemView {
            position: i + 1,
            title: track.title.clone(),
            requested_by: track.requested_by.clone(),
            is_current: snapshot.cursor == Some(i),
        })
        .collect()
}
