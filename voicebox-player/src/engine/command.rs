//! Engine command surface
//!
//! **Message flow:**
//! - `PlayerHandle` methods package a request plus a oneshot reply channel
//!   into an `EngineCommand` and send it down the actor's command channel.
//! - Transport signals enter through `notify` with no reply channel; the
//!   engine handles them in arrival order like any other command.
//!
//! A send or reply failure means the actor is gone, which callers see as
//! `EngineClosed`.

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use voicebox_common::types::{ChannelId, GuildId, LoopMode, PlaybackState, Track};

use crate::connector::TransportSignal;
use crate::error::{PlayerError, Result};

pub(crate) type Responder<T> = oneshot::Sender<Result<T>>;

/// Messages processed one at a time by the engine actor
pub(crate) enum EngineCommand {
    Connect {
        channel: ChannelId,
        resp: Responder<()>,
    },
    Enqueue {
        track: Track,
        resp: Responder<usize>,
    },
    Skip {
        resp: Responder<()>,
    },
    Pause {
        resp: Responder<()>,
    },
    Resume {
        resp: Responder<()>,
    },
    Stop {
        resp: Responder<()>,
    },
    Reset {
        resp: Responder<()>,
    },
    SetLoopMode {
        mode: LoopMode,
        resp: Responder<()>,
    },
    Remove {
        index: usize,
        resp: Responder<()>,
    },
    Clear {
        resp: Responder<()>,
    },
    JumpTo {
        index: usize,
        resp: Responder<()>,
    },
    Snapshot {
        resp: Responder<QueueSnapshot>,
    },
    Signal(TransportSignal),
    Shutdown {
        resp: Responder<()>,
    },
}

/// Point-in-time copy of one guild's playback state
#[derive(Debug, Clone, Serialize)]
pub struct QueueSnapshot {
    pub state: PlaybackState,
    pub loop_mode: LoopMode,
    pub cursor: Option<usize>,
    pub tracks: Vec<Track>,
}

impl QueueSnapshot {
    /// Track at the cursor, if any
    pub fn current(&self) -> Option<&Track> {
        self.cursor.and_then(|i| self.tracks.get(i))
    }
}

/// Cloneable client for one guild's engine actor
///
/// All methods serialize through the actor's command channel; two concurrent
/// calls for the same guild execute in channel order.
#[derive(Clone)]
pub struct PlayerHandle {
    guild_id: GuildId,
    cmd_tx: mpsc::UnboundedSender<EngineCommand>,
}

impl PlayerHandle {
    pub(crate) fn new(guild_id: GuildId, cmd_tx: mpsc::UnboundedSender<EngineCommand>) -> Self {
        Self { guild_id, cmd_tx }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Responder<T>) -> EngineCommand,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(build(tx))
            .map_err(|_| PlayerError::EngineClosed)?;
        rx.await.map_err(|_| PlayerError::EngineClosed)?
    }

    /// Join a voice channel; no-op when already connected
    pub async fn connect(&self, channel: ChannelId) -> Result<()> {
        self.request(|resp| EngineCommand::Connect { channel, resp })
            .await
    }

    /// Append a track; returns its zero-based queue index
    ///
    /// Starts playback when the engine is idle, connected, and had no
    /// current track.
    pub async fn enqueue(&self, track: Track) -> Result<usize> {
        self.request(|resp| EngineCommand::Enqueue { track, resp })
            .await
    }

    /// Force-advance past the current track
    pub async fn skip(&self) -> Result<()> {
        self.request(|resp| EngineCommand::Skip { resp }).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.request(|resp| EngineCommand::Pause { resp }).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.request(|resp| EngineCommand::Resume { resp }).await
    }

    /// Stop playback, empty the queue, and leave the voice channel
    pub async fn stop(&self) -> Result<()> {
        self.request(|resp| EngineCommand::Stop { resp }).await
    }

    /// Full teardown: stop plus unconditional transport release
    pub async fn reset(&self) -> Result<()> {
        self.request(|resp| EngineCommand::Reset { resp }).await
    }

    pub async fn set_loop_mode(&self, mode: LoopMode) -> Result<()> {
        self.request(|resp| EngineCommand::SetLoopMode { mode, resp })
            .await
    }

    /// Remove the track at a zero-based index
    pub async fn remove(&self, index: usize) -> Result<()> {
        self.request(|resp| EngineCommand::Remove { index, resp })
            .await
    }

    /// Empty the queue without leaving the voice channel
    pub async fn clear(&self) -> Result<()> {
        self.request(|resp| EngineCommand::Clear { resp }).await
    }

    /// Move playback to a zero-based index and restart output there
    pub async fn jump_to(&self, index: usize) -> Result<()> {
        self.request(|resp| EngineCommand::JumpTo { index, resp })
            .await
    }

    pub async fn snapshot(&self) -> Result<QueueSnapshot> {
        self.request(|resp| EngineCommand::Snapshot { resp }).await
    }

    /// Track currently loaded into the transport, if any
    pub async fn now_playing(&self) -> Result<Option<Track>> {
        let snapshot = self.snapshot().await?;
        match snapshot.state {
            PlaybackState::Idle => Ok(None),
            _ => Ok(snapshot.current().cloned()),
        }
    }

    /// Deliver a transport signal into the command stream
    ///
    /// Callable from synchronous transport callbacks; the signal is queued
    /// behind any commands already in flight.
    pub fn notify(&self, signal: TransportSignal) -> Result<()> {
        self.cmd_tx
            .send(EngineCommand::Signal(signal))
            .map_err(|_| PlayerError::EngineClosed)
    }

    /// Tear down and terminate the actor
    pub(crate) async fn shutdown(&self) -> Result<()> {
        self.request(|resp| EngineCommand::Shutdown { resp }).await
    }
}

impl std::fmt::Debug for PlayerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerHandle")
            .field("guild_id", &self.guild_id)
            .finish()
    }
}
