//! Engine actor and playback state machine
//!
//! **State model:**
//! - `Idle`: no transport output; the cursor may still be unset
//! - `Playing`: the track at the cursor is loaded into the transport
//! - `Paused`: same track loaded, output suspended
//!
//! `playing` holds the id of the track currently loaded into the transport.
//! Transport signals whose track id does not match are stale (the user
//! already skipped, jumped, or stopped) and are discarded, so a completion
//! racing a skip advances the cursor exactly once.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;
use voicebox_common::events::{EventBus, PlayerEvent};
use voicebox_common::types::{ChannelId, GuildId, LoopMode, PlaybackState, Track};

use crate::connector::{TransportSignal, VoiceConnector};
use crate::engine::command::{EngineCommand, PlayerHandle, QueueSnapshot};
use crate::error::{PlayerError, Result};
use crate::queue::{Removal, TrackQueue};

/// Whether the actor keeps running after a command
enum Flow {
    Continue,
    Shutdown,
}

/// Spawn the actor task for one guild
pub(crate) fn spawn(
    guild_id: GuildId,
    connector: Arc<dyn VoiceConnector>,
    events: Arc<EventBus>,
    connect_timeout: Duration,
) -> (PlayerHandle, JoinHandle<()>) {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let core = EngineCore {
        guild_id,
        queue: TrackQueue::new(),
        loop_mode: LoopMode::None,
        state: PlaybackState::Idle,
        connected: false,
        playing: None,
        connector,
        events,
        connect_timeout,
    };
    let task = tokio::spawn(core.run(cmd_rx));
    (PlayerHandle::new(guild_id, cmd_tx), task)
}

struct EngineCore {
    guild_id: GuildId,
    queue: TrackQueue,
    loop_mode: LoopMode,
    state: PlaybackState,
    connected: bool,
    /// Id of the track loaded into the transport, set while Playing or Paused
    playing: Option<Uuid>,
    connector: Arc<dyn VoiceConnector>,
    events: Arc<EventBus>,
    connect_timeout: Duration,
}

impl EngineCore {
    async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<EngineCommand>) {
        info!(guild = %self.guild_id, "playback engine started");
        while let Some(cmd) = cmd_rx.recv().await {
            match self.handle_command(cmd).await {
                Flow::Continue => {}
                Flow::Shutdown => break,
            }
        }
        // Reached on Shutdown or when every handle was dropped
        if let Err(e) = self.reset().await {
            warn!(guild = %self.guild_id, error = %e, "transport release failed during engine teardown");
        }
        info!(guild = %self.guild_id, "playback engine stopped");
    }

    async fn handle_command(&mut self, cmd: EngineCommand) -> Flow {
        match cmd {
            EngineCommand::Connect { channel, resp } => {
                let _ = resp.send(self.connect(channel).await);
            }
            EngineCommand::Enqueue { track, resp } => {
                let _ = resp.send(self.enqueue(track).await);
            }
            EngineCommand::Skip { resp } => {
                let _ = resp.send(self.skip().await);
            }
            EngineCommand::Pause { resp } => {
                let _ = resp.send(self.pause().await);
            }
            EngineCommand::Resume { resp } => {
                let _ = resp.send(self.resume().await);
            }
            EngineCommand::Stop { resp } => {
                let _ = resp.send(self.stop().await);
            }
            EngineCommand::Reset { resp } => {
                let _ = resp.send(self.reset().await);
            }
            EngineCommand::SetLoopMode { mode, resp } => {
                let _ = resp.send(self.set_loop_mode(mode));
            }
            EngineCommand::Remove { index, resp } => {
                let _ = resp.send(self.remove(index).await);
            }
            EngineCommand::Clear { resp } => {
                let _ = resp.send(self.clear().await);
            }
            EngineCommand::JumpTo { index, resp } => {
                let _ = resp.send(self.jump_to(index).await);
            }
            EngineCommand::Snapshot { resp } => {
                let _ = resp.send(Ok(self.snapshot()));
            }
            EngineCommand::Signal(signal) => {
                self.on_transport_signal(signal).await;
            }
            EngineCommand::Shutdown { resp } => {
                let _ = resp.send(self.reset().await);
                return Flow::Shutdown;
            }
        }
        Flow::Continue
    }

    /// Join a voice channel, bounded by the configured timeout
    ///
    /// On timeout the queue is left intact; a later connect can pick playback
    /// back up.
    async fn connect(&mut self, channel: ChannelId) -> Result<()> {
        if self.connected {
            debug!(guild = %self.guild_id, "connect ignored, already in a voice channel");
            return Ok(());
        }
        info!(guild = %self.guild_id, channel = %channel, "joining voice channel");
        match tokio::time::timeout(self.connect_timeout, self.connector.connect(channel)).await {
            Ok(Ok(())) => {
                self.connected = true;
                // Tracks queued before the join (or after a failed one) are
                // waiting at the cursor; start them now
                if self.state == PlaybackState::Idle && self.queue.cursor().is_some() {
                    self.start_or_idle().await?;
                }
                Ok(())
            }
            Ok(Err(e)) => {
                warn!(guild = %self.guild_id, channel = %channel, error = %e, "voice join failed");
                Err(e)
            }
            Err(_) => {
                warn!(
                    guild = %self.guild_id,
                    channel = %channel,
                    timeout_secs = self.connect_timeout.as_secs(),
                    "voice join timed out, queued tracks preserved"
                );
                Err(PlayerError::ConnectionTimeout)
            }
        }
    }

    /// Append a track; auto-start when idle with no current track
    async fn enqueue(&mut self, track: Track) -> Result<usize> {
        let index = self.queue.append(track);
        debug!(
            guild = %self.guild_id,
            index,
            queue_len = self.queue.len(),
            "track enqueued"
        );
        self.emit_queue_changed();

        if self.state == PlaybackState::Idle && self.queue.cursor().is_none() {
            self.queue.jump_to(index)?;
            if self.connected {
                self.start_or_idle().await?;
            } else {
                debug!(guild = %self.guild_id, "no voice connection, playback deferred");
            }
        }
        Ok(index)
    }

    /// Force-advance past the current track
    ///
    /// Track-loop does not apply to a user skip; queue mode still wraps. With
    /// nothing left to play the engine goes idle and leaves the channel. An
    /// unstartable successor does not fail the skip; it surfaces as a
    /// `TransportFailed` event and the walk continues.
    async fn skip(&mut self) -> Result<()> {
        if self.state == PlaybackState::Idle {
            return Err(PlayerError::EmptyQueue);
        }
        let skipped = self.playing;
        self.stop_output().await?;
        if let Some(track_id) = skipped {
            self.emit_track_finished(track_id, false);
        }
        self.advance_walk(true).await;
        Ok(())
    }

    fn pause_guard(&self) -> Result<()> {
        if self.state == PlaybackState::Idle {
            return Err(PlayerError::EmptyQueue);
        }
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        self.pause_guard()?;
        if self.state == PlaybackState::Paused {
            return Ok(());
        }
        self.connector.pause().await?;
        self.set_state(PlaybackState::Paused);
        Ok(())
    }

    async fn resume(&mut self) -> Result<()> {
        self.pause_guard()?;
        if self.state == PlaybackState::Playing {
            return Ok(());
        }
        self.connector.resume().await?;
        self.set_state(PlaybackState::Playing);
        Ok(())
    }

    /// Stop output, empty the queue, leave the channel; idempotent
    async fn stop(&mut self) -> Result<()> {
        self.stop_output().await?;
        if !self.queue.is_empty() {
            self.queue.clear();
            self.emit_queue_changed();
        }
        self.go_idle(true).await
    }

    /// Stop plus unconditional transport release
    ///
    /// Used for guild departure and engine disposal; the transport treats a
    /// redundant disconnect as a no-op.
    async fn reset(&mut self) -> Result<()> {
        self.stop().await?;
        self.connected = false;
        self.connector.disconnect().await
    }

    fn set_loop_mode(&mut self, mode: LoopMode) -> Result<()> {
        if self.loop_mode != mode {
            info!(guild = %self.guild_id, %mode, "loop mode changed");
            self.loop_mode = mode;
            self.events.emit(PlayerEvent::LoopModeChanged {
                guild_id: self.guild_id,
                mode,
                timestamp: Utc::now(),
            });
        }
        Ok(())
    }

    /// Remove a track by zero-based index
    ///
    /// Removing the current track behaves like a skip targeted at the slot
    /// the removal exposed: the track now at that index plays next, queue
    /// mode wraps to the head, otherwise the engine goes idle.
    async fn remove(&mut self, index: usize) -> Result<()> {
        let was_active = self.state != PlaybackState::Idle;
        let (track, removal) = self.queue.remove_at(index)?;
        debug!(
            guild = %self.guild_id,
            index,
            title = %track.title,
            "track removed from queue"
        );
        self.emit_queue_changed();

        if removal == Removal::Current && was_active {
            self.stop_output().await?;
            self.emit_track_finished(track.id, false);
            self.continue_from(index).await?;
        }
        Ok(())
    }

    /// Resume playback after the current slot was vacated
    async fn continue_from(&mut self, index: usize) -> Result<()> {
        let next = if index < self.queue.len() {
            Some(index)
        } else if self.loop_mode == LoopMode::Queue && !self.queue.is_empty() {
            Some(0)
        } else {
            None
        };
        match next {
            Some(i) => {
                self.queue.jump_to(i)?;
                self.start_or_idle().await
            }
            None => self.go_idle(true).await,
        }
    }

    /// Empty the queue but keep the voice connection
    async fn clear(&mut self) -> Result<()> {
        if self.state != PlaybackState::Idle {
            let cleared = self.playing;
            self.stop_output().await?;
            if let Some(track_id) = cleared {
                self.emit_track_finished(track_id, false);
            }
        }
        self.queue.clear();
        self.emit_queue_changed();
        self.go_idle(false).await
    }

    /// Move playback to a zero-based index and restart output there
    async fn jump_to(&mut self, index: usize) -> Result<()> {
        if index >= self.queue.len() {
            return Err(PlayerError::OutOfRange(index));
        }
        let interrupted = self.playing;
        self.stop_output().await?;
        if let Some(track_id) = interrupted {
            self.emit_track_finished(track_id, false);
        }
        self.queue.jump_to(index)?;
        self.start_or_idle().await
    }

    fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            state: self.state,
            loop_mode: self.loop_mode,
            cursor: self.queue.cursor(),
            tracks: self.queue.tracks().to_vec(),
        }
    }

    async fn on_transport_signal(&mut self, signal: TransportSignal) {
        if self.playing != Some(signal.track_id()) {
            debug!(
                guild = %self.guild_id,
                track_id = %signal.track_id(),
                "discarding stale transport signal"
            );
            return;
        }
        match signal {
            TransportSignal::TrackFinished { track_id } => {
                if self.state != PlaybackState::Playing {
                    debug!(guild = %self.guild_id, "completion signal while not playing, ignored");
                    return;
                }
                self.emit_track_finished(track_id, true);
                self.advance_walk(false).await;
            }
            TransportSignal::TrackErrored { track_id, message } => {
                warn!(
                    guild = %self.guild_id,
                    track_id = %track_id,
                    error = %message,
                    "transport reported track failure, advancing"
                );
                self.events.emit(PlayerEvent::TransportFailed {
                    guild_id: self.guild_id,
                    track_id: Some(track_id),
                    message,
                    timestamp: Utc::now(),
                });
                self.emit_track_finished(track_id, false);
                self.advance_walk(false).await;
            }
        }
    }

    /// Apply loop-mode advancement and start the next startable track
    ///
    /// `forced` selects the skip advancement rule instead of the natural one.
    /// The walk is bounded by the queue length so a run of unplayable tracks
    /// ends in idle instead of spinning.
    async fn advance_walk(&mut self, forced: bool) {
        self.playing = None;
        let mut attempts = self.queue.len();
        while attempts > 0 {
            let next = if forced {
                self.queue.advance_forced(self.loop_mode)
            } else {
                self.queue.advance(self.loop_mode)
            };
            if next.is_none() {
                break;
            }
            match self.start_current().await {
                Ok(()) => return,
                Err(e) => {
                    let failed = self.queue.current().map(|t| t.id);
                    warn!(guild = %self.guild_id, error = %e, "failed to start next track");
                    self.events.emit(PlayerEvent::TransportFailed {
                        guild_id: self.guild_id,
                        track_id: failed,
                        message: e.to_string(),
                        timestamp: Utc::now(),
                    });
                    self.playing = None;
                    attempts -= 1;
                }
            }
        }
        if let Err(e) = self.go_idle(true).await {
            warn!(guild = %self.guild_id, error = %e, "transport release failed after queue ran out");
        }
    }

    /// Targeted start (enqueue, jump, removal continuation, deferred connect)
    ///
    /// Unlike the walk, a targeted start reports its failure to the caller;
    /// the engine drops to idle but keeps the voice connection so a retry is
    /// possible.
    async fn start_or_idle(&mut self) -> Result<()> {
        match self.start_current().await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.playing = None;
                self.set_state(PlaybackState::Idle);
                Err(e)
            }
        }
    }

    /// Load the cursor track into the transport and enter Playing
    async fn start_current(&mut self) -> Result<()> {
        let track = self
            .queue
            .current()
            .cloned()
            .ok_or(PlayerError::EmptyQueue)?;
        if !self.connected {
            return Err(PlayerError::NotConnected);
        }
        self.connector.play(&track).await?;
        self.playing = Some(track.id);
        self.set_state(PlaybackState::Playing);
        info!(guild = %self.guild_id, title = %track.title, "track started");
        self.events.emit(PlayerEvent::TrackStarted {
            guild_id: self.guild_id,
            track_id: track.id,
            title: track.title,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Halt transport output if a track is loaded
    async fn stop_output(&mut self) -> Result<()> {
        if self.playing.take().is_some() && self.connected {
            self.connector.stop().await?;
        }
        Ok(())
    }

    async fn go_idle(&mut self, disconnect: bool) -> Result<()> {
        self.playing = None;
        self.set_state(PlaybackState::Idle);
        if disconnect && self.connected {
            self.connected = false;
            self.connector.disconnect().await?;
        }
        Ok(())
    }

    fn set_state(&mut self, new_state: PlaybackState) {
        if self.state == new_state {
            return;
        }
        let old_state = self.state;
        self.state = new_state;
        debug!(guild = %self.guild_id, %old_state, %new_state, "playback state changed");
        self.events.emit(PlayerEvent::StateChanged {
            guild_id: self.guild_id,
            old_state,
            new_state,
            timestamp: Utc::now(),
        });
    }

    fn emit_queue_changed(&self) {
        self.events.emit(PlayerEvent::QueueChanged {
            guild_id: self.guild_id,
            len: self.queue.len(),
            timestamp: Utc::now(),
        });
    }

    fn emit_track_finished(&self, track_id: Uuid, completed: bool) {
        self.events.emit(PlayerEvent::TrackFinished {
            guild_id: self.guild_id,
            track_id,
            completed,
            timestamp: Utc::now(),
        });
    }
}
