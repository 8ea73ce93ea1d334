//! Track queue with a movable "current" cursor
//!
//! **Responsibilities:**
//! - Ordered storage of tracks (insertion always appends)
//! - Cursor bookkeeping across removals and jumps
//! - Loop-mode advancement rules (natural completion vs. forced skip)
//!
//! The queue knows nothing about transports or playback state; the engine
//! decides what a cursor change means for audio output.
//!
//! Invariants:
//! - `cursor < items.len()` whenever the cursor is set.
//! - The cursor is unset iff the queue is empty or playback has not started.

use voicebox_common::types::{LoopMode, Track};

use crate::error::{PlayerError, Result};

/// Where a removed track sat relative to the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The removed track was the current one; the cursor is now unset and the
    /// caller must decide how playback continues
    Current,
    /// The removed track preceded the cursor; the cursor shifted down to keep
    /// pointing at the same logical track
    BeforeCurrent,
    /// The removed track was after the cursor (or there was no cursor)
    Other,
}

/// Ordered, mutable sequence of tracks with a current-position cursor
#[derive(Debug, Default)]
pub struct TrackQueue {
    items: Vec<Track>,
    cursor: Option<usize>,
}

impl TrackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.items
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Track at the cursor, if any
    pub fn current(&self) -> Option<&Track> {
        self.cursor.and_then(|i| self.items.get(i))
    }

    /// Append a track at the end; returns the assigned index
    pub fn append(&mut self, track: Track) -> usize {
        self.items.push(track);
        self.items.len() - 1
    }

    /// Remove the track at `index`
    ///
    /// Returns the removed track and where it sat relative to the cursor.
    /// Removing the current track unsets the cursor; the caller owns the
    /// decision of where playback goes next.
    pub fn remove_at(&mut self, index: usize) -> Result<(Track, Removal)> {
        if index >= self.items.len() {
            return Err(PlayerError::OutOfRange(index));
        }

        let track = self.items.remove(index);
        let removal = match self.cursor {
            Some(c) if index == c => {
                self.cursor = None;
                Removal::Current
            }
            Some(c) if index < c => {
                self.cursor = Some(c - 1);
                Removal::BeforeCurrent
            }
            _ => Removal::Other,
        };

        Ok((track, removal))
    }

    /// Empty the queue and unset the cursor
    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor = None;
    }

    /// Move the cursor to `index`
    ///
    /// Does not itself start playback; the engine decides whether to restart
    /// the transport.
    pub fn jump_to(&mut self, index: usize) -> Result<()> {
        if index >= self.items.len() {
            return Err(PlayerError::OutOfRange(index));
        }
        self.cursor = Some(index);
        Ok(())
    }

    /// Apply the loop-mode advancement rule for a naturally completed track
    ///
    /// Returns the new cursor, or `None` when playback ran past the end (the
    /// cursor is unset in that case).
    pub fn advance(&mut self, mode: LoopMode) -> Option<usize> {
        let current = self.cursor?;
        let next = match mode {
            LoopMode::Track => Some(current),
            LoopMode::Queue if !self.items.is_empty() => Some((current + 1) % self.items.len()),
            LoopMode::Queue => None,
            LoopMode::None if current + 1 < self.items.len() => Some(current + 1),
            LoopMode::None => None,
        };
        self.cursor = next;
        next
    }

    /// Advancement rule for a user-issued skip
    ///
    /// Skip always moves forward: track-loop replay applies only to natural
    /// completion. Queue mode still wraps.
    pub fn advance_forced(&mut self, mode: LoopMode) -> Option<usize> {
        let current = self.cursor?;
        let next = match mode {
            LoopMode::Queue if !self.items.is_empty() => Some((current + 1) % self.items.len()),
            _ if current + 1 < self.items.len() => Some(current + 1),
            _ => None,
        };
        self.cursor = next;
        next
    }
}
