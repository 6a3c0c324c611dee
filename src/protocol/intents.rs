use serde::Serialize;

use crate::common::types::UserId;
use crate::player::state::PlayerStatus;
use crate::protocol::tracks::Track;

/// An inbound user action, routed to one chat's session by the dispatcher.
#[derive(Debug, Clone)]
pub enum Intent {
    /// Resolve `query` and either start playback (idle chat) or enqueue.
    Play { query: String, requested_by: UserId },
    Pause,
    Resume,
    /// Drop the current track and advance to the next queued one, if any.
    Skip,
    /// Stop playback, clear the queue, cancel in-flight resolves and (if
    /// configured) close the voice connection.
    Stop,
    Clear,
    Shuffle,
    /// Remove the queued track at a 1-based position.
    Remove { position: usize },
    /// Move a queued track between 1-based positions.
    Move { from: usize, to: usize },
    Status,
}

impl Intent {
    /// Short action name, used in errors and logs.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Play { .. } => "play",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Skip => "skip",
            Self::Stop => "stop",
            Self::Clear => "clear",
            Self::Shuffle => "shuffle",
            Self::Remove { .. } => "remove",
            Self::Move { .. } => "move",
            Self::Status => "status",
        }
    }
}

/// Successful result of an intent, returned once the action is accepted and
/// validated rather than once playback physically starts.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum Outcome {
    /// The chat was idle; playback of `track` was initiated.
    Playing { track: Track },
    /// Something was already playing; `track` went to the queue.
    Enqueued { track: Track, position: usize },
    Paused,
    Resumed,
    /// `next` is the new current track, or None if the queue was empty and
    /// the chat is now idle.
    Skipped { next: Option<Track> },
    Stopped,
    Cleared { removed: usize },
    Shuffled,
    Removed { track: Track },
    Moved,
    Status { status: PlayerStatus },
}
