use serde::Serialize;

use crate::common::types::ChatId;
use crate::protocol::tracks::Track;

/// Where a session is in its lifecycle. Between serialization turns only
/// `Idle`, `Connecting`, `Playing` and `Paused` are observable; `Stopping`
/// and `Destroyed` are passed through inside a single turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackState {
    /// No current track. The voice connection may still be open until the
    /// idle reaper tears it down.
    Idle,
    /// Voice connection being established; a track is pending start.
    Connecting,
    Playing,
    Paused,
    /// Stream and connection being torn down after an explicit stop.
    Stopping,
    /// Removed from the registry. Terminal.
    Destroyed,
}

/// Point-in-time view of one session, as returned by `current_status`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatus {
    pub chat_id: ChatId,
    pub state: PlaybackState,
    pub current: Option<Track>,
    pub queue: Vec<Track>,
    pub queue_len: usize,
}
