use thiserror::Error;

use crate::player::state::PlaybackState;

/// Every failure the orchestrator can report to a caller or an observer.
///
/// Validation errors (`QueueFull`, `QueueEmpty`, `InvalidPosition`,
/// `InvalidStateTransition`) are returned synchronously and leave all state
/// untouched. `ConnectionFailed` and `PlaybackFailed` additionally arrive as
/// [`PlayerEvent`](crate::protocol::events::PlayerEvent) notifications when
/// they originate from the transport.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlayerError {
    #[error("queue is full (max {max})")]
    QueueFull { max: usize },

    #[error("queue is empty")]
    QueueEmpty,

    #[error("position {position} is out of range (queue length {len})")]
    InvalidPosition { position: usize, len: usize },

    #[error("cannot {action} while {state:?}")]
    InvalidStateTransition {
        action: &'static str,
        state: PlaybackState,
    },

    #[error("failed to resolve {query:?}: {reason}")]
    ResolutionFailed { query: String, reason: String },

    #[error("voice connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("playback failed: {reason}")]
    PlaybackFailed { reason: String },
}
