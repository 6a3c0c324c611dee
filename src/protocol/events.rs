use serde::Serialize;

use crate::common::types::ChatId;
use crate::protocol::tracks::Track;

/// Notifications emitted by the orchestrator, e.g. to relay user-facing
/// messages. Delivered on the channel returned by
/// [`Dispatcher::events`](crate::server::Dispatcher::events).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlayerEvent {
    #[serde(rename = "TrackStartEvent")]
    TrackStart { chat_id: ChatId, track: Track },

    #[serde(rename = "TrackEndEvent")]
    TrackEnd {
        chat_id: ChatId,
        track: Track,
        reason: TrackEndReason,
    },

    /// A transport stream died mid-track. Emitted in addition to the
    /// auto-advance the failure triggers, so observers can distinguish it
    /// from a natural end.
    #[serde(rename = "PlaybackFailedEvent")]
    PlaybackFailed {
        chat_id: ChatId,
        track: Option<Track>,
        reason: String,
    },

    /// Opening the voice connection failed; the pending track was put back
    /// at the queue head for a user-initiated retry.
    #[serde(rename = "ConnectionFailedEvent")]
    ConnectionFailed { chat_id: ChatId, reason: String },
}

/// Why the current track stopped being current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackEndReason {
    Finished,
    Skipped,
    Stopped,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::tracks::PlayableHandle;

    #[test]
    fn events_serialize_with_a_type_tag() {
        let event = PlayerEvent::TrackEnd {
            chat_id: ChatId(-100123),
            track: Track {
                identifier: "abc123".into(),
                title: "Test Tone".into(),
                duration_ms: None,
                uri: None,
                handle: PlayableHandle("abc123".into()),
                requested_by: 42.into(),
                enqueued_at: 0,
            },
            reason: TrackEndReason::Finished,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "TrackEndEvent");
        assert_eq!(value["chatId"], -100123);
        assert_eq!(value["reason"], "finished");
        assert_eq!(value["track"]["title"], "Test Tone");

        let event = PlayerEvent::ConnectionFailed {
            chat_id: ChatId(-100123),
            reason: "ice timeout".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "ConnectionFailedEvent");
        assert_eq!(value["reason"], "ice timeout");
    }
}
