use serde::{Deserialize, Serialize};

use crate::common::types::{UserId, now_ms};

/// Opaque playback token produced by a [`TrackSource`](crate::sources::TrackSource)
/// and handed verbatim to the [`VoiceTransport`](crate::voice::VoiceTransport).
/// The orchestrator never inspects it; typically a URL or a local file path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayableHandle(pub String);

impl From<String> for PlayableHandle {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for PlayableHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A resolved, queueable audio track. Immutable once enqueued; only its
/// position in the queue changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub identifier: String,
    pub title: String,
    /// Duration in milliseconds. None for live streams or when the source
    /// could not determine it.
    pub duration_ms: Option<u64>,
    /// Original page/source URI, for display.
    pub uri: Option<String>,
    pub handle: PlayableHandle,
    pub requested_by: UserId,
    /// Unix milliseconds at enqueue time.
    pub enqueued_at: u64,
}

impl Track {
    /// Stamp a resolved track with its requester and enqueue time.
    pub fn new(resolved: crate::sources::ResolvedTrack, requested_by: UserId) -> Self {
        Self {
            identifier: resolved.identifier,
            title: resolved.title,
            duration_ms: resolved.duration_ms,
            uri: resolved.uri,
            handle: resolved.handle,
            requested_by,
            enqueued_at: now_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Track {
        Track {
            identifier: "abc123".into(),
            title: "Test Tone".into(),
            duration_ms: Some(212_000),
            uri: Some("https://example.com/watch?v=abc123".into()),
            handle: PlayableHandle("https://cdn.example.com/abc123.webm".into()),
            requested_by: 42.into(),
            enqueued_at: 1_700_000_000_000,
        }
    }

    #[test]
    fn serializes_camel_case_fields() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["identifier"], "abc123");
        assert_eq!(value["durationMs"], 212_000);
        assert_eq!(value["requestedBy"], 42);
        assert_eq!(value["enqueuedAt"], 1_700_000_000_000u64);
        assert_eq!(value["handle"], "https://cdn.example.com/abc123.webm");
    }

    #[test]
    fn survives_a_json_round_trip() {
        let track = sample();
        let json = serde_json::to_string(&track).unwrap();
        let back: Track = serde_json::from_str(&json).unwrap();
        assert_eq!(back, track);
    }
}
