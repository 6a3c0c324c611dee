//! The media-resolver boundary.
//!
//! A [`TrackSource`] turns a user query (URL, search terms, ...) into track
//! metadata plus a [`PlayableHandle`] the transport can stream. Resolution
//! may hit the network and be slow; the orchestrator runs it in an abortable
//! task off the per-chat turn, so implementations only need to be
//! cancellation-safe at `.await` points.

use async_trait::async_trait;

use crate::common::errors::PlayerError;
use crate::protocol::tracks::PlayableHandle;

/// Track metadata as produced by a source, before the orchestrator stamps it
/// with requester and enqueue time.
#[derive(Debug, Clone)]
pub struct ResolvedTrack {
    pub identifier: String,
    pub title: String,
    pub duration_ms: Option<u64>,
    pub uri: Option<String>,
    pub handle: PlayableHandle,
}

#[async_trait]
pub trait TrackSource: Send + Sync + 'static {
    /// Resolve `query` to a playable track.
    ///
    /// Any error means "nothing enqueued": the orchestrator leaves queue and
    /// state untouched and surfaces [`PlayerError::ResolutionFailed`] to the
    /// caller. Sources enforce their own policy here (unsupported URL,
    /// over-length media, region locks, ...).
    async fn resolve(&self, query: &str) -> Result<ResolvedTrack, PlayerError>;
}
