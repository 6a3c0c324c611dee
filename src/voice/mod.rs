//! The voice-transport boundary.
//!
//! A [`VoiceTransport`] owns the live connections to chats' voice sessions.
//! `open`, `close`, `start_stream` and `stop_stream` initiate work and return
//! promptly; completions come back asynchronously as [`TransportEvent`]s on
//! the flume channel handed to the [`Dispatcher`](crate::server::Dispatcher),
//! which re-injects them into the owning session's serialization turn.
//! `pause` and `resume` acknowledge synchronously.

use async_trait::async_trait;

use crate::common::errors::PlayerError;
use crate::common::types::ChatId;
use crate::protocol::tracks::PlayableHandle;

/// Asynchronous completions and failures from the transport.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// `open(chat_id)` succeeded; the connection is live.
    ConnectionReady { chat_id: ChatId },
    /// `open(chat_id)` failed. No connection exists.
    ConnectionFailed { chat_id: ChatId, reason: String },
    /// The current stream played to its natural end.
    StreamEnded { chat_id: ChatId },
    /// The current stream died before its natural end.
    StreamFailed { chat_id: ChatId, reason: String },
}

impl TransportEvent {
    pub fn chat_id(&self) -> ChatId {
        match self {
            Self::ConnectionReady { chat_id }
            | Self::ConnectionFailed { chat_id, .. }
            | Self::StreamEnded { chat_id }
            | Self::StreamFailed { chat_id, .. } => *chat_id,
        }
    }
}

#[async_trait]
pub trait VoiceTransport: Send + Sync + 'static {
    /// Begin opening a voice connection. Completion arrives as
    /// `ConnectionReady` or `ConnectionFailed`. Must not block beyond
    /// initiating the request.
    async fn open(&self, chat_id: ChatId);

    /// Tear down the chat's voice connection, cancelling any active stream
    /// (without emitting `StreamEnded` for it) and any `open` still in
    /// flight.
    async fn close(&self, chat_id: ChatId);

    /// Begin streaming `handle` over the chat's open connection. The stream's
    /// end arrives as `StreamEnded` or `StreamFailed`.
    async fn start_stream(&self, chat_id: ChatId, handle: &PlayableHandle);

    /// Stop the active stream without closing the connection. No
    /// `StreamEnded` is emitted for a stream stopped this way.
    async fn stop_stream(&self, chat_id: ChatId);

    async fn pause(&self, chat_id: ChatId) -> Result<(), PlayerError>;

    async fn resume(&self, chat_id: ChatId) -> Result<(), PlayerError>;
}
