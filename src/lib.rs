//! Multi-tenant audio playback orchestrator for group voice sessions.
//!
//! For each active chat the orchestrator maintains an ordered queue of
//! requested tracks, drives a single playback stream at a time, and
//! transitions automatically between queued items, pauses, skips and idle
//! teardown. Chats progress independently; within one chat every mutation,
//! whether user intent or transport event, is applied in a strict serial
//! order by a dedicated session actor.
//!
//! The crate does not produce or decode audio. Embedders supply two
//! collaborators:
//!
//! - a [`sources::TrackSource`] that turns a user query into a playable
//!   handle plus metadata, and
//! - a [`voice::VoiceTransport`] that owns the live voice connections and
//!   streams the handles, reporting completions as
//!   [`voice::TransportEvent`]s.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use rustacall::{configs::PlayerConfig, server::Dispatcher};
//! # async fn wire(transport: Arc<dyn rustacall::voice::VoiceTransport>,
//! #               source: Arc<dyn rustacall::sources::TrackSource>,
//! #               transport_events: flume::Receiver<rustacall::voice::TransportEvent>) {
//! let dispatcher = Dispatcher::new(PlayerConfig::default(), transport, source, transport_events);
//! let outcome = dispatcher.play(rustacall::common::ChatId(-100123), "some song", 42.into()).await;
//! # let _ = outcome;
//! # }
//! ```

pub mod common;
pub mod configs;
pub mod player;
pub mod protocol;
pub mod server;
pub mod sources;
pub mod voice;

pub use common::{ChatId, PlayerError, UserId};
pub use configs::{Config, PlayerConfig};
pub use player::{PlaybackState, PlayerStatus};
pub use protocol::{Intent, Outcome, PlayerEvent, Track, TrackEndReason};
pub use server::Dispatcher;
