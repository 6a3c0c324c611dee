use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::common::errors::PlayerError;
use crate::common::types::{ChatId, UserId};
use crate::configs::PlayerConfig;
use crate::player::session::SessionCommand;
use crate::player::state::{PlaybackState, PlayerStatus};
use crate::protocol::events::PlayerEvent;
use crate::protocol::intents::{Intent, Outcome};
use crate::server::registry::SessionRegistry;
use crate::sources::TrackSource;
use crate::voice::{TransportEvent, VoiceTransport};

/// Routes inbound intents and transport events to per-chat sessions.
///
/// Guarantees at most one in-flight mutation per chat: each session is an
/// actor with its own mailbox, so intents for the same chat are applied in
/// arrival order while different chats proceed concurrently. Transport
/// events go through the same mailboxes and therefore never interleave with
/// a user command mid-mutation.
pub struct Dispatcher {
    registry: Arc<SessionRegistry>,
    events_rx: flume::Receiver<PlayerEvent>,
    applied: Arc<AtomicU64>,
    reaper: tokio::task::JoinHandle<()>,
    pump: tokio::task::JoinHandle<()>,
}

impl Dispatcher {
    /// Wire up the orchestrator. `transport_events` is the channel the
    /// transport implementation delivers its completions on.
    pub fn new(
        config: PlayerConfig,
        transport: Arc<dyn VoiceTransport>,
        source: Arc<dyn TrackSource>,
        transport_events: flume::Receiver<TransportEvent>,
    ) -> Self {
        let (events_tx, events_rx) = flume::unbounded();
        let applied = Arc::new(AtomicU64::new(0));
        let registry = Arc::new(SessionRegistry::new(
            config.clone(),
            transport,
            source,
            events_tx,
            applied.clone(),
        ));

        let reaper = {
            let registry = registry.clone();
            let period = Duration::from_millis(config.reap_interval_ms.max(1));
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                // The first tick fires immediately; skip it.
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    registry.reap().await;
                }
            })
        };

        let pump = {
            let registry = registry.clone();
            tokio::spawn(async move {
                while let Ok(event) = transport_events.recv_async().await {
                    let chat_id = event.chat_id();
                    match registry.get(chat_id) {
                        Some(tx) => {
                            if tx.send(SessionCommand::Transport(event)).is_err() {
                                debug!("Dropping transport event for dead session {}", chat_id);
                            }
                        }
                        // Events never create sessions.
                        None => debug!("Dropping transport event for unknown chat {}", chat_id),
                    }
                }
            })
        };

        info!("Dispatcher started");
        Self {
            registry,
            events_rx,
            applied,
            reaper,
            pump,
        }
    }

    /// Single entry point: apply `intent` to `chat_id`'s session, creating
    /// it if absent. Returns once the intent has been accepted and validated.
    pub async fn handle(&self, chat_id: ChatId, intent: Intent) -> Result<Outcome, PlayerError> {
        // A send can race the reaper destroying the session; retry against a
        // freshly spawned one. The same applies to an intent that landed in
        // the mailbox just as the actor confirmed a reap probe and exited:
        // its reply is dropped with the mailbox, which we detect below.
        for _ in 0..4 {
            let tx = self.registry.get_or_create(chat_id);
            let (reply_tx, reply_rx) = oneshot::channel();
            let command = SessionCommand::Intent {
                intent: intent.clone(),
                reply: reply_tx,
            };
            if tx.send(command).is_ok() {
                match reply_rx.await {
                    Ok(result) => return result,
                    // A live actor dropped the reply: a resolve aborted by
                    // stop. That error stands.
                    Err(_) if !tx.is_disconnected() => {
                        return Err(Self::session_closed(&intent));
                    }
                    // The actor exited with the intent still queued; fall
                    // through and retry against a fresh session.
                    Err(_) => {}
                }
            }
            self.registry.remove_dead(chat_id);
        }
        Err(Self::session_closed(&intent))
    }

    fn session_closed(intent: &Intent) -> PlayerError {
        match intent {
            Intent::Play { query, .. } => PlayerError::ResolutionFailed {
                query: query.clone(),
                reason: "cancelled".into(),
            },
            other => PlayerError::InvalidStateTransition {
                action: other.action(),
                state: PlaybackState::Destroyed,
            },
        }
    }

    pub async fn play(
        &self,
        chat_id: ChatId,
        query: impl Into<String>,
        requested_by: UserId,
    ) -> Result<Outcome, PlayerError> {
        self.handle(
            chat_id,
            Intent::Play {
                query: query.into(),
                requested_by,
            },
        )
        .await
    }

    pub async fn pause(&self, chat_id: ChatId) -> Result<Outcome, PlayerError> {
        self.handle(chat_id, Intent::Pause).await
    }

    pub async fn resume(&self, chat_id: ChatId) -> Result<Outcome, PlayerError> {
        self.handle(chat_id, Intent::Resume).await
    }

    pub async fn skip(&self, chat_id: ChatId) -> Result<Outcome, PlayerError> {
        self.handle(chat_id, Intent::Skip).await
    }

    pub async fn stop(&self, chat_id: ChatId) -> Result<Outcome, PlayerError> {
        self.handle(chat_id, Intent::Stop).await
    }

    pub async fn clear(&self, chat_id: ChatId) -> Result<Outcome, PlayerError> {
        self.handle(chat_id, Intent::Clear).await
    }

    pub async fn shuffle(&self, chat_id: ChatId) -> Result<Outcome, PlayerError> {
        self.handle(chat_id, Intent::Shuffle).await
    }

    pub async fn remove_at(
        &self,
        chat_id: ChatId,
        position: usize,
    ) -> Result<Outcome, PlayerError> {
        self.handle(chat_id, Intent::Remove { position }).await
    }

    pub async fn move_item(
        &self,
        chat_id: ChatId,
        from: usize,
        to: usize,
    ) -> Result<Outcome, PlayerError> {
        self.handle(chat_id, Intent::Move { from, to }).await
    }

    pub async fn current_status(&self, chat_id: ChatId) -> Result<PlayerStatus, PlayerError> {
        match self.handle(chat_id, Intent::Status).await? {
            Outcome::Status { status } => Ok(status),
            other => unreachable!("status intent produced {:?}", other),
        }
    }

    /// Notification stream (`TrackStart`, `TrackEnd`, failures). One logical
    /// consumer: messages are taken, not broadcast.
    pub fn events(&self) -> flume::Receiver<PlayerEvent> {
        self.events_rx.clone()
    }

    /// Number of live sessions (any state).
    pub fn active_sessions(&self) -> usize {
        self.registry.len()
    }

    /// Total intents accepted across all chats since startup.
    pub fn intents_applied(&self) -> u64 {
        self.applied.load(Ordering::Relaxed)
    }

    /// Stop background tasks and drain every session. The registry is empty
    /// afterwards; the dispatcher must not be used again.
    pub async fn shutdown(&self) {
        info!("Dispatcher shutting down");
        self.reaper.abort();
        self.pump.abort();
        self.registry.shutdown().await;
    }
}
