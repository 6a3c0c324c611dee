use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::common::types::ChatId;
use crate::configs::PlayerConfig;
use crate::player::session::{SessionCommand, SessionHandle, spawn_session};
use crate::protocol::events::PlayerEvent;
use crate::sources::TrackSource;
use crate::voice::VoiceTransport;

/// Process-wide map of live sessions. The only structure touched from
/// multiple chats; each entry's mutation happens under a short-held shard
/// lock, never across an await.
pub(crate) struct SessionRegistry {
    sessions: DashMap<ChatId, SessionHandle>,
    config: PlayerConfig,
    transport: Arc<dyn VoiceTransport>,
    source: Arc<dyn TrackSource>,
    events: flume::Sender<PlayerEvent>,
    applied: Arc<AtomicU64>,
}

impl SessionRegistry {
    pub fn new(
        config: PlayerConfig,
        transport: Arc<dyn VoiceTransport>,
        source: Arc<dyn TrackSource>,
        events: flume::Sender<PlayerEvent>,
        applied: Arc<AtomicU64>,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            config,
            transport,
            source,
            events,
            applied,
        }
    }

    /// Return the chat's mailbox, spawning a fresh session actor if none
    /// exists. Insert-if-absent is atomic via the map entry.
    pub fn get_or_create(&self, chat_id: ChatId) -> flume::Sender<SessionCommand> {
        self.sessions
            .entry(chat_id)
            .or_insert_with(|| {
                spawn_session(
                    chat_id,
                    self.config.clone(),
                    self.transport.clone(),
                    self.source.clone(),
                    self.events.clone(),
                    self.applied.clone(),
                )
            })
            .tx
            .clone()
    }

    /// Mailbox of an existing session, if any. Transport events use this:
    /// they never create sessions.
    pub fn get(&self, chat_id: ChatId) -> Option<flume::Sender<SessionCommand>> {
        self.sessions.get(&chat_id).map(|entry| entry.tx.clone())
    }

    /// Drop a dead entry so the caller can retry against a fresh session.
    /// Only removes the entry if its mailbox is actually disconnected, to
    /// avoid racing a concurrent re-create.
    pub fn remove_dead(&self, chat_id: ChatId) {
        self.sessions
            .remove_if(&chat_id, |_, handle| handle.tx.is_disconnected());
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// One reaper pass: probe every session through its own mailbox and
    /// remove the ones that confirmed destruction. A session that is not
    /// Idle, or still has pending commands, refuses the probe, so an
    /// actively playing chat is never evicted regardless of wall-clock age.
    pub async fn reap(&self) {
        let idle_threshold = Duration::from_millis(self.config.idle_timeout_ms);
        let chats: Vec<ChatId> = self.sessions.iter().map(|entry| *entry.key()).collect();

        for chat_id in chats {
            let Some(tx) = self.get(chat_id) else { continue };

            let (reply_tx, reply_rx) = oneshot::channel();
            if tx
                .send(SessionCommand::Reap {
                    idle_threshold,
                    reply: reply_tx,
                })
                .is_err()
            {
                // Actor already gone.
                self.remove_dead(chat_id);
                continue;
            }

            match reply_rx.await {
                Ok(true) => {
                    if let Some((_, handle)) = self.sessions.remove(&chat_id) {
                        let _ = handle.task.await;
                    }
                    info!("Reaped idle session for chat {}", chat_id);
                }
                Ok(false) => {}
                Err(_) => self.remove_dead(chat_id),
            }
        }
    }

    /// Drain every session: ask each actor to tear down and wait for it.
    pub async fn shutdown(&self) {
        let chats: Vec<ChatId> = self.sessions.iter().map(|entry| *entry.key()).collect();
        debug!("Shutting down {} session(s)", chats.len());

        let mut tasks = Vec::new();
        for chat_id in chats {
            if let Some((_, handle)) = self.sessions.remove(&chat_id) {
                let _ = handle.tx.send(SessionCommand::Shutdown);
                tasks.push(handle.task);
            }
        }
        for result in futures::future::join_all(tasks).await {
            if let Err(err) = result {
                if !err.is_cancelled() {
                    tracing::error!("Session task panicked during shutdown: {}", err);
                }
            }
        }
    }
}
