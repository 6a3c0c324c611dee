use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::common::errors::PlayerError;
use crate::common::types::{ChatId, UserId};
use crate::configs::PlayerConfig;
use crate::player::queue::TrackQueue;
use crate::player::state::{PlaybackState, PlayerStatus};
use crate::protocol::events::{PlayerEvent, TrackEndReason};
use crate::protocol::intents::{Intent, Outcome};
use crate::protocol::tracks::Track;
use crate::sources::{ResolvedTrack, TrackSource};
use crate::voice::{TransportEvent, VoiceTransport};

/// One message through a session's mailbox. Every mutation of a session
/// (user intents, transport events, resolver completions, reap probes)
/// arrives here, so the actor loop is the serialization turn.
pub(crate) enum SessionCommand {
    Intent {
        intent: Intent,
        reply: oneshot::Sender<Result<Outcome, PlayerError>>,
    },
    Transport(TransportEvent),
    Resolved {
        /// Stop-generation the resolve was started under. Stale results are
        /// discarded.
        generation: u64,
        query: String,
        requested_by: UserId,
        result: Result<ResolvedTrack, PlayerError>,
        reply: oneshot::Sender<Result<Outcome, PlayerError>>,
    },
    Reap {
        idle_threshold: Duration,
        reply: oneshot::Sender<bool>,
    },
    Shutdown,
}

/// Mailbox plus task handle for a running session actor.
pub(crate) struct SessionHandle {
    pub tx: flume::Sender<SessionCommand>,
    pub task: tokio::task::JoinHandle<()>,
}

/// Per-chat player: the queue, the current track and the state machine.
/// Exactly one actor task runs per chat; it owns this struct exclusively.
struct ChatSession {
    chat_id: ChatId,
    config: PlayerConfig,
    state: PlaybackState,
    queue: TrackQueue,
    current: Option<Track>,
    /// Track waiting for the voice connection while `Connecting`.
    pending: Option<Track>,
    /// Whether the transport holds a live connection for this chat.
    connected: bool,
    last_activity: Instant,
    /// Bumped by `stop`; resolve completions from older generations are
    /// discarded.
    stop_generation: u64,
    resolve_tasks: Vec<tokio::task::JoinHandle<()>>,
    transport: Arc<dyn VoiceTransport>,
    source: Arc<dyn TrackSource>,
    events: flume::Sender<PlayerEvent>,
    /// Sender into our own mailbox, cloned into resolve tasks.
    mailbox: flume::Sender<SessionCommand>,
    /// Process-wide count of accepted intents, shared with the dispatcher.
    applied: Arc<AtomicU64>,
}

pub(crate) fn spawn_session(
    chat_id: ChatId,
    config: PlayerConfig,
    transport: Arc<dyn VoiceTransport>,
    source: Arc<dyn TrackSource>,
    events: flume::Sender<PlayerEvent>,
    applied: Arc<AtomicU64>,
) -> SessionHandle {
    let (tx, rx) = flume::unbounded();
    let session = ChatSession {
        chat_id,
        state: PlaybackState::Idle,
        queue: TrackQueue::new(config.max_queue_size),
        current: None,
        pending: None,
        connected: false,
        last_activity: Instant::now(),
        stop_generation: 0,
        resolve_tasks: Vec::new(),
        transport,
        source,
        events,
        mailbox: tx.clone(),
        applied,
        config,
    };
    let task = tokio::spawn(run(session, rx));
    SessionHandle { tx, task }
}

async fn run(mut session: ChatSession, rx: flume::Receiver<SessionCommand>) {
    info!("Session created for chat {}", session.chat_id);

    while let Ok(command) = rx.recv_async().await {
        match command {
            SessionCommand::Intent { intent, reply } => {
                session.handle_intent(intent, reply).await;
            }
            SessionCommand::Transport(event) => {
                session.handle_transport(event).await;
            }
            SessionCommand::Resolved {
                generation,
                query,
                requested_by,
                result,
                reply,
            } => {
                session
                    .handle_resolved(generation, query, requested_by, result, reply)
                    .await;
            }
            SessionCommand::Reap {
                idle_threshold,
                reply,
            } => {
                // Pending mailbox entries are activity; an Idle session with
                // queued commands must not be reaped out from under them.
                if session.reapable(idle_threshold) && rx.is_empty() {
                    session.destroy().await;
                    let _ = reply.send(true);
                    break;
                }
                let _ = reply.send(false);
            }
            SessionCommand::Shutdown => {
                session.destroy().await;
                break;
            }
        }
    }

    info!("Session for chat {} terminated", session.chat_id);
}

impl ChatSession {
    async fn handle_intent(
        &mut self,
        intent: Intent,
        reply: oneshot::Sender<Result<Outcome, PlayerError>>,
    ) {
        self.touch();

        let result = match intent {
            Intent::Play {
                query,
                requested_by,
            } => {
                self.spawn_resolve(query, requested_by, reply);
                return; // replied from handle_resolved
            }
            Intent::Pause => self.pause().await,
            Intent::Resume => self.resume().await,
            Intent::Skip => self.skip().await,
            Intent::Stop => self.stop().await,
            Intent::Clear => Ok(Outcome::Cleared {
                removed: self.queue.clear(),
            }),
            Intent::Shuffle => {
                self.queue.shuffle();
                Ok(Outcome::Shuffled)
            }
            Intent::Remove { position } => self
                .queue
                .remove_at(position)
                .map(|track| Outcome::Removed { track }),
            Intent::Move { from, to } => self.queue.move_item(from, to).map(|_| Outcome::Moved),
            Intent::Status => Ok(Outcome::Status {
                status: self.status(),
            }),
        };

        self.reply_to_intent(reply, result);
    }

    /// Kick off track resolution in an abortable task. The per-chat turn
    /// ends here; the result re-enters the mailbox as `Resolved`.
    fn spawn_resolve(
        &mut self,
        query: String,
        requested_by: UserId,
        reply: oneshot::Sender<Result<Outcome, PlayerError>>,
    ) {
        let generation = self.stop_generation;
        let source = self.source.clone();
        let mailbox = self.mailbox.clone();
        let task = tokio::spawn(async move {
            let result = source.resolve(&query).await;
            let _ = mailbox.send(SessionCommand::Resolved {
                generation,
                query,
                requested_by,
                result,
                reply,
            });
        });
        self.resolve_tasks.push(task);
    }

    async fn handle_resolved(
        &mut self,
        generation: u64,
        query: String,
        requested_by: UserId,
        result: Result<ResolvedTrack, PlayerError>,
        reply: oneshot::Sender<Result<Outcome, PlayerError>>,
    ) {
        self.resolve_tasks.retain(|task| !task.is_finished());

        if generation != self.stop_generation {
            debug!(
                "Discarding resolve result for chat {} ({:?}): superseded by stop",
                self.chat_id, query
            );
            self.reply_to_intent(
                reply,
                Err(PlayerError::ResolutionFailed {
                    query,
                    reason: "cancelled by stop".into(),
                }),
            );
            return;
        }

        let resolved = match result {
            Ok(resolved) => resolved,
            Err(err) => {
                // Nothing enqueued; queue and state untouched.
                self.reply_to_intent(reply, Err(err));
                return;
            }
        };

        let track = Track::new(resolved, requested_by);
        let result = match self.state {
            // Idle: enqueue, then start from the queue head. The head is the
            // new track unless an earlier one was requeued (e.g. after a
            // failed connection attempt).
            PlaybackState::Idle => match self.queue.enqueue(track.clone()) {
                Ok(position) => match self.queue.dequeue_next() {
                    Ok(head) => {
                        self.state = PlaybackState::Connecting;
                        self.pending = Some(head.clone());
                        self.transport.open(self.chat_id).await;
                        if position == 1 {
                            Ok(Outcome::Playing { track: head })
                        } else {
                            Ok(Outcome::Enqueued {
                                track,
                                position: position - 1,
                            })
                        }
                    }
                    Err(err) => Err(err),
                },
                Err(err) => Err(err),
            },
            PlaybackState::Connecting | PlaybackState::Playing | PlaybackState::Paused => self
                .queue
                .enqueue(track.clone())
                .map(|position| Outcome::Enqueued { track, position }),
            state @ (PlaybackState::Stopping | PlaybackState::Destroyed) => {
                Err(PlayerError::InvalidStateTransition {
                    action: "play",
                    state,
                })
            }
        };

        self.reply_to_intent(reply, result);
    }

    async fn pause(&mut self) -> Result<Outcome, PlayerError> {
        if self.state != PlaybackState::Playing {
            return Err(PlayerError::InvalidStateTransition {
                action: "pause",
                state: self.state,
            });
        }
        self.transport.pause(self.chat_id).await?;
        self.state = PlaybackState::Paused;
        Ok(Outcome::Paused)
    }

    async fn resume(&mut self) -> Result<Outcome, PlayerError> {
        if self.state != PlaybackState::Paused {
            return Err(PlayerError::InvalidStateTransition {
                action: "resume",
                state: self.state,
            });
        }
        self.transport.resume(self.chat_id).await?;
        self.state = PlaybackState::Playing;
        Ok(Outcome::Resumed)
    }

    /// Skip with an empty queue lands in Idle; never an error.
    async fn skip(&mut self) -> Result<Outcome, PlayerError> {
        match self.state {
            PlaybackState::Playing | PlaybackState::Paused => {
                if let Some(track) = self.current.take() {
                    self.transport.stop_stream(self.chat_id).await;
                    self.emit(PlayerEvent::TrackEnd {
                        chat_id: self.chat_id,
                        track,
                        reason: TrackEndReason::Skipped,
                    });
                }
                self.advance().await;
                Ok(Outcome::Skipped {
                    next: self.current.clone(),
                })
            }
            PlaybackState::Connecting => {
                if let Some(track) = self.pending.take() {
                    self.emit(PlayerEvent::TrackEnd {
                        chat_id: self.chat_id,
                        track,
                        reason: TrackEndReason::Skipped,
                    });
                }
                self.pending = self.queue.dequeue_next().ok();
                Ok(Outcome::Skipped {
                    next: self.pending.clone(),
                })
            }
            _ => Ok(Outcome::Skipped { next: None }),
        }
    }

    async fn stop(&mut self) -> Result<Outcome, PlayerError> {
        // Cancel outstanding resolves; late results are discarded by the
        // generation check.
        self.stop_generation += 1;
        for task in self.resolve_tasks.drain(..) {
            task.abort();
        }

        let was_connecting = self.state == PlaybackState::Connecting;
        self.state = PlaybackState::Stopping;
        self.queue.clear();
        self.pending = None;

        if let Some(track) = self.current.take() {
            self.transport.stop_stream(self.chat_id).await;
            self.emit(PlayerEvent::TrackEnd {
                chat_id: self.chat_id,
                track,
                reason: TrackEndReason::Stopped,
            });
        }

        if self.config.auto_leave && (self.connected || was_connecting) {
            self.transport.close(self.chat_id).await;
            self.connected = false;
        }

        self.state = PlaybackState::Idle;
        self.touch();
        Ok(Outcome::Stopped)
    }

    async fn handle_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::ConnectionReady { .. } => self.connection_ready().await,
            TransportEvent::ConnectionFailed { reason, .. } => {
                self.connection_failed(reason).await;
            }
            TransportEvent::StreamEnded { .. } => {
                self.stream_over(TrackEndReason::Finished, None).await;
            }
            TransportEvent::StreamFailed { reason, .. } => {
                self.stream_over(TrackEndReason::Failed, Some(reason)).await;
            }
        }
    }

    async fn connection_ready(&mut self) {
        match self.state {
            PlaybackState::Connecting => {
                self.connected = true;
                match self.pending.take() {
                    Some(track) => self.start_track(track).await,
                    // Skipped down to an empty queue while connecting.
                    None => self.advance().await,
                }
            }
            PlaybackState::Idle => {
                // Stopped while connecting, auto_leave off: record the live
                // connection so the reaper closes it later.
                self.connected = true;
            }
            state => debug!(
                "Ignoring stale ConnectionReady for chat {} while {:?}",
                self.chat_id, state
            ),
        }
    }

    async fn connection_failed(&mut self, reason: String) {
        if self.state != PlaybackState::Connecting {
            debug!(
                "Ignoring stale ConnectionFailed for chat {} while {:?}",
                self.chat_id, self.state
            );
            return;
        }

        warn!(
            "Voice connection failed for chat {}: {}",
            self.chat_id, reason
        );
        self.connected = false;

        // Drop the pending track back to the queue head so a retry can be
        // user-initiated. No automatic retry.
        if let Some(track) = self.pending.take() {
            if self.queue.requeue_front(track).is_err() {
                warn!(
                    "Queue full for chat {}; dropping pending track after failed connection",
                    self.chat_id
                );
            }
        }

        self.state = PlaybackState::Idle;
        self.touch();
        self.emit(PlayerEvent::ConnectionFailed {
            chat_id: self.chat_id,
            reason,
        });
    }

    /// Shared path for `StreamEnded` and `StreamFailed`: surface the end,
    /// then auto-advance.
    async fn stream_over(&mut self, reason: TrackEndReason, failure: Option<String>) {
        if !matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
            debug!(
                "Ignoring stale stream event for chat {} while {:?}",
                self.chat_id, self.state
            );
            return;
        }

        let track = self.current.take();
        match failure {
            Some(failure) => self.emit(PlayerEvent::PlaybackFailed {
                chat_id: self.chat_id,
                track,
                reason: failure,
            }),
            None => {
                if let Some(track) = track {
                    self.emit(PlayerEvent::TrackEnd {
                        chat_id: self.chat_id,
                        track,
                        reason,
                    });
                }
            }
        }

        self.advance().await;
    }

    /// Dequeue and start the next track, or land in Idle. The idle clock
    /// starts here; teardown is the reaper's job.
    async fn advance(&mut self) {
        match self.queue.dequeue_next() {
            Ok(next) => self.start_track(next).await,
            Err(_) => {
                self.current = None;
                self.state = PlaybackState::Idle;
                self.touch();
                debug!("Queue empty for chat {}; now idle", self.chat_id);
            }
        }
    }

    async fn start_track(&mut self, track: Track) {
        info!(
            "Starting \"{}\" in chat {} (requested by {})",
            track.title, self.chat_id, track.requested_by
        );
        self.transport.start_stream(self.chat_id, &track.handle).await;
        self.current = Some(track.clone());
        self.state = PlaybackState::Playing;
        self.emit(PlayerEvent::TrackStart {
            chat_id: self.chat_id,
            track,
        });
    }

    fn reapable(&self, idle_threshold: Duration) -> bool {
        self.state == PlaybackState::Idle
            && self.resolve_tasks.iter().all(|task| task.is_finished())
            && self.last_activity.elapsed() >= idle_threshold
    }

    async fn destroy(&mut self) {
        for task in self.resolve_tasks.drain(..) {
            task.abort();
        }
        if self.connected {
            self.transport.close(self.chat_id).await;
            self.connected = false;
        }
        self.state = PlaybackState::Destroyed;
    }

    fn status(&self) -> PlayerStatus {
        PlayerStatus {
            chat_id: self.chat_id,
            state: self.state,
            current: self.current.clone().or_else(|| self.pending.clone()),
            queue: self.queue.peek_all(),
            queue_len: self.queue.len(),
        }
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    fn emit(&self, event: PlayerEvent) {
        // No observer is not an error.
        let _ = self.events.send(event);
    }

    fn reply_to_intent(
        &self,
        reply: oneshot::Sender<Result<Outcome, PlayerError>>,
        result: Result<Outcome, PlayerError>,
    ) {
        if result.is_ok() {
            self.applied.fetch_add(1, Ordering::Relaxed);
        }
        let _ = reply.send(result);
    }
}
