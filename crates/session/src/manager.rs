//! Session Manager - lifecycle, liveness and delivery
//!
//! Every session moves through `unauthenticated -> authenticated ->
//! closed`. Domain broadcasts only reach authenticated sessions; a session
//! whose sink is momentarily unwritable gets its messages queued in a
//! bounded FIFO instead of dropped, and the queue drains in order before
//! any newer live message.
//!
//! All per-session mutation happens under the session's map entry lock, so
//! a broadcast can never race the same session's close or flush.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval};
use uuid::Uuid;

use crate::auth::TokenVerifier;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::messages::{ClientCommand, CloseReason, OutboundFrame, ServerMessage, SessionEvent};

/// Opaque session identifier
pub type SessionId = String;

/// One connected client transport
struct Session {
    id: SessionId,
    authenticated: bool,
    user_id: Option<String>,
    sink: mpsc::Sender<OutboundFrame>,
    /// Bounded backlog; non-empty only while authenticated
    queue: VecDeque<ServerMessage>,
    last_liveness_ack: Instant,
    #[allow(dead_code)]
    connected_at: DateTime<Utc>,
}

impl Session {
    fn touch(&mut self) {
        self.last_liveness_ack = Instant::now();
    }
}

/// Owns the set of connected client sessions
pub struct SessionManager {
    sessions: DashMap<SessionId, Session>,
    /// Open-session count reserved atomically at accept time, so two
    /// concurrent connects cannot both slip past the capacity gate
    open_sessions: AtomicUsize,
    verifier: Arc<dyn TokenVerifier>,
    events: mpsc::Sender<SessionEvent>,
    cfg: SessionConfig,
}

impl SessionManager {
    /// Create a session manager emitting `SessionEvent`s on `events`
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        events: mpsc::Sender<SessionEvent>,
        cfg: SessionConfig,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            open_sessions: AtomicUsize::new(0),
            verifier,
            events,
            cfg,
        }
    }

    /// Number of open sessions
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Whether a session exists and is authenticated
    pub fn is_authenticated(&self, session_id: &str) -> bool {
        self.sessions
            .get(session_id)
            .map(|s| s.authenticated)
            .unwrap_or(false)
    }

    /// Accept a new transport connection
    ///
    /// The capacity gate applies before any session state is created. On
    /// success the `connection_established` message is sent immediately;
    /// it is the one message exempt from the authentication gate.
    pub fn connect(&self, sink: mpsc::Sender<OutboundFrame>) -> Result<SessionId, SessionError> {
        // Reserve the slot before creating anything; the reservation is
        // released on rejection and on session close
        if self.open_sessions.fetch_add(1, Ordering::SeqCst) >= self.cfg.max_sessions {
            self.open_sessions.fetch_sub(1, Ordering::SeqCst);
            warn!(
                "Rejecting connection: session capacity {} reached",
                self.cfg.max_sessions
            );
            return Err(SessionError::CapacityReached {
                max: self.cfg.max_sessions,
            });
        }

        let session_id = Uuid::new_v4().to_string();
        let hello = ServerMessage::ConnectionEstablished {
            session_id: session_id.clone(),
        };
        if sink.try_send(OutboundFrame::Message(hello)).is_err() {
            debug!("Session {} sink closed before greeting", session_id);
        }

        self.sessions.insert(
            session_id.clone(),
            Session {
                id: session_id.clone(),
                authenticated: false,
                user_id: None,
                sink,
                queue: VecDeque::new(),
                last_liveness_ack: Instant::now(),
                connected_at: Utc::now(),
            },
        );

        info!(
            "Session {} connected ({} open)",
            session_id,
            self.sessions.len()
        );
        Ok(session_id)
    }

    /// Handle one decoded inbound command from a session
    ///
    /// `authenticate` and `ping` pass the authentication gate; everything
    /// else is rejected until the session is authenticated, then forwarded
    /// to the router.
    pub async fn handle_message(&self, session_id: &str, command: ClientCommand) {
        match command {
            ClientCommand::Authenticate { token } => {
                self.authenticate(session_id, &token).await;
            }
            ClientCommand::Ping => {
                if let Some(mut session) = self.sessions.get_mut(session_id) {
                    session.touch();
                    let pong = ServerMessage::Pong {
                        timestamp: Utc::now(),
                    };
                    Self::deliver(&mut session, pong, self.cfg.queue_capacity);
                }
            }
            command => {
                if !self.is_authenticated(session_id) {
                    self.send_to_session(
                        session_id,
                        ServerMessage::Error {
                            code: "authentication_required".to_string(),
                            message: "authenticate before issuing commands".to_string(),
                        },
                    );
                    return;
                }
                let event = SessionEvent::Command {
                    session_id: session_id.to_string(),
                    command,
                };
                if self.events.send(event).await.is_err() {
                    warn!("Session event channel closed; dropping command");
                }
            }
        }
    }

    /// Verify a token and flip the session to authenticated
    async fn authenticate(&self, session_id: &str, token: &str) {
        // Verify without holding the session entry
        match self.verifier.verify(token).await {
            Ok(claims) => {
                let Some(mut session) = self.sessions.get_mut(session_id) else {
                    return;
                };
                session.authenticated = true;
                session.user_id = Some(claims.user_id.clone());
                session.touch();
                info!("Session {} authenticated as {}", session_id, claims.user_id);

                let success = ServerMessage::AuthenticationSuccess {
                    user_id: claims.user_id,
                };
                Self::deliver(&mut session, success, self.cfg.queue_capacity);
                // Anything queued while undeliverable drains in FIFO order
                Self::flush(&mut session);
            }
            Err(e) => {
                info!("Session {} failed authentication: {}", session_id, e);
                self.send_to_session(
                    session_id,
                    ServerMessage::AuthenticationFailed {
                        reason: e.to_string(),
                    },
                );
                self.close_session(session_id, CloseReason::AuthenticationFailed)
                    .await;
            }
        }
    }

    /// Transport-level liveness acknowledgment (pong frame) for a session
    pub fn ack_liveness(&self, session_id: &str) {
        if let Some(mut session) = self.sessions.get_mut(session_id) {
            session.touch();
        }
    }

    /// Deliver to every authenticated session, optionally excluding one
    pub fn broadcast(&self, message: ServerMessage, exclude: Option<&str>) {
        for mut entry in self.sessions.iter_mut() {
            if !entry.authenticated {
                continue;
            }
            if exclude.is_some_and(|id| id == entry.id) {
                continue;
            }
            Self::deliver(&mut entry, message.clone(), self.cfg.queue_capacity);
        }
    }

    /// Deliver to a single session by id
    pub fn send_to_session(&self, session_id: &str, message: ServerMessage) {
        if let Some(mut session) = self.sessions.get_mut(session_id) {
            Self::deliver(&mut session, message, self.cfg.queue_capacity);
        } else {
            debug!("Dropping message for unknown session {}", session_id);
        }
    }

    /// Deliver to every session belonging to a user
    pub fn send_to_user(&self, user_id: &str, message: ServerMessage) {
        for mut entry in self.sessions.iter_mut() {
            if entry.user_id.as_deref() == Some(user_id) {
                Self::deliver(&mut entry, message.clone(), self.cfg.queue_capacity);
            }
        }
    }

    /// Close a session and drop its queue
    ///
    /// Normal lifecycle, not an error: emits `SessionEvent::Closed` with
    /// the reason so observers can account for it.
    pub async fn close_session(&self, session_id: &str, reason: CloseReason) {
        if let Some((_, session)) = self.sessions.remove(session_id) {
            self.open_sessions.fetch_sub(1, Ordering::SeqCst);
            info!(
                "Session {} closed: {} (code {}, {} queued dropped)",
                session_id,
                reason.as_str(),
                reason.code(),
                session.queue.len()
            );
            let event = SessionEvent::Closed {
                session_id: session_id.to_string(),
                reason,
            };
            if self.events.send(event).await.is_err() {
                debug!("Session event channel closed during close notification");
            }
        }
    }

    /// Start the liveness probe and eviction sweep timers
    pub fn spawn_liveness(self: &Arc<Self>) -> (JoinHandle<()>, JoinHandle<()>) {
        let probe_manager = self.clone();
        let probe = tokio::spawn(async move {
            let mut tick = interval(Duration::from_millis(probe_manager.cfg.probe_interval_ms));
            tick.tick().await;
            loop {
                tick.tick().await;
                for session in probe_manager.sessions.iter() {
                    // Best effort; an unwritable sink will fail the sweep soon
                    let _ = session.sink.try_send(OutboundFrame::Probe);
                }
            }
        });

        let sweep_manager = self.clone();
        let timeout = Duration::from_millis(self.cfg.liveness_timeout_ms);
        let sweep = tokio::spawn(async move {
            let mut tick = interval(Duration::from_millis(sweep_manager.cfg.sweep_interval_ms));
            tick.tick().await;
            loop {
                tick.tick().await;
                let expired: Vec<SessionId> = sweep_manager
                    .sessions
                    .iter()
                    .filter(|s| s.last_liveness_ack.elapsed() > timeout)
                    .map(|s| s.id.clone())
                    .collect();
                for session_id in expired {
                    warn!("Evicting session {} after liveness timeout", session_id);
                    sweep_manager
                        .close_session(&session_id, CloseReason::LivenessTimeout)
                        .await;
                }
            }
        });

        (probe, sweep)
    }

    /// Close every session (shutdown path)
    pub async fn close_all(&self, reason: CloseReason) {
        let ids: Vec<SessionId> = self.sessions.iter().map(|s| s.id.clone()).collect();
        for session_id in ids {
            self.close_session(&session_id, reason).await;
        }
    }

    /// Deliver one message to a session, queueing when the sink is not
    /// writable. Queued messages always go out before newer ones.
    fn deliver(session: &mut Session, message: ServerMessage, queue_capacity: usize) {
        Self::flush(session);

        if session.queue.is_empty() {
            match session.sink.try_send(OutboundFrame::Message(message)) {
                Ok(()) => return,
                Err(e) => {
                    let OutboundFrame::Message(message) = e.into_inner() else {
                        return;
                    };
                    Self::enqueue(session, message, queue_capacity);
                }
            }
        } else {
            Self::enqueue(session, message, queue_capacity);
        }
    }

    /// Push onto the bounded queue, dropping the oldest entry when full.
    /// Unauthenticated sessions never accumulate a backlog.
    fn enqueue(session: &mut Session, message: ServerMessage, queue_capacity: usize) {
        if !session.authenticated {
            debug!(
                "Dropping undeliverable message for unauthenticated session {}",
                session.id
            );
            return;
        }
        if session.queue.len() >= queue_capacity {
            session.queue.pop_front();
            warn!(
                "Session {} queue full; dropped oldest message",
                session.id
            );
        }
        session.queue.push_back(message);
    }

    /// Drain as much of the backlog as the sink will take, in FIFO order
    fn flush(session: &mut Session) {
        while let Some(message) = session.queue.pop_front() {
            if let Err(e) = session.sink.try_send(OutboundFrame::Message(message)) {
                // Sink still unwritable; put the message back and stop
                if let OutboundFrame::Message(message) = e.into_inner() {
                    session.queue.push_front(message);
                }
                break;
            }
        }
    }
}
