//! The event router

use edgelink_core::OrderRequest;
use edgelink_gateway::{UpstreamAdapter, UpstreamEvent};
use edgelink_session::{ClientCommand, ServerMessage, SessionEvent, SessionManager};
use log::{debug, error, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::error::RouterError;

/// Routes upstream events to sessions and session commands upstream
pub struct EventRouter {
    upstream: Arc<dyn UpstreamAdapter>,
    sessions: Arc<SessionManager>,
    request_timeout: Duration,
}

impl EventRouter {
    pub fn new(
        upstream: Arc<dyn UpstreamAdapter>,
        sessions: Arc<SessionManager>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            upstream,
            sessions,
            request_timeout,
        }
    }

    /// Spawn both routing loops
    pub fn spawn(
        self: Arc<Self>,
        session_events: mpsc::Receiver<SessionEvent>,
    ) -> (JoinHandle<()>, JoinHandle<()>) {
        let upstream_events = self.upstream.subscribe_events();

        let event_router = self.clone();
        let event_loop = tokio::spawn(async move {
            event_router.run_upstream_loop(upstream_events).await;
        });

        let command_loop = tokio::spawn(async move {
            self.run_command_loop(session_events).await;
        });

        (event_loop, command_loop)
    }

    /// Forward every upstream event to the session broadcast
    async fn run_upstream_loop(&self, mut events: broadcast::Receiver<UpstreamEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(message) = Self::to_server_message(event) {
                        self.sessions.broadcast(message, None);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Upstream event stream lagged; skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    // The adapter's event side died; force a clean
                    // disconnect before anyone can reconnect into
                    // half-torn-down state
                    error!("Upstream event stream closed; forcing disconnect");
                    if let Err(e) = self.upstream.disconnect().await {
                        error!("Disconnect after stream failure also failed: {}", e);
                    }
                    break;
                }
            }
        }
    }

    /// Dispatch each inbound session command and reply exactly once
    async fn run_command_loop(&self, mut events: mpsc::Receiver<SessionEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::Command {
                    session_id,
                    command,
                } => {
                    let reply = match self.dispatch(command).await {
                        Ok(message) => message,
                        Err(e) => ServerMessage::Error {
                            code: e.code().to_string(),
                            message: e.to_string(),
                        },
                    };
                    self.sessions.send_to_session(&session_id, reply);
                }
                SessionEvent::Closed { session_id, reason } => {
                    // Normal lifecycle event; nothing to tear down here
                    debug!("Session {} closed ({})", session_id, reason.as_str());
                }
            }
        }
    }

    /// Translate an upstream event into its broadcast message.
    /// Heartbeats are adapter-internal liveness and are not forwarded.
    fn to_server_message(event: UpstreamEvent) -> Option<ServerMessage> {
        match event {
            UpstreamEvent::ConnectionStatus(status) => {
                Some(ServerMessage::ConnectionStatus { status })
            }
            UpstreamEvent::Heartbeat(_) => None,
            UpstreamEvent::MarketData(tick) => Some(ServerMessage::MarketData { tick }),
            UpstreamEvent::OrderUpdate(order) => Some(ServerMessage::OrderStatus { order }),
            UpstreamEvent::ExecutionReport(report) => {
                Some(ServerMessage::ExecutionReport { report })
            }
            UpstreamEvent::PositionUpdate(position) => {
                Some(ServerMessage::PositionUpdate { position })
            }
            UpstreamEvent::AccountUpdate(summary) => Some(ServerMessage::AccountUpdate { summary }),
            UpstreamEvent::Error { code, message } => Some(ServerMessage::Error {
                code: code.to_string(),
                message,
            }),
        }
    }

    /// Run one adapter call under the request timeout
    async fn with_timeout<T, F>(&self, future: F) -> Result<T, RouterError>
    where
        F: Future<Output = edgelink_gateway::Result<T>>,
    {
        timeout(self.request_timeout, future)
            .await
            .map_err(|_| RouterError::Timeout)?
            .map_err(RouterError::from)
    }

    async fn dispatch(&self, command: ClientCommand) -> Result<ServerMessage, RouterError> {
        match command {
            ClientCommand::SubscribeMarketData { symbols, fields } => {
                let subscription = self
                    .with_timeout(self.upstream.subscribe_market_data(symbols, fields))
                    .await?;
                Ok(ServerMessage::SubscriptionConfirmed {
                    subscription_id: subscription.id,
                    symbols: subscription.symbols,
                })
            }
            ClientCommand::UnsubscribeMarketData { subscription_id } => {
                let subscription = self
                    .with_timeout(self.upstream.unsubscribe_market_data(&subscription_id))
                    .await?;
                Ok(ServerMessage::UnsubscriptionConfirmed {
                    subscription_id: subscription.id,
                })
            }
            ClientCommand::PlaceOrder {
                symbol,
                action,
                quantity,
                order_type,
                price,
                aux_price,
            } => {
                let request = OrderRequest {
                    symbol,
                    action,
                    quantity,
                    order_type,
                    price,
                    aux_price,
                    account: None,
                };
                let order = self.with_timeout(self.upstream.place_order(request)).await?;
                Ok(ServerMessage::OrderResponse { order })
            }
            ClientCommand::CancelOrder { order_id } => {
                let order = self.with_timeout(self.upstream.cancel_order(order_id)).await?;
                Ok(ServerMessage::OrderResponse { order })
            }
            ClientCommand::GetPositions => {
                let positions = self.with_timeout(self.upstream.positions()).await?;
                Ok(ServerMessage::PositionsResponse { positions })
            }
            ClientCommand::GetAccountSummary => {
                let summary = self.with_timeout(self.upstream.account_summary()).await?;
                Ok(ServerMessage::AccountSummaryResponse { summary })
            }
            ClientCommand::GetConnectionHealth => {
                let health = self.upstream.connection_health().await;
                Ok(ServerMessage::ConnectionHealthResponse { health })
            }
            // Handled by the session manager before the gate; they never
            // reach the router
            ClientCommand::Authenticate { .. } | ClientCommand::Ping => Err(
                RouterError::Validation("command handled at the session layer".to_string()),
            ),
        }
    }
}
