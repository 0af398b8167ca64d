//! Bootstrap - wiring the gateway process together
//!
//! Constructs the upstream adapter, session manager and event router,
//! spawns their background tasks, and hands back a `Gateway` that owns
//! the lot for the lifetime of the process.

use crate::config::RunnerConfig;
use edgelink_core::UpstreamCredentials;
use edgelink_gateway::{GatewayError, SimulatedUpstream, UpstreamAdapter};
use edgelink_router::EventRouter;
use edgelink_session::{CloseReason, SessionManager, StaticTokenVerifier};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A running gateway: the wired components plus their background tasks
pub struct Gateway {
    pub upstream: Arc<SimulatedUpstream>,
    pub sessions: Arc<SessionManager>,
    config: RunnerConfig,
    tasks: Vec<JoinHandle<()>>,
}

impl Gateway {
    /// Wire up all components and spawn the router and liveness tasks
    pub fn bootstrap(config: RunnerConfig) -> Self {
        let upstream = Arc::new(SimulatedUpstream::new(config.gateway.clone()));

        let verifier = config
            .auth_tokens
            .iter()
            .fold(StaticTokenVerifier::new(), |verifier, (token, user)| {
                verifier.with_token(token.clone(), user.clone())
            });

        let (events_tx, events_rx) = mpsc::channel(config.event_channel_capacity);
        let sessions = Arc::new(SessionManager::new(
            Arc::new(verifier),
            events_tx,
            config.session.clone(),
        ));

        let router = Arc::new(EventRouter::new(
            upstream.clone() as Arc<dyn UpstreamAdapter>,
            sessions.clone(),
            Duration::from_millis(config.request_timeout_ms),
        ));

        let (upstream_loop, command_loop) = router.spawn(events_rx);
        let (probe, sweep) = sessions.spawn_liveness();

        log::info!(
            "Gateway bootstrapped: {} auth token(s), max {} sessions",
            config.auth_tokens.len(),
            config.session.max_sessions
        );

        Self {
            upstream,
            sessions,
            config,
            tasks: vec![upstream_loop, command_loop, probe, sweep],
        }
    }

    /// Connect to the upstream broker with the configured account
    pub async fn connect_upstream(&self) -> Result<(), GatewayError> {
        let credentials = UpstreamCredentials::simulated(&self.config.gateway.default_account);
        self.upstream.connect(credentials).await
    }

    /// Close every session, disconnect upstream and stop background tasks
    pub async fn shutdown(self) {
        self.sessions.close_all(CloseReason::ServerShutdown).await;
        if let Err(e) = self.upstream.disconnect().await {
            log::warn!("Upstream disconnect during shutdown: {e}");
        }
        for task in self.tasks {
            task.abort();
        }
        log::info!("Gateway shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgelink_gateway::GatewayConfig;
    use edgelink_session::{ClientCommand, OutboundFrame, ServerMessage, SessionConfig};

    fn fast_config() -> RunnerConfig {
        RunnerConfig {
            gateway: GatewayConfig::fast(),
            session: SessionConfig::fast(),
            ..RunnerConfig::default()
        }
    }

    #[tokio::test]
    async fn test_bootstrap_wires_auth_and_commands() {
        let gateway = Gateway::bootstrap(fast_config());
        gateway.connect_upstream().await.unwrap();

        let (sink, mut rx) = mpsc::channel(64);
        let session_id = gateway.sessions.connect(sink).unwrap();
        rx.recv().await.unwrap(); // connection_established

        gateway
            .sessions
            .handle_message(
                &session_id,
                ClientCommand::Authenticate {
                    token: "dev-token".to_string(),
                },
            )
            .await;
        match rx.recv().await.unwrap() {
            OutboundFrame::Message(ServerMessage::AuthenticationSuccess { user_id }) => {
                assert_eq!(user_id, "dev-user");
            }
            other => panic!("unexpected frame: {other:?}"),
        }

        gateway
            .sessions
            .handle_message(&session_id, ClientCommand::GetConnectionHealth)
            .await;
        loop {
            if let OutboundFrame::Message(ServerMessage::ConnectionHealthResponse { health }) =
                rx.recv().await.unwrap()
            {
                assert!(health.connected);
                break;
            }
        }

        gateway.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_closes_sessions_and_upstream() {
        let gateway = Gateway::bootstrap(fast_config());
        gateway.connect_upstream().await.unwrap();

        let (sink, _rx) = mpsc::channel(64);
        gateway.sessions.connect(sink).unwrap();

        let upstream = gateway.upstream.clone();
        let sessions = gateway.sessions.clone();
        gateway.shutdown().await;

        assert_eq!(sessions.session_count(), 0);
        assert!(!upstream.connection_health().await.connected);
    }
}
