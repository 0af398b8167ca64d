//! Runner configuration
//!
//! Aggregates the per-crate configs and loads overrides from
//! `EDGELINK_*` environment variables. Unset or unparseable variables
//! fall back to the compiled defaults.

use edgelink_gateway::GatewayConfig;
use edgelink_session::SessionConfig;
use std::str::FromStr;

/// Top-level configuration for the gateway process
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub gateway: GatewayConfig,
    pub session: SessionConfig,
    /// Upstream request timeout applied by the router in ms
    pub request_timeout_ms: u64,
    /// Channel capacity for session events flowing to the router
    pub event_channel_capacity: usize,
    /// Static `token -> user_id` pairs accepted by the verifier
    pub auth_tokens: Vec<(String, String)>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            session: SessionConfig::default(),
            request_timeout_ms: 5_000,
            event_channel_capacity: 1024,
            auth_tokens: vec![("dev-token".to_string(), "dev-user".to_string())],
        }
    }
}

impl RunnerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let mut gateway = defaults.gateway;
        let mut session = defaults.session;

        gateway.handshake_delay_ms = get(&lookup, "EDGELINK_HANDSHAKE_DELAY_MS", gateway.handshake_delay_ms);
        gateway.heartbeat_interval_ms = get(&lookup, "EDGELINK_HEARTBEAT_INTERVAL_MS", gateway.heartbeat_interval_ms);
        gateway.tick_interval_ms = get(&lookup, "EDGELINK_TICK_INTERVAL_MS", gateway.tick_interval_ms);
        gateway.submit_delay_ms = get(&lookup, "EDGELINK_SUBMIT_DELAY_MS", gateway.submit_delay_ms);
        gateway.fill_delay_ms = get(&lookup, "EDGELINK_FILL_DELAY_MS", gateway.fill_delay_ms);
        gateway.commission_per_share = get(&lookup, "EDGELINK_COMMISSION_PER_SHARE", gateway.commission_per_share);
        gateway.min_commission = get(&lookup, "EDGELINK_MIN_COMMISSION", gateway.min_commission);
        gateway.default_reference_price = get(&lookup, "EDGELINK_REFERENCE_PRICE", gateway.default_reference_price);
        gateway.default_account = lookup("EDGELINK_ACCOUNT").unwrap_or(gateway.default_account);

        session.max_sessions = get(&lookup, "EDGELINK_MAX_SESSIONS", session.max_sessions);
        session.queue_capacity = get(&lookup, "EDGELINK_QUEUE_CAPACITY", session.queue_capacity);
        session.probe_interval_ms = get(&lookup, "EDGELINK_PROBE_INTERVAL_MS", session.probe_interval_ms);
        session.sweep_interval_ms = get(&lookup, "EDGELINK_SWEEP_INTERVAL_MS", session.sweep_interval_ms);
        session.liveness_timeout_ms = get(&lookup, "EDGELINK_LIVENESS_TIMEOUT_MS", session.liveness_timeout_ms);

        let request_timeout_ms = get(&lookup, "EDGELINK_REQUEST_TIMEOUT_MS", defaults.request_timeout_ms);

        // EDGELINK_AUTH_TOKENS holds comma-separated "token:user" pairs
        let auth_tokens = match lookup("EDGELINK_AUTH_TOKENS") {
            Some(raw) => parse_tokens(&raw),
            None => defaults.auth_tokens,
        };

        Self {
            gateway,
            session,
            request_timeout_ms,
            event_channel_capacity: defaults.event_channel_capacity,
            auth_tokens,
        }
    }
}

fn get<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

fn parse_tokens(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|pair| {
            let (token, user) = pair.split_once(':')?;
            let (token, user) = (token.trim(), user.trim());
            if token.is_empty() || user.is_empty() {
                return None;
            }
            Some((token.to_string(), user.to_string()))
        })
        .collect()
}
