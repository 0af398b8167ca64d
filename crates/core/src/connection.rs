//! Upstream connection state and health types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of the single upstream broker connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// Whether market data is flowing on the current connection
///
/// Becomes `Active` once at least one subscription has been established
/// after a successful connect; reset to `Inactive` on disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketDataStatus {
    Inactive,
    Active,
}

/// Coarse data-quality indicator derived from `MarketDataStatus`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    Good,
    Unavailable,
}

/// Read-only snapshot of connection health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionHealth {
    pub connected: bool,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub uptime_ms: u64,
    pub reconnect_attempts: u32,
    pub data_quality: DataQuality,
}

/// Credentials for the upstream handshake
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamCredentials {
    pub account: String,
    pub host: String,
    pub port: u16,
    pub client_id: u32,
}

impl UpstreamCredentials {
    /// Paper-trading defaults used by the simulated upstream
    pub fn simulated(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            host: "127.0.0.1".to_string(),
            port: 7497,
            client_id: 1,
        }
    }
}
