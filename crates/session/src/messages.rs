//! Client wire message types
//!
//! Inbound commands and outbound messages are internally tagged JSON
//! (`"type": "..."` in snake_case). Both sides are closed sum types, so a
//! mistyped message name is a deserialization error, not a silently
//! dropped event.

use chrono::{DateTime, Utc};
use edgelink_core::{
    AccountSummary, ConnectionHealth, ConnectionState, ExecutionReport, MarketData, Order,
    OrderId, OrderType, Position, Side,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Commands a client may send over its session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    Authenticate {
        token: String,
    },
    Ping,
    SubscribeMarketData {
        symbols: Vec<String>,
        #[serde(default)]
        fields: Vec<String>,
    },
    UnsubscribeMarketData {
        subscription_id: String,
    },
    PlaceOrder {
        symbol: String,
        action: Side,
        quantity: Decimal,
        order_type: OrderType,
        #[serde(default)]
        price: Option<Decimal>,
        #[serde(default)]
        aux_price: Option<Decimal>,
    },
    CancelOrder {
        order_id: OrderId,
    },
    GetPositions,
    GetAccountSummary,
    GetConnectionHealth,
}

/// Messages delivered to a client session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    // Session control
    ConnectionEstablished { session_id: String },
    AuthenticationSuccess { user_id: String },
    AuthenticationFailed { reason: String },
    Pong { timestamp: DateTime<Utc> },

    // Command responses
    SubscriptionConfirmed { subscription_id: String, symbols: Vec<String> },
    UnsubscriptionConfirmed { subscription_id: String },
    OrderResponse { order: Order },
    PositionsResponse { positions: Vec<Position> },
    AccountSummaryResponse { summary: AccountSummary },
    ConnectionHealthResponse { health: ConnectionHealth },

    // Domain broadcasts
    MarketData { tick: MarketData },
    OrderStatus { order: Order },
    ExecutionReport { report: ExecutionReport },
    PositionUpdate { position: Position },
    AccountUpdate { summary: AccountSummary },
    ConnectionStatus { status: ConnectionState },
    Error { code: String, message: String },
}

/// What actually travels down a session's transport sink
///
/// `Probe` maps to a transport-level ping frame; the transport reports the
/// acknowledgment back through `SessionManager::ack_liveness`.
#[derive(Debug, Clone)]
pub enum OutboundFrame {
    Message(ServerMessage),
    Probe,
}

/// Why a session was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    ClientDisconnect,
    AuthenticationFailed,
    LivenessTimeout,
    ServerShutdown,
}

impl CloseReason {
    /// Close code surfaced to the transport layer
    pub fn code(&self) -> u16 {
        match self {
            CloseReason::ClientDisconnect => 1000,
            CloseReason::ServerShutdown => 1001,
            CloseReason::AuthenticationFailed => 4001,
            CloseReason::LivenessTimeout => 4008,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::ClientDisconnect => "client_disconnect",
            CloseReason::ServerShutdown => "server_shutdown",
            CloseReason::AuthenticationFailed => "authentication_failed",
            CloseReason::LivenessTimeout => "liveness_timeout",
        }
    }
}

/// Events the session manager surfaces to the router
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// An authenticated session issued a command
    Command {
        session_id: String,
        command: ClientCommand,
    },
    /// A session was closed (normal lifecycle, not an error)
    Closed {
        session_id: String,
        reason: CloseReason,
    },
}
