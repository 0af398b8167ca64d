//! Typed event stream from the upstream adapter
//!
//! Everything the broker pushes back - connection state changes, ticks,
//! order updates, fills, portfolio changes - flows through one tagged
//! union on a tokio broadcast channel. Consumers match on the variant
//! instead of subscribing to stringly-named events.

use chrono::{DateTime, Utc};
use edgelink_core::{
    AccountSummary, ConnectionState, ExecutionReport, MarketData, Order, Position,
};

/// Events emitted by the upstream adapter
#[derive(Debug, Clone)]
pub enum UpstreamEvent {
    /// The connection state changed (idempotent sets are not re-emitted)
    ConnectionStatus(ConnectionState),

    /// Adapter-level liveness signal, independent of client sessions
    Heartbeat(DateTime<Utc>),

    /// A market data tick for a subscribed symbol
    MarketData(MarketData),

    /// An order transitioned; carries the post-transition snapshot
    OrderUpdate(Order),

    /// A fill was committed
    ExecutionReport(ExecutionReport),

    /// A position changed as a result of a fill
    PositionUpdate(Position),

    /// The account summary changed
    AccountUpdate(AccountSummary),

    /// A failure in background work (heartbeat, fill timer); no single
    /// session owns it, so it is broadcast like a domain event
    Error { code: &'static str, message: String },
}
