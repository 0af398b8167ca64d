//! Upstream adapters
//!
//! `UpstreamAdapter` is the seam between the gateway and a broker backend.
//! Only the simulator ships here; a live broker adapter implements the
//! same trait and the ledger, registry and router stay untouched.

pub mod simulated;

use async_trait::async_trait;
use edgelink_core::{
    AccountSummary, ConnectionHealth, Order, OrderId, OrderRequest, Position, Subscription,
    UpstreamCredentials,
};
use tokio::sync::broadcast;

use crate::error::Result;
use crate::events::UpstreamEvent;

/// Operations on the single logical upstream broker connection
#[async_trait]
pub trait UpstreamAdapter: Send + Sync {
    /// Perform the upstream handshake. Fails if a connection attempt is
    /// already in progress or established.
    async fn connect(&self, credentials: UpstreamCredentials) -> Result<()>;

    /// Tear down the connection. Clears all subscriptions and
    /// per-connection cached data. Always succeeds.
    async fn disconnect(&self) -> Result<()>;

    /// Start a market data subscription; ticks flow on the event stream.
    /// Subscriptions are connection-wide, not session-scoped.
    async fn subscribe_market_data(
        &self,
        symbols: Vec<String>,
        fields: Vec<String>,
    ) -> Result<Subscription>;

    /// Stop and remove a subscription by id
    async fn unsubscribe_market_data(&self, subscription_id: &str) -> Result<Subscription>;

    /// Submit an order; returns the `PendingSubmit` snapshot
    async fn place_order(&self, request: OrderRequest) -> Result<Order>;

    /// Cancel a non-terminal order
    async fn cancel_order(&self, order_id: OrderId) -> Result<Order>;

    /// Snapshot of one order
    async fn order(&self, order_id: OrderId) -> Result<Order>;

    /// Snapshot of all non-flat positions
    async fn positions(&self) -> Result<Vec<Position>>;

    /// Snapshot of the account summary
    async fn account_summary(&self) -> Result<AccountSummary>;

    /// Read-only connection health snapshot
    async fn connection_health(&self) -> ConnectionHealth;

    /// Subscribe to the typed upstream event stream
    fn subscribe_events(&self) -> broadcast::Receiver<UpstreamEvent>;
}
