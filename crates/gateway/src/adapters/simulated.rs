//! Simulated upstream broker
//!
//! Stands in for a live broker backend: the handshake is a delay, market
//! data is a per-symbol random walk, and order acknowledgments and fills
//! arrive on timers. Everything is surfaced through the same
//! `UpstreamAdapter` trait and `UpstreamEvent` stream a real adapter
//! would use.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use edgelink_core::{
    AccountSummary, ConnectionHealth, ConnectionState, DataQuality, MarketData, MarketDataStatus,
    Order, OrderId, OrderRequest, Position, Subscription, UpstreamCredentials,
};
use log::{debug, info, warn};
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep};

use crate::adapters::UpstreamAdapter;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::events::UpstreamEvent;
use crate::ledger::OrderLedger;
use crate::subscriptions::SubscriptionRegistry;

/// The simulated upstream connection
///
/// Owns the connection state machine, the order ledger, the subscription
/// registry and the simulated portfolio. All consumers receive snapshots;
/// nothing hands out references into the mutable state.
pub struct SimulatedUpstream {
    cfg: GatewayConfig,
    state: Arc<RwLock<ConnectionState>>,
    md_status: Arc<RwLock<MarketDataStatus>>,
    events: broadcast::Sender<UpstreamEvent>,
    ledger: Arc<OrderLedger>,
    registry: Arc<SubscriptionRegistry>,
    /// Last traded price per symbol, the reference for market order fills
    last_prices: Arc<DashMap<String, Decimal>>,
    positions: Arc<DashMap<String, Position>>,
    account: Arc<RwLock<AccountSummary>>,
    last_heartbeat: Arc<RwLock<Option<DateTime<Utc>>>>,
    connected_at: Arc<RwLock<Option<tokio::time::Instant>>>,
    reconnect_attempts: Arc<AtomicU32>,
    /// Bumped by every disconnect; an in-flight handshake whose epoch no
    /// longer matches must not commit its result
    epoch: AtomicU64,
    heartbeat_task: Mutex<Option<JoinHandle<()>>>,
    /// Tick producer tasks keyed by subscription id
    tick_tasks: DashMap<String, JoinHandle<()>>,
}

impl SimulatedUpstream {
    /// Create a disconnected simulated upstream
    pub fn new(cfg: GatewayConfig) -> Self {
        let (events, _) = broadcast::channel(cfg.event_capacity);
        let ledger = Arc::new(OrderLedger::new(
            cfg.commission_per_share,
            cfg.min_commission,
        ));
        let account = AccountSummary::simulated(cfg.default_account.clone(), cfg.initial_cash);

        Self {
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            md_status: Arc::new(RwLock::new(MarketDataStatus::Inactive)),
            events,
            ledger,
            registry: Arc::new(SubscriptionRegistry::new()),
            last_prices: Arc::new(DashMap::new()),
            positions: Arc::new(DashMap::new()),
            account: Arc::new(RwLock::new(account)),
            last_heartbeat: Arc::new(RwLock::new(None)),
            connected_at: Arc::new(RwLock::new(None)),
            reconnect_attempts: Arc::new(AtomicU32::new(0)),
            epoch: AtomicU64::new(0),
            heartbeat_task: Mutex::new(None),
            tick_tasks: DashMap::new(),
            cfg,
        }
    }

    /// Access the subscription registry
    pub fn registry(&self) -> Arc<SubscriptionRegistry> {
        self.registry.clone()
    }

    fn emit(&self, event: UpstreamEvent) {
        // A send error only means no subscriber is currently listening
        let _ = self.events.send(event);
    }

    /// Set the connection state, emitting only on actual transitions
    async fn set_state(&self, next: ConnectionState) {
        let mut state = self.state.write().await;
        if *state == next {
            return;
        }
        info!("Upstream connection: {:?} -> {:?}", *state, next);
        *state = next;
        drop(state);
        self.emit(UpstreamEvent::ConnectionStatus(next));
    }

    /// Commit the outcome of a handshake started in the given epoch
    ///
    /// Returns false when a disconnect completed while the handshake was
    /// in flight; the caller must not apply any connection side effects.
    async fn commit_handshake(&self, epoch: u64, next: ConnectionState) -> bool {
        let mut state = self.state.write().await;
        if self.epoch.load(Ordering::SeqCst) != epoch || *state != ConnectionState::Connecting {
            info!("Handshake result discarded: connection closed during handshake");
            return false;
        }
        info!("Upstream connection: {:?} -> {:?}", *state, next);
        *state = next;
        drop(state);
        self.emit(UpstreamEvent::ConnectionStatus(next));
        true
    }

    async fn require_connected(&self) -> Result<()> {
        if self.state.read().await.is_connected() {
            Ok(())
        } else {
            Err(GatewayError::NotConnected)
        }
    }

    async fn start_heartbeat(&self) {
        let events = self.events.clone();
        let last_heartbeat = self.last_heartbeat.clone();
        let interval_ms = self.cfg.heartbeat_interval_ms;

        let handle = tokio::spawn(async move {
            let mut tick = interval(Duration::from_millis(interval_ms));
            // First tick fires immediately; skip it so the connect
            // timestamp stands alone
            tick.tick().await;
            loop {
                tick.tick().await;
                let now = Utc::now();
                *last_heartbeat.write().await = Some(now);
                let _ = events.send(UpstreamEvent::Heartbeat(now));
            }
        });

        let mut slot = self.heartbeat_task.lock().await;
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    /// Spawn the tick producer for one subscription
    fn start_tick_task(&self, subscription: &Subscription) {
        let events = self.events.clone();
        let last_prices = self.last_prices.clone();
        let symbols = subscription.symbols.clone();
        let reference = self.cfg.default_reference_price;
        let interval_ms = self.cfg.tick_interval_ms;

        let handle = tokio::spawn(async move {
            let mut tick = interval(Duration::from_millis(interval_ms));
            loop {
                tick.tick().await;
                for symbol in &symbols {
                    let previous = last_prices
                        .get(symbol)
                        .map(|p| *p)
                        .unwrap_or(reference);

                    // Random walk in basis points, decimal-exact
                    let (step_bps, volume) = {
                        let mut rng = rand::thread_rng();
                        (rng.gen_range(-20i64..=20), rng.gen_range(100u64..10_000))
                    };
                    let last = previous + previous * Decimal::new(step_bps, 4);
                    let half_spread = last * Decimal::new(5, 4);
                    last_prices.insert(symbol.clone(), last);

                    let _ = events.send(UpstreamEvent::MarketData(MarketData {
                        symbol: symbol.clone(),
                        bid: last - half_spread,
                        ask: last + half_spread,
                        last,
                        close: previous,
                        volume,
                        timestamp: Utc::now(),
                    }));
                }
            }
        });

        self.tick_tasks.insert(subscription.id.clone(), handle);
    }

    /// Spawn the acknowledgment/fill progression for a new order
    fn start_fill_progression(&self, order_id: OrderId, request: &OrderRequest) {
        let ledger = self.ledger.clone();
        let events = self.events.clone();
        let positions = self.positions.clone();
        let account = self.account.clone();
        let last_prices = self.last_prices.clone();
        let symbol = request.symbol.clone();
        let side = request.action;
        let limit_price = request.price;
        let reference = self.cfg.default_reference_price;
        let submit_delay = Duration::from_millis(self.cfg.submit_delay_ms);
        let fill_delay = Duration::from_millis(self.cfg.fill_delay_ms);

        tokio::spawn(async move {
            sleep(submit_delay).await;
            match ledger.mark_submitted(order_id) {
                Ok(order) => {
                    let _ = events.send(UpstreamEvent::OrderUpdate(order));
                }
                Err(e) => {
                    // Cancelled before acknowledgment; report, do not apply
                    let _ = events.send(UpstreamEvent::Error {
                        code: e.code(),
                        message: e.to_string(),
                    });
                    return;
                }
            }

            sleep(fill_delay).await;
            let price = limit_price.unwrap_or_else(|| {
                last_prices.get(&symbol).map(|p| *p).unwrap_or(reference)
            });
            match ledger.mark_filled(order_id, price) {
                Ok((order, report)) => {
                    let _ = events.send(UpstreamEvent::OrderUpdate(order.clone()));
                    let _ = events.send(UpstreamEvent::ExecutionReport(report.clone()));

                    // Apply the fill to the simulated portfolio
                    let signed_qty = order.filled * Decimal::from(side.sign());
                    let position = {
                        let mut entry = positions
                            .entry(symbol.clone())
                            .or_insert_with(|| Position::flat(symbol.clone()));
                        entry.apply_fill(signed_qty, price);
                        entry.clone()
                    };
                    let _ = events.send(UpstreamEvent::PositionUpdate(position));

                    let summary = {
                        let mut account = account.write().await;
                        account.total_cash -= signed_qty * price + report.commission;
                        let position_value: Decimal =
                            positions.iter().map(|p| p.market_value).sum();
                        account.net_liquidation = account.total_cash + position_value;
                        account.total_value = account.net_liquidation;
                        account.buying_power = account.total_cash * Decimal::from(4);
                        account.clone()
                    };
                    let _ = events.send(UpstreamEvent::AccountUpdate(summary));
                }
                Err(e) => {
                    let _ = events.send(UpstreamEvent::Error {
                        code: e.code(),
                        message: e.to_string(),
                    });
                }
            }
        });
    }
}

#[async_trait]
impl UpstreamAdapter for SimulatedUpstream {
    async fn connect(&self, credentials: UpstreamCredentials) -> Result<()> {
        let epoch = {
            let mut state = self.state.write().await;
            match *state {
                ConnectionState::Connecting => return Err(GatewayError::AlreadyConnecting),
                ConnectionState::Connected => return Err(GatewayError::AlreadyConnected),
                ConnectionState::Disconnected | ConnectionState::Error => {}
            }
            *state = ConnectionState::Connecting;
            self.epoch.load(Ordering::SeqCst)
        };
        self.emit(UpstreamEvent::ConnectionStatus(ConnectionState::Connecting));
        self.reconnect_attempts.fetch_add(1, Ordering::SeqCst);

        info!(
            "Connecting to simulated upstream at {}:{} (account {})",
            credentials.host, credentials.port, credentials.account
        );

        // Simulated handshake; a real adapter blocks on the broker here
        sleep(Duration::from_millis(self.cfg.handshake_delay_ms)).await;

        if credentials.account.trim().is_empty() {
            warn!("Upstream handshake rejected: missing account");
            if self.commit_handshake(epoch, ConnectionState::Error).await {
                return Err(GatewayError::HandshakeFailed(
                    "account is required".to_string(),
                ));
            }
            return Err(GatewayError::HandshakeFailed(
                "connection closed during handshake".to_string(),
            ));
        }

        if !self
            .commit_handshake(epoch, ConnectionState::Connected)
            .await
        {
            return Err(GatewayError::HandshakeFailed(
                "connection closed during handshake".to_string(),
            ));
        }

        *self.connected_at.write().await = Some(tokio::time::Instant::now());
        *self.last_heartbeat.write().await = Some(Utc::now());
        self.reconnect_attempts.store(0, Ordering::SeqCst);
        self.start_heartbeat().await;

        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        // Invalidate any handshake still in flight
        self.epoch.fetch_add(1, Ordering::SeqCst);

        if let Some(handle) = self.heartbeat_task.lock().await.take() {
            handle.abort();
        }
        for entry in self.tick_tasks.iter() {
            entry.value().abort();
        }
        self.tick_tasks.clear();

        // End of connection epoch: nothing subscribed survives
        self.registry.clear();
        self.last_prices.clear();
        *self.md_status.write().await = MarketDataStatus::Inactive;
        *self.connected_at.write().await = None;

        self.set_state(ConnectionState::Disconnected).await;
        Ok(())
    }

    async fn subscribe_market_data(
        &self,
        symbols: Vec<String>,
        fields: Vec<String>,
    ) -> Result<Subscription> {
        self.require_connected().await?;

        let subscription = Subscription::new(symbols, fields);
        self.registry.insert(subscription.clone());
        self.start_tick_task(&subscription);
        *self.md_status.write().await = MarketDataStatus::Active;

        Ok(subscription)
    }

    async fn unsubscribe_market_data(&self, subscription_id: &str) -> Result<Subscription> {
        self.require_connected().await?;

        let subscription = self.registry.remove(subscription_id)?;
        if let Some((_, handle)) = self.tick_tasks.remove(subscription_id) {
            handle.abort();
        }
        // Removing the last subscription does not flip market data status
        // back to Inactive; that only happens on disconnect.
        Ok(subscription)
    }

    async fn place_order(&self, request: OrderRequest) -> Result<Order> {
        self.require_connected().await?;

        let order = self.ledger.create(&request, &self.cfg.default_account)?;
        debug!("Placed order {} for {}", order.order_id, order.symbol);
        self.emit(UpstreamEvent::OrderUpdate(order.clone()));
        self.start_fill_progression(order.order_id, &request);

        Ok(order)
    }

    async fn cancel_order(&self, order_id: OrderId) -> Result<Order> {
        self.require_connected().await?;

        let order = self.ledger.cancel(order_id)?;
        self.emit(UpstreamEvent::OrderUpdate(order.clone()));
        Ok(order)
    }

    async fn order(&self, order_id: OrderId) -> Result<Order> {
        self.ledger
            .get(order_id)
            .ok_or(GatewayError::OrderNotFound(order_id))
    }

    async fn positions(&self) -> Result<Vec<Position>> {
        self.require_connected().await?;

        let mut positions: Vec<Position> = self
            .positions
            .iter()
            .filter(|p| !p.is_flat())
            .map(|p| {
                let mut snapshot = p.clone();
                if let Some(last) = self.last_prices.get(&snapshot.symbol) {
                    snapshot.mark(*last);
                }
                snapshot
            })
            .collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(positions)
    }

    async fn account_summary(&self) -> Result<AccountSummary> {
        self.require_connected().await?;
        Ok(self.account.read().await.clone())
    }

    async fn connection_health(&self) -> ConnectionHealth {
        let connected = self.state.read().await.is_connected();
        let uptime_ms = self
            .connected_at
            .read()
            .await
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0);
        let data_quality = match *self.md_status.read().await {
            MarketDataStatus::Active => DataQuality::Good,
            MarketDataStatus::Inactive => DataQuality::Unavailable,
        };

        ConnectionHealth {
            connected,
            last_heartbeat: *self.last_heartbeat.read().await,
            uptime_ms,
            reconnect_attempts: self.reconnect_attempts.load(Ordering::SeqCst),
            data_quality,
        }
    }

    fn subscribe_events(&self) -> broadcast::Receiver<UpstreamEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgelink_core::Side;
    use rust_decimal_macros::dec;

    fn sim() -> SimulatedUpstream {
        SimulatedUpstream::new(GatewayConfig::fast())
    }

    #[tokio::test]
    async fn test_operations_require_connection() {
        let upstream = sim();

        let err = upstream
            .place_order(OrderRequest::market("AAPL", Side::Buy, dec!(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotConnected));

        let err = upstream
            .subscribe_market_data(vec!["AAPL".into()], vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotConnected));
    }

    #[tokio::test]
    async fn test_connect_twice_is_rejected() {
        let upstream = sim();
        upstream
            .connect(UpstreamCredentials::simulated("SIM-001"))
            .await
            .unwrap();

        let err = upstream
            .connect(UpstreamCredentials::simulated("SIM-001"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::AlreadyConnected));
    }

    #[tokio::test]
    async fn test_handshake_failure_enters_error_state() {
        let upstream = sim();
        let err = upstream
            .connect(UpstreamCredentials::simulated(""))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::HandshakeFailed(_)));

        let health = upstream.connection_health().await;
        assert!(!health.connected);
        assert_eq!(health.reconnect_attempts, 1);

        // Error state allows a fresh attempt
        upstream
            .connect(UpstreamCredentials::simulated("SIM-001"))
            .await
            .unwrap();
        assert_eq!(upstream.connection_health().await.reconnect_attempts, 0);
    }

    #[tokio::test]
    async fn test_disconnect_during_handshake_aborts_connect() {
        let mut cfg = GatewayConfig::fast();
        cfg.handshake_delay_ms = 200;
        let upstream = Arc::new(SimulatedUpstream::new(cfg));

        let connecting = {
            let upstream = upstream.clone();
            tokio::spawn(async move {
                upstream
                    .connect(UpstreamCredentials::simulated("SIM-001"))
                    .await
            })
        };

        // Disconnect mid-handshake; the connect must not commit over it
        sleep(Duration::from_millis(50)).await;
        upstream.disconnect().await.unwrap();
        assert!(!upstream.connection_health().await.connected);

        let result = connecting.await.unwrap();
        assert!(matches!(result, Err(GatewayError::HandshakeFailed(_))));
        assert!(!upstream.connection_health().await.connected);

        // A fresh connect still works after the aborted attempt
        upstream
            .connect(UpstreamCredentials::simulated("SIM-001"))
            .await
            .unwrap();
        assert!(upstream.connection_health().await.connected);
    }

    #[tokio::test]
    async fn test_disconnect_clears_subscriptions() {
        let upstream = sim();
        upstream
            .connect(UpstreamCredentials::simulated("SIM-001"))
            .await
            .unwrap();
        upstream
            .subscribe_market_data(vec!["AAPL".into()], vec![])
            .await
            .unwrap();
        assert_eq!(upstream.registry().len(), 1);

        upstream.disconnect().await.unwrap();
        assert!(upstream.registry().is_empty());

        // Reconnect starts an empty epoch
        upstream
            .connect(UpstreamCredentials::simulated("SIM-001"))
            .await
            .unwrap();
        assert!(upstream.registry().is_empty());
    }

    #[tokio::test]
    async fn test_unsubscribe_round_trip() {
        let upstream = sim();
        upstream
            .connect(UpstreamCredentials::simulated("SIM-001"))
            .await
            .unwrap();

        let sub = upstream
            .subscribe_market_data(vec!["AAPL".into()], vec!["last".into()])
            .await
            .unwrap();
        upstream.unsubscribe_market_data(&sub.id).await.unwrap();

        let err = upstream.unsubscribe_market_data(&sub.id).await.unwrap_err();
        assert!(matches!(err, GatewayError::SubscriptionNotFound(_)));
    }

    #[tokio::test]
    async fn test_data_quality_follows_market_data_status() {
        let upstream = sim();
        upstream
            .connect(UpstreamCredentials::simulated("SIM-001"))
            .await
            .unwrap();
        assert_eq!(
            upstream.connection_health().await.data_quality,
            DataQuality::Unavailable
        );

        let sub = upstream
            .subscribe_market_data(vec!["AAPL".into()], vec![])
            .await
            .unwrap();
        assert_eq!(
            upstream.connection_health().await.data_quality,
            DataQuality::Good
        );

        // Dropping the last subscription does not re-evaluate status
        upstream.unsubscribe_market_data(&sub.id).await.unwrap();
        assert_eq!(
            upstream.connection_health().await.data_quality,
            DataQuality::Good
        );
    }
}
