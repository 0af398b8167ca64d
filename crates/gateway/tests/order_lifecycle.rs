//! Integration test: simulated upstream order and market data flow
//!
//! Drives the adapter through connect -> subscribe -> place order and
//! asserts the event stream carries the full lifecycle.

use edgelink_core::{OrderRequest, OrderStatus, Side, UpstreamCredentials};
use edgelink_gateway::{
    GatewayConfig, GatewayError, SimulatedUpstream, UpstreamAdapter, UpstreamEvent,
};
use rust_decimal_macros::dec;
use std::time::Duration;
use tokio::time::timeout;

async fn next_event(
    rx: &mut tokio::sync::broadcast::Receiver<UpstreamEvent>,
) -> UpstreamEvent {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for upstream event")
        .expect("event channel closed")
}

/// Wait for the next order update, skipping ticks and heartbeats
async fn next_order_update(
    rx: &mut tokio::sync::broadcast::Receiver<UpstreamEvent>,
) -> edgelink_core::Order {
    loop {
        if let UpstreamEvent::OrderUpdate(order) = next_event(rx).await {
            return order;
        }
    }
}

#[tokio::test]
async fn test_place_order_while_disconnected_fails() {
    let _ = env_logger::try_init();
    let upstream = SimulatedUpstream::new(GatewayConfig::fast());

    let err = upstream
        .place_order(OrderRequest::market("AAPL", Side::Buy, dec!(100)))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::NotConnected));
}

#[tokio::test]
async fn test_market_order_progresses_to_filled() {
    let _ = env_logger::try_init();
    let upstream = SimulatedUpstream::new(GatewayConfig::fast());
    upstream
        .connect(UpstreamCredentials::simulated("SIM-001"))
        .await
        .unwrap();

    let mut events = upstream.subscribe_events();

    let order = upstream
        .place_order(OrderRequest::market("AAPL", Side::Buy, dec!(100)))
        .await
        .unwrap();
    assert_eq!(order.order_id, 1);
    assert_eq!(order.status, OrderStatus::PendingSubmit);

    let pending = next_order_update(&mut events).await;
    assert_eq!(pending.status, OrderStatus::PendingSubmit);

    let submitted = next_order_update(&mut events).await;
    assert_eq!(submitted.status, OrderStatus::Submitted);

    let filled = next_order_update(&mut events).await;
    assert_eq!(filled.status, OrderStatus::Filled);
    assert_eq!(filled.filled, dec!(100));
    assert_eq!(filled.remaining, dec!(0));

    // Exactly one execution report follows the fill
    let mut reports = 0;
    let mut position_seen = false;
    for _ in 0..4 {
        match next_event(&mut events).await {
            UpstreamEvent::ExecutionReport(report) => {
                assert_eq!(report.order_id, 1);
                assert_eq!(report.shares, dec!(100));
                reports += 1;
            }
            UpstreamEvent::PositionUpdate(position) => {
                assert_eq!(position.symbol, "AAPL");
                assert_eq!(position.position, dec!(100));
                position_seen = true;
            }
            UpstreamEvent::AccountUpdate(_) | UpstreamEvent::Heartbeat(_) => {}
            other => panic!("unexpected event after fill: {other:?}"),
        }
    }
    assert_eq!(reports, 1);
    assert!(position_seen);
}

#[tokio::test]
async fn test_limit_order_fills_at_limit_price() {
    let _ = env_logger::try_init();
    let upstream = SimulatedUpstream::new(GatewayConfig::fast());
    upstream
        .connect(UpstreamCredentials::simulated("SIM-001"))
        .await
        .unwrap();

    let mut events = upstream.subscribe_events();
    let order = upstream
        .place_order(OrderRequest::limit("MSFT", Side::Sell, dec!(10), dec!(410.25)))
        .await
        .unwrap();

    loop {
        let update = next_order_update(&mut events).await;
        if update.status == OrderStatus::Filled {
            assert_eq!(update.order_id, order.order_id);
            assert_eq!(update.avg_fill_price, Some(dec!(410.25)));
            // 10 shares at 0.005/share is below the 1.00 minimum
            assert_eq!(update.commission, dec!(1.00));
            break;
        }
    }
}

#[tokio::test]
async fn test_cancel_before_fill_wins_and_timer_reports_conflict() {
    let _ = env_logger::try_init();
    let mut cfg = GatewayConfig::fast();
    cfg.fill_delay_ms = 200;
    let upstream = SimulatedUpstream::new(cfg);
    upstream
        .connect(UpstreamCredentials::simulated("SIM-001"))
        .await
        .unwrap();

    let mut events = upstream.subscribe_events();
    let order = upstream
        .place_order(OrderRequest::market("AAPL", Side::Buy, dec!(100)))
        .await
        .unwrap();

    // Let the order reach Submitted, then cancel before the fill timer
    loop {
        let update = next_order_update(&mut events).await;
        if update.status == OrderStatus::Submitted {
            break;
        }
    }
    let cancelled = upstream.cancel_order(order.order_id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    // The fill timer fires into a terminal order and reports the conflict
    loop {
        match next_event(&mut events).await {
            UpstreamEvent::Error { code, .. } => {
                assert_eq!(code, "order_already_terminal");
                break;
            }
            _ => continue,
        }
    }

    // A second cancel is an error, not a silent no-op
    let err = upstream.cancel_order(order.order_id).await.unwrap_err();
    assert!(matches!(err, GatewayError::OrderAlreadyTerminal(_)));

    // The snapshot query reflects the committed cancel
    let snapshot = upstream.order(order.order_id).await.unwrap();
    assert_eq!(snapshot.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_subscription_produces_ticks_for_symbol() {
    let _ = env_logger::try_init();
    let upstream = SimulatedUpstream::new(GatewayConfig::fast());
    upstream
        .connect(UpstreamCredentials::simulated("SIM-001"))
        .await
        .unwrap();

    let mut events = upstream.subscribe_events();
    upstream
        .subscribe_market_data(vec!["AAPL".into()], vec!["last".into()])
        .await
        .unwrap();

    loop {
        if let UpstreamEvent::MarketData(tick) = next_event(&mut events).await {
            assert_eq!(tick.symbol, "AAPL");
            assert!(tick.bid < tick.ask);
            break;
        }
    }
}
