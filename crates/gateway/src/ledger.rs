//! Order Ledger - the order lifecycle state machine
//!
//! The ledger owns the only mutable order table in the process. Every
//! transition locks the order entry, checks terminality, mutates, and
//! returns a snapshot. A cancel racing a fill serializes on the entry
//! lock: whichever commits first wins and the loser gets
//! `OrderAlreadyTerminal`.

use chrono::Utc;
use dashmap::DashMap;
use edgelink_core::{ExecutionReport, Order, OrderId, OrderRequest, OrderStatus};
use log::debug;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::error::{GatewayError, Result};

/// In-memory order table keyed by monotonically increasing order id
pub struct OrderLedger {
    orders: DashMap<OrderId, Order>,
    next_id: AtomicI64,
    commission_per_share: Decimal,
    min_commission: Decimal,
}

impl OrderLedger {
    /// Create an empty ledger; ids start at 1
    pub fn new(commission_per_share: Decimal, min_commission: Decimal) -> Self {
        Self {
            orders: DashMap::new(),
            next_id: AtomicI64::new(1),
            commission_per_share,
            min_commission,
        }
    }

    /// Validate a request and store a new order in `PendingSubmit`
    pub fn create(&self, request: &OrderRequest, default_account: &str) -> Result<Order> {
        request.validate().map_err(GatewayError::InvalidOrder)?;

        let order_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let account = request
            .account
            .clone()
            .unwrap_or_else(|| default_account.to_string());
        let order = Order::from_request(order_id, request, account);

        debug!(
            "Ledger created order {}: {:?} {} {} ({:?})",
            order_id, order.action, order.quantity, order.symbol, order.order_type
        );

        self.orders.insert(order_id, order.clone());
        Ok(order)
    }

    /// Transition `PendingSubmit -> Submitted`
    pub fn mark_submitted(&self, order_id: OrderId) -> Result<Order> {
        let mut entry = self
            .orders
            .get_mut(&order_id)
            .ok_or(GatewayError::OrderNotFound(order_id))?;

        if entry.status.is_terminal() {
            return Err(GatewayError::OrderAlreadyTerminal(order_id));
        }

        entry.status = OrderStatus::Submitted;
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    /// Transition `Submitted -> Filled` at the given price
    ///
    /// Only a submitted order can fill; an unacknowledged order has no
    /// upstream counterpart to fill it. Fills the full remaining quantity,
    /// charges commission at the per-share rate (with floor), and builds
    /// the execution report.
    pub fn mark_filled(&self, order_id: OrderId, price: Decimal) -> Result<(Order, ExecutionReport)> {
        let mut entry = self
            .orders
            .get_mut(&order_id)
            .ok_or(GatewayError::OrderNotFound(order_id))?;

        if entry.status.is_terminal() {
            return Err(GatewayError::OrderAlreadyTerminal(order_id));
        }
        if entry.status != OrderStatus::Submitted {
            return Err(GatewayError::OrderNotSubmitted(order_id));
        }

        let shares = entry.remaining;
        let commission = (shares * self.commission_per_share).max(self.min_commission);

        entry.status = OrderStatus::Filled;
        entry.filled = entry.quantity;
        entry.remaining = Decimal::ZERO;
        entry.avg_fill_price = Some(price);
        entry.last_fill_price = Some(price);
        entry.commission = commission;
        entry.updated_at = Utc::now();

        let report = ExecutionReport::new(
            order_id,
            entry.symbol.clone(),
            entry.action,
            shares,
            price,
            commission,
            entry.account.clone(),
        );

        debug!(
            "Ledger filled order {}: {} @ {} (commission {})",
            order_id, shares, price, commission
        );

        Ok((entry.clone(), report))
    }

    /// Cancel an order that has not reached a terminal state.
    /// No commission is charged on cancellation.
    pub fn cancel(&self, order_id: OrderId) -> Result<Order> {
        let mut entry = self
            .orders
            .get_mut(&order_id)
            .ok_or(GatewayError::OrderNotFound(order_id))?;

        if entry.status.is_terminal() {
            return Err(GatewayError::OrderAlreadyTerminal(order_id));
        }

        entry.status = OrderStatus::Cancelled;
        entry.updated_at = Utc::now();

        debug!("Ledger cancelled order {}", order_id);
        Ok(entry.clone())
    }

    /// Snapshot of one order
    pub fn get(&self, order_id: OrderId) -> Option<Order> {
        self.orders.get(&order_id).map(|o| o.clone())
    }

    /// Snapshot of all orders, sorted by id
    pub fn list(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self.orders.iter().map(|o| o.clone()).collect();
        orders.sort_by_key(|o| o.order_id);
        orders
    }

    /// Number of orders tracked
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgelink_core::Side;
    use rust_decimal_macros::dec;

    fn test_ledger() -> OrderLedger {
        OrderLedger::new(dec!(0.005), dec!(1.00))
    }

    #[test]
    fn test_order_ids_monotonic_from_one() {
        let ledger = test_ledger();
        let req = OrderRequest::market("AAPL", Side::Buy, dec!(100));

        let a = ledger.create(&req, "SIM-001").unwrap();
        let b = ledger.create(&req, "SIM-001").unwrap();

        assert_eq!(a.order_id, 1);
        assert_eq!(b.order_id, 2);

        let ids: Vec<_> = ledger.list().iter().map(|o| o.order_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_full_lifecycle_keeps_quantity_balanced() {
        let ledger = test_ledger();
        let req = OrderRequest::market("AAPL", Side::Buy, dec!(100));

        let order = ledger.create(&req, "SIM-001").unwrap();
        assert!(order.quantity_balanced());

        let order = ledger.mark_submitted(order.order_id).unwrap();
        assert_eq!(order.status, OrderStatus::Submitted);
        assert!(order.quantity_balanced());

        let (order, report) = ledger.mark_filled(order.order_id, dec!(185.00)).unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(order.filled, dec!(100));
        assert_eq!(order.remaining, Decimal::ZERO);
        assert!(order.quantity_balanced());
        assert_eq!(report.shares, dec!(100));
        assert_eq!(report.price, dec!(185.00));
    }

    #[test]
    fn test_commission_floor_applies() {
        let ledger = test_ledger();
        let req = OrderRequest::market("AAPL", Side::Buy, dec!(10));

        let order = ledger.create(&req, "SIM-001").unwrap();
        ledger.mark_submitted(order.order_id).unwrap();
        let (order, _) = ledger.mark_filled(order.order_id, dec!(100)).unwrap();

        // 10 * 0.005 = 0.05, below the 1.00 floor
        assert_eq!(order.commission, dec!(1.00));
    }

    #[test]
    fn test_cancel_from_pending_submit() {
        let ledger = test_ledger();
        let req = OrderRequest::market("AAPL", Side::Sell, dec!(50));

        let order = ledger.create(&req, "SIM-001").unwrap();
        let order = ledger.cancel(order.order_id).unwrap();

        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.commission, Decimal::ZERO);
    }

    #[test]
    fn test_terminal_states_reject_further_transitions() {
        let ledger = test_ledger();
        let req = OrderRequest::market("AAPL", Side::Buy, dec!(100));

        let order = ledger.create(&req, "SIM-001").unwrap();
        ledger.mark_submitted(order.order_id).unwrap();
        ledger.mark_filled(order.order_id, dec!(185.00)).unwrap();

        // Cancel after fill loses
        assert!(matches!(
            ledger.cancel(order.order_id),
            Err(GatewayError::OrderAlreadyTerminal(_))
        ));
        // A second fill attempt loses too
        assert!(matches!(
            ledger.mark_filled(order.order_id, dec!(186.00)),
            Err(GatewayError::OrderAlreadyTerminal(_))
        ));

        // And no state changed
        let snapshot = ledger.get(order.order_id).unwrap();
        assert_eq!(snapshot.status, OrderStatus::Filled);
        assert_eq!(snapshot.avg_fill_price, Some(dec!(185.00)));
    }

    #[test]
    fn test_cancel_then_submit_timer_loses() {
        let ledger = test_ledger();
        let req = OrderRequest::market("AAPL", Side::Buy, dec!(100));

        let order = ledger.create(&req, "SIM-001").unwrap();
        ledger.cancel(order.order_id).unwrap();

        // The scheduled submit callback must be rejected, not applied
        assert!(matches!(
            ledger.mark_submitted(order.order_id),
            Err(GatewayError::OrderAlreadyTerminal(_))
        ));
        assert_eq!(
            ledger.get(order.order_id).unwrap().status,
            OrderStatus::Cancelled
        );
    }

    #[test]
    fn test_fill_requires_submitted() {
        let ledger = test_ledger();
        let req = OrderRequest::market("AAPL", Side::Buy, dec!(100));

        let order = ledger.create(&req, "SIM-001").unwrap();

        // An unacknowledged order cannot fill
        assert!(matches!(
            ledger.mark_filled(order.order_id, dec!(185.00)),
            Err(GatewayError::OrderNotSubmitted(_))
        ));
        assert_eq!(
            ledger.get(order.order_id).unwrap().status,
            OrderStatus::PendingSubmit
        );

        ledger.mark_submitted(order.order_id).unwrap();
        assert!(ledger.mark_filled(order.order_id, dec!(185.00)).is_ok());
    }

    #[test]
    fn test_unknown_order_not_found() {
        let ledger = test_ledger();
        assert!(matches!(
            ledger.cancel(99),
            Err(GatewayError::OrderNotFound(99))
        ));
    }

    #[test]
    fn test_invalid_request_rejected() {
        let ledger = test_ledger();
        let mut req = OrderRequest::limit("AAPL", Side::Buy, dec!(100), dec!(180));
        req.price = None;

        assert!(matches!(
            ledger.create(&req, "SIM-001"),
            Err(GatewayError::InvalidOrder(_))
        ));
        assert!(ledger.is_empty());
    }
}
