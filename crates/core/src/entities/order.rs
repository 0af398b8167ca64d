use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{OrderStatus, OrderType, Side};

/// Unique identifier for an order, assigned by the ledger.
/// Monotonically increasing for the life of the process, never reused.
pub type OrderId = i64;

/// Order submission request as received from a client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub action: Side,
    pub quantity: Decimal,
    pub order_type: OrderType,
    /// Required for Limit and StopLimit orders
    pub price: Option<Decimal>,
    /// Required for Stop and StopLimit orders
    pub aux_price: Option<Decimal>,
    /// Target account; the gateway's default account when absent
    pub account: Option<String>,
}

impl OrderRequest {
    /// Create a market order request
    pub fn market(symbol: impl Into<String>, action: Side, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            action,
            quantity,
            order_type: OrderType::Market,
            price: None,
            aux_price: None,
            account: None,
        }
    }

    /// Create a limit order request
    pub fn limit(symbol: impl Into<String>, action: Side, quantity: Decimal, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            action,
            quantity,
            order_type: OrderType::Limit,
            price: Some(price),
            aux_price: None,
            account: None,
        }
    }

    /// Validate that required prices are present for the order type
    pub fn validate(&self) -> Result<(), String> {
        if self.quantity <= Decimal::ZERO {
            return Err("quantity must be positive".to_string());
        }
        if self.order_type.requires_limit_price() && self.price.is_none() {
            return Err(format!("{:?} order requires a limit price", self.order_type));
        }
        if self.order_type.requires_aux_price() && self.aux_price.is_none() {
            return Err(format!("{:?} order requires an aux price", self.order_type));
        }
        Ok(())
    }
}

/// Full order details as tracked by the ledger
///
/// Mutated only by the ledger; every other component sees snapshot clones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub symbol: String,
    pub action: Side,
    pub quantity: Decimal,
    pub order_type: OrderType,
    pub limit_price: Option<Decimal>,
    pub aux_price: Option<Decimal>,
    pub status: OrderStatus,
    /// Quantity filled so far; `filled + remaining == quantity` always
    pub filled: Decimal,
    pub remaining: Decimal,
    pub avg_fill_price: Option<Decimal>,
    pub last_fill_price: Option<Decimal>,
    pub commission: Decimal,
    pub account: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a new order in `PendingSubmit` from a validated request
    pub fn from_request(order_id: OrderId, request: &OrderRequest, account: String) -> Self {
        let now = Utc::now();
        Self {
            order_id,
            symbol: request.symbol.clone(),
            action: request.action,
            quantity: request.quantity,
            order_type: request.order_type,
            limit_price: request.price,
            aux_price: request.aux_price,
            status: OrderStatus::PendingSubmit,
            filled: Decimal::ZERO,
            remaining: request.quantity,
            avg_fill_price: None,
            last_fill_price: None,
            commission: Decimal::ZERO,
            account,
            created_at: now,
            updated_at: now,
        }
    }

    /// Quantity accounting invariant
    pub fn quantity_balanced(&self) -> bool {
        self.filled + self.remaining == self.quantity
    }
}
