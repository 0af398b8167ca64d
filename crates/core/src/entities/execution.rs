use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{OrderId, Side};

/// Immutable record of a fill, emitted exactly once per fill event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub order_id: OrderId,
    /// Unique execution identifier
    pub exec_id: String,
    pub symbol: String,
    pub side: Side,
    pub shares: Decimal,
    pub price: Decimal,
    pub time: DateTime<Utc>,
    pub commission: Decimal,
    pub account: String,
}

impl ExecutionReport {
    /// Build a report for a fill with a freshly generated exec id
    pub fn new(
        order_id: OrderId,
        symbol: impl Into<String>,
        side: Side,
        shares: Decimal,
        price: Decimal,
        commission: Decimal,
        account: impl Into<String>,
    ) -> Self {
        Self {
            order_id,
            exec_id: format!("exec-{}", Uuid::new_v4()),
            symbol: symbol.into(),
            side,
            shares,
            price,
            time: Utc::now(),
            commission,
            account: account.into(),
        }
    }
}
