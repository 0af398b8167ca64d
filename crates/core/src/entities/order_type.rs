use serde::{Deserialize, Serialize};

/// Order types accepted by the upstream broker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Execute at current market price
    Market,
    /// Execute at the limit price or better
    Limit,
    /// Market order triggered when price reaches the aux (stop) price
    Stop,
    /// Limit order triggered when price reaches the aux (stop) price
    StopLimit,
}

impl OrderType {
    /// Returns true if this order type requires a limit price
    pub fn requires_limit_price(&self) -> bool {
        matches!(self, OrderType::Limit | OrderType::StopLimit)
    }

    /// Returns true if this order type requires an aux (stop) price
    pub fn requires_aux_price(&self) -> bool {
        matches!(self, OrderType::Stop | OrderType::StopLimit)
    }
}
