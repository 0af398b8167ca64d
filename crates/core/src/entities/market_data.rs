use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single market data tick for one symbol
///
/// Ticks are tagged with the symbol only, not the subscription that caused
/// them: market data is connection-wide and broadcast to every
/// authenticated session once any session has subscribed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketData {
    pub symbol: String,
    pub bid: Decimal,
    pub ask: Decimal,
    pub last: Decimal,
    pub close: Decimal,
    pub volume: u64,
    pub timestamp: DateTime<Utc>,
}

impl MarketData {
    /// Midpoint of the current bid/ask
    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_mid_is_bid_ask_midpoint() {
        let tick = MarketData {
            symbol: "AAPL".to_string(),
            bid: dec!(99.90),
            ask: dec!(100.10),
            last: dec!(100.00),
            close: dec!(99.50),
            volume: 1_000,
            timestamp: Utc::now(),
        };
        assert_eq!(tick.mid(), dec!(100.00));
    }
}
