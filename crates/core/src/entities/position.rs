use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A portfolio position for one symbol
///
/// Positive `position` is long, negative is short. Snapshots only; the
/// upstream adapter owns the mutable book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub position: Decimal,
    pub market_price: Decimal,
    pub market_value: Decimal,
    pub average_cost: Decimal,
    pub unrealized_pnl: Decimal,
    pub realized_pnl: Decimal,
}

impl Position {
    /// Create a flat position entry for a symbol
    pub fn flat(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            position: Decimal::ZERO,
            market_price: Decimal::ZERO,
            market_value: Decimal::ZERO,
            average_cost: Decimal::ZERO,
            unrealized_pnl: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
        }
    }

    /// Apply a fill to the position, updating size and average cost
    pub fn apply_fill(&mut self, signed_qty: Decimal, price: Decimal) {
        let new_position = self.position + signed_qty;

        // Adding to the position (same direction) moves the average cost;
        // reducing or flipping realizes P&L against the existing cost.
        if self.position.is_zero() || (self.position.is_sign_positive() == signed_qty.is_sign_positive()) {
            let old_notional = self.position.abs() * self.average_cost;
            let add_notional = signed_qty.abs() * price;
            let total = self.position.abs() + signed_qty.abs();
            if !total.is_zero() {
                self.average_cost = (old_notional + add_notional) / total;
            }
        } else {
            let closed = signed_qty.abs().min(self.position.abs());
            let direction = if self.position.is_sign_positive() {
                Decimal::ONE
            } else {
                -Decimal::ONE
            };
            self.realized_pnl += closed * (price - self.average_cost) * direction;
            if new_position.is_zero() {
                self.average_cost = Decimal::ZERO;
            } else if new_position.is_sign_positive() != self.position.is_sign_positive() {
                // Flipped through flat; remainder opens at the fill price
                self.average_cost = price;
            }
        }

        self.position = new_position;
        self.mark(price);
    }

    /// Update the mark price and derived fields
    pub fn mark(&mut self, price: Decimal) {
        self.market_price = price;
        self.market_value = self.position * price;
        self.unrealized_pnl = self.position * (price - self.average_cost);
    }

    /// True when the position is flat
    pub fn is_flat(&self) -> bool {
        self.position.is_zero()
    }
}

/// Account-level summary snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSummary {
    pub account_id: String,
    pub total_cash: Decimal,
    pub total_value: Decimal,
    pub buying_power: Decimal,
    pub margin_used: Decimal,
    pub net_liquidation: Decimal,
    pub currency: String,
}

impl AccountSummary {
    /// A fresh simulated account funded with the given cash balance
    pub fn simulated(account_id: impl Into<String>, cash: Decimal) -> Self {
        Self {
            account_id: account_id.into(),
            total_cash: cash,
            total_value: cash,
            buying_power: cash * Decimal::from(4),
            margin_used: Decimal::ZERO,
            net_liquidation: cash,
            currency: "USD".to_string(),
        }
    }
}
