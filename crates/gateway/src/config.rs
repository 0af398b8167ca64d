//! Gateway configuration

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Tunables for the upstream adapter and simulated fill engine
///
/// Commission and fill-price constants are placeholder business rules from
/// the simulated upstream; they are configuration, not derived pricing.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Simulated handshake duration in ms
    pub handshake_delay_ms: u64,
    /// Adapter heartbeat interval in ms
    pub heartbeat_interval_ms: u64,
    /// Market data tick cadence per subscription in ms
    pub tick_interval_ms: u64,
    /// Delay before PendingSubmit -> Submitted in ms
    pub submit_delay_ms: u64,
    /// Delay before Submitted -> Filled in ms
    pub fill_delay_ms: u64,
    /// Commission charged per share on a fill
    pub commission_per_share: Decimal,
    /// Commission floor per fill
    pub min_commission: Decimal,
    /// Fallback fill/mark price for symbols with no tick history
    pub default_reference_price: Decimal,
    /// Starting cash for the simulated account
    pub initial_cash: Decimal,
    /// Account id used when an order request names none
    pub default_account: String,
    /// Event broadcast channel capacity
    pub event_capacity: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            handshake_delay_ms: 250,
            heartbeat_interval_ms: 5_000,
            tick_interval_ms: 1_000,
            submit_delay_ms: 500,
            fill_delay_ms: 2_000,
            commission_per_share: dec!(0.005),
            min_commission: dec!(1.00),
            default_reference_price: dec!(100),
            initial_cash: dec!(1_000_000),
            default_account: "SIM-001".to_string(),
            event_capacity: 1024,
        }
    }
}

impl GatewayConfig {
    /// Fast timings for tests: millisecond-scale delays everywhere
    pub fn fast() -> Self {
        Self {
            handshake_delay_ms: 5,
            heartbeat_interval_ms: 50,
            tick_interval_ms: 20,
            submit_delay_ms: 10,
            fill_delay_ms: 30,
            ..Self::default()
        }
    }
}
