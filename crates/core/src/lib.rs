//! Edgelink Core Domain
//!
//! Pure domain types for the Edgelink brokerage gateway.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod connection;
pub mod entities;

// Re-export commonly used types at crate root
pub use connection::{
    ConnectionHealth, ConnectionState, DataQuality, MarketDataStatus, UpstreamCredentials,
};
pub use entities::{
    AccountSummary, ExecutionReport, MarketData, Order, OrderId, OrderRequest, OrderStatus,
    OrderType, Position, Side, Subscription,
};
