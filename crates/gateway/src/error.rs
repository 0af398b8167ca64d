//! Error types for the gateway crate

use edgelink_core::OrderId;
use thiserror::Error;

/// Errors raised by upstream adapter and ledger operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Not connected to upstream")]
    NotConnected,

    #[error("Already connected")]
    AlreadyConnected,

    #[error("Connection attempt already in progress")]
    AlreadyConnecting,

    #[error("Upstream handshake failed: {0}")]
    HandshakeFailed(String),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("Order {0} is already in a terminal state")]
    OrderAlreadyTerminal(OrderId),

    #[error("Order {0} has not been submitted")]
    OrderNotSubmitted(OrderId),

    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(String),
}

pub type Result<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
    /// Machine-readable code for the client wire format
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::NotConnected => "not_connected",
            GatewayError::AlreadyConnected => "already_connected",
            GatewayError::AlreadyConnecting => "already_connecting",
            GatewayError::HandshakeFailed(_) => "handshake_failed",
            GatewayError::InvalidOrder(_) => "validation_error",
            GatewayError::OrderNotFound(_) => "order_not_found",
            GatewayError::OrderAlreadyTerminal(_) => "order_already_terminal",
            GatewayError::OrderNotSubmitted(_) => "order_not_submitted",
            GatewayError::SubscriptionNotFound(_) => "subscription_not_found",
        }
    }
}
