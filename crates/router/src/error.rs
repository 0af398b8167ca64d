//! Error types for the router crate

use edgelink_gateway::GatewayError;
use thiserror::Error;

/// Failures while dispatching a session command upstream
#[derive(Error, Debug)]
pub enum RouterError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid command: {0}")]
    Validation(String),
}

impl RouterError {
    /// Machine-readable code for the client wire format
    pub fn code(&self) -> &'static str {
        match self {
            RouterError::Gateway(e) => e.code(),
            RouterError::Timeout => "timeout",
            RouterError::Validation(_) => "validation_error",
        }
    }
}
