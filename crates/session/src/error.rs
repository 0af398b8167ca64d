//! Error types for the session crate

use thiserror::Error;

use crate::auth::AuthError;

/// Errors raised by session manager operations
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session capacity reached ({max} sessions)")]
    CapacityReached { max: usize },

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),
}

impl SessionError {
    /// Machine-readable code for the client wire format
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::CapacityReached { .. } => "capacity_exceeded",
            SessionError::Auth(AuthError::ExpiredToken) => "token_expired",
            SessionError::Auth(AuthError::InvalidToken) => "invalid_token",
        }
    }
}
