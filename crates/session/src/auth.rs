//! Token verification boundary
//!
//! The gateway only verifies tokens; issuance lives elsewhere. The
//! production deployment plugs a JWT verifier in behind `TokenVerifier`;
//! the bundled `StaticTokenVerifier` backs tests and local runs.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Token verification failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    ExpiredToken,
}

/// Identity extracted from a verified token
#[derive(Debug, Clone)]
pub struct AuthClaims {
    pub user_id: String,
}

/// Verifies an opaque client token and yields the caller's identity
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthClaims, AuthError>;
}

/// Fixed token -> user table for tests and local development
#[derive(Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration of a valid token
    pub fn with_token(mut self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), user_id.into());
        self
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<AuthClaims, AuthError> {
        self.tokens
            .get(token)
            .map(|user_id| AuthClaims {
                user_id: user_id.clone(),
            })
            .ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_verifier() {
        let verifier = StaticTokenVerifier::new().with_token("tok-1", "alice");

        let claims = verifier.verify("tok-1").await.unwrap();
        assert_eq!(claims.user_id, "alice");

        assert_eq!(
            verifier.verify("unknown").await.unwrap_err(),
            AuthError::InvalidToken
        );
    }
}
