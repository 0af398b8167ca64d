//! Edgelink Session
//!
//! Downstream side of the Edgelink system: the set of connected client
//! sessions and everything about their lifecycle.
//!
//! - Session state machine: `unauthenticated -> authenticated -> closed`
//! - Token verification at the `TokenVerifier` boundary
//! - Liveness probes and timeout sweeps
//! - Bounded per-session outbound queues with FIFO flush on reauth
//! - Broadcast (all authenticated sessions) and narrowcast (one session
//!   or one user) delivery
//!
//! The concrete transport (WebSocket or otherwise) is out of scope: each
//! session is attached through an `mpsc::Sender<OutboundFrame>` sink, and
//! the transport layer reports liveness acknowledgments back via
//! `ack_liveness`.

pub mod auth;
pub mod config;
pub mod error;
pub mod manager;
pub mod messages;

// Re-export commonly used types
pub use auth::{AuthClaims, AuthError, StaticTokenVerifier, TokenVerifier};
pub use config::SessionConfig;
pub use error::SessionError;
pub use manager::{SessionId, SessionManager};
pub use messages::{ClientCommand, CloseReason, OutboundFrame, ServerMessage, SessionEvent};
