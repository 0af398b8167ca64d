//! Edgelink Router
//!
//! Stateless glue between the two halves of the gateway:
//!
//! - Upstream events are translated into `ServerMessage` broadcasts to
//!   every authenticated session.
//! - Session commands are dispatched to the upstream adapter under a
//!   request timeout, and every command gets exactly one reply - a
//!   success message or a structured error narrowcast back to the
//!   session that issued it. Failures never cross the component boundary
//!   as panics.

pub mod error;
pub mod router;

pub use error::RouterError;
pub use router::EventRouter;
