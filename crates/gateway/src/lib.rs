//! Edgelink Gateway
//!
//! Upstream side of the Edgelink system. Provides:
//! - The `UpstreamAdapter` trait (connect, subscribe, order routing)
//! - A typed `UpstreamEvent` stream for everything the broker pushes back
//! - The order ledger (order lifecycle state machine)
//! - The market data subscription registry
//! - A simulated upstream implementation behind the same trait a real
//!   broker adapter would use
//!
//! ## Architecture
//!
//! ```text
//! Broker backend (simulated or real)
//!         │
//!    ┌────▼─────────┐
//!    │ Upstream     │──── owns ──▶ OrderLedger, SubscriptionRegistry
//!    │ Adapter      │
//!    └────┬─────────┘
//!         │ broadcast<UpstreamEvent>
//!    ┌────▼─────────┐
//!    │ Event Router │──▶ Session Manager
//!    └──────────────┘
//! ```
//!
//! The fill progression is timer-driven in the simulator, but it arrives
//! through the same event stream a real upstream acknowledgment would, so
//! swapping in a live adapter touches neither the ledger nor the router.

pub mod adapters;
pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod subscriptions;

// Re-export commonly used types
pub use adapters::simulated::SimulatedUpstream;
pub use adapters::UpstreamAdapter;
pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use events::UpstreamEvent;
pub use ledger::OrderLedger;
pub use subscriptions::SubscriptionRegistry;
