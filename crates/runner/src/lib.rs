//! Edgelink Runner - Gateway Process Composition
//!
//! Wires the whole gateway together and exposes the binary entry point:
//!
//! - **Config**: compiled defaults plus `EDGELINK_*` environment overrides
//! - **Bootstrap**: constructs and connects every component, spawns the
//!   background tasks, owns shutdown
//!
//! ## Architecture
//!
//! ```text
//!               ┌──────────────────────┐
//!               │  Simulated Upstream  │
//!               │  (broker adapter)    │
//!               └──────────┬───────────┘
//!                          │ broadcast events
//!                          ▼
//!               ┌──────────────────────┐
//!               │     Event Router     │
//!               │  events ⇄ commands   │
//!               └──────────┬───────────┘
//!                          │ broadcast / narrowcast
//!                          ▼
//!               ┌──────────────────────┐
//!               │   Session Manager    │
//!               │  auth · queues ·     │
//!               │  liveness            │
//!               └──────────┬───────────┘
//!                          │ outbound frames
//!                          ▼
//!                  client transports
//! ```

pub mod bootstrap;
pub mod config;

pub use bootstrap::Gateway;
pub use config::RunnerConfig;
