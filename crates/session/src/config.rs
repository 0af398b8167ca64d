//! Session manager configuration

/// Tunables for session capacity, queuing and liveness
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum concurrent sessions; connections beyond this are rejected
    /// at accept time
    pub max_sessions: usize,
    /// Bounded outbound queue capacity per session; overflow drops the
    /// oldest entry
    pub queue_capacity: usize,
    /// Interval between server-initiated liveness probes in ms
    pub probe_interval_ms: u64,
    /// Interval between liveness sweeps in ms
    pub sweep_interval_ms: u64,
    /// Time without a liveness acknowledgment before eviction in ms
    pub liveness_timeout_ms: u64,
    /// Per-session transport sink capacity
    pub sink_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions: 100,
            queue_capacity: 100,
            probe_interval_ms: 30_000,
            sweep_interval_ms: 10_000,
            liveness_timeout_ms: 60_000,
            sink_capacity: 64,
        }
    }
}

impl SessionConfig {
    /// Fast timings for tests
    pub fn fast() -> Self {
        Self {
            probe_interval_ms: 20,
            sweep_interval_ms: 20,
            liveness_timeout_ms: 100,
            ..Self::default()
        }
    }
}
