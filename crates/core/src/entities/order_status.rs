use serde::{Deserialize, Serialize};

/// Order lifecycle status
///
/// `PendingSubmit -> Submitted -> {Filled | Cancelled}`. The two terminal
/// states are immutable; any further transition attempt is a state conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Order accepted by the gateway, not yet acknowledged upstream
    PendingSubmit,
    /// Order acknowledged by the upstream broker
    Submitted,
    /// Order completely filled
    Filled,
    /// Order cancelled before completion
    Cancelled,
}

impl OrderStatus {
    /// Returns true if the order is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }

    /// Returns true if the order can still be cancelled
    pub fn is_active(&self) -> bool {
        matches!(self, OrderStatus::PendingSubmit | OrderStatus::Submitted)
    }
}
