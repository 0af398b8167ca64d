//! Subscription Registry - bookkeeping for active market data subscriptions
//!
//! Pure bookkeeping: uniqueness, lookup, and wholesale clear on disconnect.
//! The registry only ever contains subscriptions from the current
//! connection epoch.

use dashmap::DashMap;
use edgelink_core::Subscription;
use log::debug;

use crate::error::{GatewayError, Result};

/// Active subscriptions keyed by generated subscription id
#[derive(Default)]
pub struct SubscriptionRegistry {
    subscriptions: DashMap<String, Subscription>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscription
    pub fn insert(&self, subscription: Subscription) {
        debug!(
            "Registered subscription {} for {:?}",
            subscription.id, subscription.symbols
        );
        self.subscriptions
            .insert(subscription.id.clone(), subscription);
    }

    /// Remove a subscription, returning it deactivated
    pub fn remove(&self, id: &str) -> Result<Subscription> {
        let (_, mut subscription) = self
            .subscriptions
            .remove(id)
            .ok_or_else(|| GatewayError::SubscriptionNotFound(id.to_string()))?;
        subscription.active = false;
        debug!("Removed subscription {}", id);
        Ok(subscription)
    }

    /// Snapshot of one subscription
    pub fn get(&self, id: &str) -> Option<Subscription> {
        self.subscriptions.get(id).map(|s| s.clone())
    }

    /// Snapshot of all active subscriptions
    pub fn list(&self) -> Vec<Subscription> {
        self.subscriptions.iter().map(|s| s.clone()).collect()
    }

    /// Drop every subscription (connection epoch ended)
    pub fn clear(&self) {
        let count = self.subscriptions.len();
        self.subscriptions.clear();
        if count > 0 {
            debug!("Cleared {} subscriptions on disconnect", count);
        }
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(symbols: &[&str]) -> Subscription {
        Subscription::new(symbols.iter().map(|s| s.to_string()).collect(), vec![])
    }

    #[test]
    fn test_insert_remove_round_trip() {
        let registry = SubscriptionRegistry::new();
        let subscription = sub(&["AAPL"]);
        let id = subscription.id.clone();

        registry.insert(subscription);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&id).is_some());
        assert_eq!(registry.list().len(), 1);

        let removed = registry.remove(&id).unwrap();
        assert!(!removed.active);
        assert!(registry.is_empty());

        // Second removal of the same id is NotFound, not a no-op
        assert!(matches!(
            registry.remove(&id),
            Err(GatewayError::SubscriptionNotFound(_))
        ));
    }

    #[test]
    fn test_clear_drops_everything() {
        let registry = SubscriptionRegistry::new();
        registry.insert(sub(&["AAPL"]));
        registry.insert(sub(&["MSFT", "GOOG"]));

        registry.clear();
        assert!(registry.is_empty());
    }
}
