use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An active market data subscription
///
/// Ids are generated fresh per subscribe call and never reused; a
/// resubscription for the same symbols gets a new id. Subscriptions do not
/// outlive the connection epoch that created them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub symbols: Vec<String>,
    pub fields: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    /// Create a new active subscription with a fresh id.
    /// Symbols and fields are deduplicated preserving first-seen order.
    pub fn new(symbols: Vec<String>, fields: Vec<String>) -> Self {
        Self {
            id: format!("sub-{}", Uuid::new_v4()),
            symbols: dedup(symbols),
            fields: dedup(fields),
            active: true,
            created_at: Utc::now(),
        }
    }
}

fn dedup(values: Vec<String>) -> Vec<String> {
    let mut unique = Vec::with_capacity(values.len());
    for value in values {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }
    unique
}
