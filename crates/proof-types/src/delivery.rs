//! # Delivery Records
//!
//! Live-delivery registration written by the API layer, and the notification
//! the engine routes to the front-end instance that owns the connection.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Key prefix under which the API layer stores subscriptions.
pub const SUBSCRIPTION_KEY_PREFIX: &str = "sub:";

/// A client waiting on a proof over a live connection.
///
/// Read-only from the engine's side; the API layer creates and expires it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    /// Front-end instance holding the connection.
    pub front_end_instance_id: String,
    /// Connection on that instance.
    pub connection_id: String,
}

impl SubscriptionRecord {
    /// Store key for a hash id's subscription.
    pub fn key(hash_id: &Uuid) -> String {
        format!("{SUBSCRIPTION_KEY_PREFIX}{hash_id}")
    }
}

/// Body of a proof-ready notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofReadyNotification {
    pub connection_id: String,
    pub hash_id: Uuid,
}
