//! # Outbound Ports (Driven Ports)
//!
//! Dependencies the engine requires from its host.
//!
//! - `KeyValueStore`: proof cache and subscription registry
//! - `NotificationPublisher`: fan-out exchange to front-end instances
//!   (defined in `proof-bus`, re-exported here)

use crate::domain::errors::StoreError;
use async_trait::async_trait;
use std::time::Duration;

pub use proof_bus::{NotificationPublisher, PublishError};

/// Abstract key-value store with per-key expiry.
///
/// Production: a Redis-compatible store (`SET key value EX ttl`, `GET key`).
/// Testing: `InMemoryKeyValueStore`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value and its TTL.
    async fn set_ex(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), StoreError>;

    /// Read `key`. Expired keys read as absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
}
