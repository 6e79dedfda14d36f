//! # Subscription Notifier
//!
//! After a proof is stored, tells the front-end instance holding the
//! client's connection that it is ready. Most hashes have no live
//! subscriber; that case is a silent no-op.

use crate::domain::errors::NotifyError;
use crate::ports::outbound::{KeyValueStore, NotificationPublisher};
use proof_types::{ProofReadyNotification, SubscriptionRecord};
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// What a notify attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notified {
    /// No live subscription for the hash.
    NoSubscriber,
    /// A notification was published to `instance_id`.
    Published {
        instance_id: String,
        /// Bindings the exchange handed it to. Zero if the instance is gone.
        delivered: usize,
    },
}

#[derive(Clone)]
pub struct SubscriptionNotifier {
    store: Arc<dyn KeyValueStore>,
    publisher: Arc<dyn NotificationPublisher>,
}

impl SubscriptionNotifier {
    pub fn new(store: Arc<dyn KeyValueStore>, publisher: Arc<dyn NotificationPublisher>) -> Self {
        Self { store, publisher }
    }

    /// Look up the live subscription for `hash_id`.
    ///
    /// A record that does not parse is logged and treated as absent:
    /// redelivery would read the same bytes.
    ///
    /// # Errors
    ///
    /// `NotifyError::Lookup` if the store cannot be read.
    pub async fn lookup(&self, hash_id: &Uuid) -> Result<Option<SubscriptionRecord>, NotifyError> {
        let key = SubscriptionRecord::key(hash_id);
        let Some(bytes) = self.store.get(&key).await.map_err(NotifyError::Lookup)? else {
            return Ok(None);
        };

        match serde_json::from_slice(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                error!(hash_id = %hash_id, key = %key, error = %e, "Unreadable subscription record");
                Ok(None)
            }
        }
    }

    /// Notify the subscriber for `hash_id`, if there is one.
    ///
    /// # Errors
    ///
    /// `NotifyError` if the lookup or publish fails.
    pub async fn notify(&self, hash_id: &Uuid) -> Result<Notified, NotifyError> {
        let Some(record) = self.lookup(hash_id).await? else {
            debug!(hash_id = %hash_id, "No live subscription");
            return Ok(Notified::NoSubscriber);
        };

        let notification = ProofReadyNotification {
            connection_id: record.connection_id,
            hash_id: *hash_id,
        };
        let delivered = self
            .publisher
            .publish(&record.front_end_instance_id, notification)
            .await?;

        info!(
            hash_id = %hash_id,
            instance_id = %record.front_end_instance_id,
            delivered,
            "Proof-ready notification published"
        );
        Ok(Notified::Published {
            instance_id: record.front_end_instance_id,
            delivered,
        })
    }
}
