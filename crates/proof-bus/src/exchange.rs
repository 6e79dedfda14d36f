//! # Notification Exchange
//!
//! The publishing side of proof-ready notifications.
//!
//! Routing is by header: each instance id maps to the bounded channels of
//! its bindings, and a notification is only ever queued on channels bound
//! to its route.

use crate::binding::InstanceBinding;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use parking_lot::RwLock;
use proof_types::ProofReadyNotification;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

/// Binding channels per instance id, tagged with the binding's id.
pub(crate) type RouteTable = HashMap<String, Vec<(u64, mpsc::Sender<ProofReadyNotification>)>>;

/// Errors from publishing a notification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// The exchange could not accept the message.
    #[error("Exchange unavailable: {0}")]
    Unavailable(String),
}

/// Publishes notifications addressed to a single front-end instance.
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    /// Publish `notification` with routing header `route`.
    ///
    /// # Returns
    ///
    /// The number of bindings the notification was queued on. Zero is not
    /// an error: the addressed instance may have gone away.
    async fn publish(
        &self,
        route: &str,
        notification: ProofReadyNotification,
    ) -> Result<usize, PublishError>;
}

/// In-memory header exchange.
pub struct InMemoryNotificationExchange {
    routes: Arc<RwLock<RouteTable>>,
    capacity: usize,
    next_binding_id: AtomicU64,
    published: AtomicU64,
    unavailable: AtomicBool,
}

impl InMemoryNotificationExchange {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Exchange whose bindings each buffer up to `capacity` notifications.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            routes: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
            next_binding_id: AtomicU64::new(0),
            published: AtomicU64::new(0),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Bind a front-end instance to the exchange.
    #[must_use]
    pub fn bind(&self, instance_id: impl Into<String>) -> InstanceBinding {
        let instance_id = instance_id.into();
        let binding_id = self.next_binding_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.capacity);

        self.routes
            .write()
            .entry(instance_id.clone())
            .or_default()
            .push((binding_id, sender));

        debug!(instance_id = %instance_id, binding_id, "Instance bound to exchange");
        InstanceBinding::new(
            receiver,
            instance_id,
            binding_id,
            Arc::downgrade(&self.routes),
        )
    }

    /// Number of live bindings for an instance.
    #[must_use]
    pub fn binding_count(&self, instance_id: &str) -> usize {
        self.routes.read().get(instance_id).map_or(0, Vec::len)
    }

    /// Total notifications accepted.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Simulate a broker outage: publishes fail while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }
}

impl Default for InMemoryNotificationExchange {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationPublisher for InMemoryNotificationExchange {
    async fn publish(
        &self,
        route: &str,
        notification: ProofReadyNotification,
    ) -> Result<usize, PublishError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(PublishError::Unavailable("exchange offline".to_string()));
        }
        self.published.fetch_add(1, Ordering::Relaxed);

        let hash_id = notification.hash_id;
        let mut delivered = 0;
        if let Some(senders) = self.routes.read().get(route) {
            for (binding_id, sender) in senders {
                match sender.try_send(notification.clone()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        warn!(
                            route,
                            binding_id,
                            hash_id = %hash_id,
                            "Binding full, notification dropped"
                        );
                    }
                    Err(TrySendError::Closed(_)) => {}
                }
            }
        }

        if delivered == 0 {
            warn!(route, hash_id = %hash_id, "Notification not delivered to any binding");
        } else {
            debug!(route, hash_id = %hash_id, delivered, "Notification published");
        }
        Ok(delivered)
    }
}
