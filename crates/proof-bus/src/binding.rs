//! # Instance Binding
//!
//! The consuming side of the notification exchange, one per front-end
//! instance.

use crate::exchange::RouteTable;
use parking_lot::RwLock;
use proof_types::ProofReadyNotification;
use std::sync::Weak;
use tokio::sync::mpsc;
use tracing::debug;

/// Receives the notifications routed to one instance id.
///
/// Each binding owns its own buffer, so traffic for other instances never
/// takes up space in it. When dropped, the binding is removed from the
/// exchange's routing table.
pub struct InstanceBinding {
    receiver: mpsc::Receiver<ProofReadyNotification>,
    instance_id: String,
    binding_id: u64,
    routes: Weak<RwLock<RouteTable>>,
}

impl InstanceBinding {
    pub(crate) fn new(
        receiver: mpsc::Receiver<ProofReadyNotification>,
        instance_id: String,
        binding_id: u64,
        routes: Weak<RwLock<RouteTable>>,
    ) -> Self {
        Self {
            receiver,
            instance_id,
            binding_id,
            routes,
        }
    }

    /// Instance id this binding matches.
    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Receive the next notification routed to this instance.
    ///
    /// Returns `None` when the exchange is dropped.
    pub async fn recv(&mut self) -> Option<ProofReadyNotification> {
        self.receiver.recv().await
    }

    /// Receive without waiting.
    ///
    /// Returns `None` if nothing is buffered.
    pub fn try_recv(&mut self) -> Option<ProofReadyNotification> {
        self.receiver.try_recv().ok()
    }

    /// Drain every buffered notification.
    pub fn drain(&mut self) -> Vec<ProofReadyNotification> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

impl Drop for InstanceBinding {
    fn drop(&mut self) {
        let Some(routes) = self.routes.upgrade() else {
            return;
        };
        let mut routes = routes.write();
        let Some(senders) = routes.get_mut(&self.instance_id) else {
            return;
        };

        senders.retain(|(id, _)| *id != self.binding_id);
        if senders.is_empty() {
            routes.remove(&self.instance_id);
        }
        debug!(instance_id = %self.instance_id, "Instance binding dropped");
    }
}
