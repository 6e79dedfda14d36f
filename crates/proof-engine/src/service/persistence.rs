//! # Proof Persistence
//!
//! Stores encoded proofs under their hash id with a bounded lifetime.

use crate::domain::codec;
use crate::domain::errors::{FetchError, PersistError};
use crate::ports::outbound::KeyValueStore;
use proof_types::ProofDocument;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Proof cache over a `KeyValueStore`.
///
/// Writes are unconditional overwrites: a redelivered event stores the
/// same bytes again and refreshes the TTL.
#[derive(Clone)]
pub struct ProofRepository {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl ProofRepository {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Lifetime applied to every stored proof.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Storage key for a proof.
    pub fn key(hash_id: &Uuid) -> String {
        hash_id.to_string()
    }

    /// Encode and store `document`.
    ///
    /// # Errors
    ///
    /// `PersistError` on encoding or store failure. Both are worth a retry.
    pub async fn store(&self, document: &ProofDocument) -> Result<(), PersistError> {
        let bytes = codec::encode(document)?;
        let size = bytes.len();
        self.store
            .set_ex(&Self::key(&document.hash_id), bytes, self.ttl)
            .await?;

        debug!(
            hash_id = %document.hash_id,
            size,
            ttl_secs = self.ttl.as_secs(),
            "Proof stored"
        );
        Ok(())
    }

    /// Read back a stored proof, `None` if absent or expired.
    ///
    /// # Errors
    ///
    /// `FetchError` on store failure or undecodable bytes.
    pub async fn fetch(&self, hash_id: &Uuid) -> Result<Option<ProofDocument>, FetchError> {
        match self.store.get(&Self::key(hash_id)).await? {
            Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
            None => Ok(None),
        }
    }
}
