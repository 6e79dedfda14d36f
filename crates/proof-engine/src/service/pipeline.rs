//! # Proof Pipeline
//!
//! One stage event from raw bytes to a broker decision.
//!
//! ```text
//! received → decoded → composed → validated → persisted → notified → ack
//!     │          │          │           │            │          │
//!     └─ ack ────┴──────────┴─ ack ─────┘   reject ──┴──────────┘
//!   (unknown stage, malformed,          (store or broker down,
//!    non-conformant: final)              requeue for retry)
//! ```
//!
//! Each step either hands its output to the next or returns the error that
//! decides the disposition. Only the store and exchange calls await.

use super::notifier::{Notified, SubscriptionNotifier};
use super::persistence::ProofRepository;
use crate::domain::compositor::{compose, Composition};
use crate::domain::config::PipelineConfig;
use crate::domain::conformance::ConformanceGate;
use crate::domain::decoder::decode;
use crate::domain::errors::{ConformanceError, PipelineError};
use crate::ports::inbound::StageEventHandler;
use crate::ports::outbound::{KeyValueStore, NotificationPublisher};
use async_trait::async_trait;
use proof_types::StageType;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Broker settlement for one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Settle as done. Also used for failures a retry cannot fix.
    Ack,
    /// Return to the queue for redelivery.
    Reject,
}

/// How a successfully handled event ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Proof stored; `notified` says whether anyone was told.
    Stored {
        hash_id: Uuid,
        stage: StageType,
        notified: Notified,
    },
    /// Recognized stage with nothing to compose yet.
    Deferred { hash_id: Uuid, stage: StageType },
}

/// Decision plus the terminal state that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub disposition: Disposition,
    pub outcome: Result<PipelineOutcome, PipelineError>,
}

impl PipelineReport {
    fn from_outcome(outcome: Result<PipelineOutcome, PipelineError>) -> Self {
        let disposition = match &outcome {
            Err(e) if e.is_transient() => Disposition::Reject,
            _ => Disposition::Ack,
        };
        Self {
            disposition,
            outcome,
        }
    }
}

/// The assembled engine: decode, compose, validate, persist, notify.
///
/// Cheap to share behind an `Arc`; holds no per-event state.
pub struct ProofPipeline {
    gate: ConformanceGate,
    repository: ProofRepository,
    notifier: SubscriptionNotifier,
}

impl ProofPipeline {
    /// Wire a pipeline over the given store and exchange.
    ///
    /// # Errors
    ///
    /// `ConformanceError` if the proof schema fails to compile.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        publisher: Arc<dyn NotificationPublisher>,
        config: &PipelineConfig,
    ) -> Result<Self, ConformanceError> {
        Ok(Self {
            gate: ConformanceGate::new()?,
            repository: ProofRepository::new(store.clone(), config.proof_ttl),
            notifier: SubscriptionNotifier::new(store, publisher),
        })
    }

    /// Proof storage used by this pipeline.
    pub fn repository(&self) -> &ProofRepository {
        &self.repository
    }

    /// Run one event and decide its settlement. Never fails; errors are
    /// logged and folded into the report.
    pub async fn process(&self, message_type: &str, payload: &[u8]) -> PipelineReport {
        let outcome = self.run(message_type, payload).await;

        match &outcome {
            Ok(PipelineOutcome::Stored {
                hash_id,
                stage,
                notified,
            }) => {
                info!(hash_id = %hash_id, stage = %stage, notified = ?notified, "Proof delivered");
            }
            Ok(PipelineOutcome::Deferred { hash_id, stage }) => {
                info!(hash_id = %hash_id, stage = %stage, "Stage accepted, no proof composed");
            }
            Err(e) if e.is_transient() => {
                error!(
                    message_type,
                    hash_id = ?e.hash_id(),
                    stage = ?e.stage(),
                    error = %e,
                    "Proof pipeline failed, requeueing"
                );
            }
            Err(e) => {
                error!(
                    message_type,
                    hash_id = ?e.hash_id(),
                    stage = ?e.stage(),
                    error = %e,
                    "Stage event dropped"
                );
            }
        }

        PipelineReport::from_outcome(outcome)
    }

    async fn run(
        &self,
        message_type: &str,
        payload: &[u8],
    ) -> Result<PipelineOutcome, PipelineError> {
        let event = decode(message_type, payload)?;
        let hash_id = event.hash_id;
        let stage = event.stage_type();

        let document = match compose(&event) {
            Composition::Document(document) => document,
            Composition::Deferred(stage) => {
                return Ok(PipelineOutcome::Deferred { hash_id, stage });
            }
        };

        self.gate
            .check(&document)
            .map_err(|source| PipelineError::NonConformant {
                hash_id,
                stage,
                source,
            })?;

        self.repository
            .store(&document)
            .await
            .map_err(|source| PipelineError::Persist {
                hash_id,
                stage,
                source,
            })?;

        let notified = self
            .notifier
            .notify(&hash_id)
            .await
            .map_err(|source| PipelineError::Notify {
                hash_id,
                stage,
                source,
            })?;

        Ok(PipelineOutcome::Stored {
            hash_id,
            stage,
            notified,
        })
    }
}

#[async_trait]
impl StageEventHandler for ProofPipeline {
    async fn handle(&self, message_type: &str, payload: &[u8]) -> PipelineReport {
        self.process(message_type, payload).await
    }
}
