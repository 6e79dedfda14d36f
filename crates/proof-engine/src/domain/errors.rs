//! # Domain Errors
//!
//! Error types for the proof engine.
//!
//! ## Classification
//!
//! | Error | Transient | Broker decision |
//! |-------|-----------|-----------------|
//! | `DecodeError` | no | ack, drop |
//! | `ConformanceError` | no | ack, drop |
//! | `PersistError` | yes | reject, requeue |
//! | `NotifyError` | yes | reject, requeue |
//!
//! Non-transient failures cannot be repaired by redelivering the same
//! message; transient ones may succeed once the store or broker recovers.

use proof_bus::PublishError;
use proof_types::StageType;
use thiserror::Error;
use uuid::Uuid;

/// Failure turning a raw message into a stage event.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The message type tag names no known stage.
    #[error("Unknown stage type: {0}")]
    UnknownStage(String),

    /// The payload could not be parsed, or lacks what its stage requires.
    #[error("Malformed {stage} event: {reason}")]
    Malformed { stage: StageType, reason: String },
}

impl DecodeError {
    pub(crate) fn malformed(stage: StageType, reason: impl Into<String>) -> Self {
        DecodeError::Malformed {
            stage,
            reason: reason.into(),
        }
    }
}

/// A composed document failed structural validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Proof does not conform: {}", .violations.join("; "))]
pub struct ConformanceError {
    /// Every violation found, each prefixed with its JSON location.
    pub violations: Vec<String>,
}

/// Failure encoding or decoding a stored proof.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Proof serialization failed: {0}")]
    Serialize(String),

    #[error("Proof compression failed: {0}")]
    Compress(String),

    #[error("Proof decompression failed: {0}")]
    Decompress(String),

    /// Leading format byte is not one this codec reads.
    #[error("Unsupported proof encoding version: {0}")]
    UnsupportedVersion(u8),

    #[error("Encoded proof is empty")]
    Empty,

    /// Decompressed size exceeds the safety limit.
    #[error("Decoded proof too large: more than {limit} bytes")]
    TooLarge { limit: usize },
}

/// Key-value store failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Failure persisting a proof.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PersistError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure reading a stored proof back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Failure notifying a live subscriber.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The subscription lookup could not reach the store.
    #[error("Subscription lookup failed: {0}")]
    Lookup(#[source] StoreError),

    #[error("Notification publish failed: {0}")]
    Publish(#[from] PublishError),
}

/// Terminal failure of one stage event's pipeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("{stage} proof for {hash_id} rejected: {source}")]
    NonConformant {
        hash_id: Uuid,
        stage: StageType,
        source: ConformanceError,
    },

    #[error("{stage} proof for {hash_id} not persisted: {source}")]
    Persist {
        hash_id: Uuid,
        stage: StageType,
        source: PersistError,
    },

    #[error("{stage} proof for {hash_id} not announced: {source}")]
    Notify {
        hash_id: Uuid,
        stage: StageType,
        source: NotifyError,
    },
}

impl PipelineError {
    /// Hash id of the failing event, once decoding got that far.
    pub fn hash_id(&self) -> Option<Uuid> {
        match self {
            PipelineError::Decode(_) => None,
            PipelineError::NonConformant { hash_id, .. }
            | PipelineError::Persist { hash_id, .. }
            | PipelineError::Notify { hash_id, .. } => Some(*hash_id),
        }
    }

    /// Stage of the failing event, when known.
    pub fn stage(&self) -> Option<StageType> {
        match self {
            PipelineError::Decode(DecodeError::UnknownStage(_)) => None,
            PipelineError::Decode(DecodeError::Malformed { stage, .. })
            | PipelineError::NonConformant { stage, .. }
            | PipelineError::Persist { stage, .. }
            | PipelineError::Notify { stage, .. } => Some(*stage),
        }
    }

    /// Whether redelivering the same message may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PipelineError::Persist { .. } | PipelineError::Notify { .. }
        )
    }
}
