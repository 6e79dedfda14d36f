//! # Proof Types Crate
//!
//! Domain entities shared across the proof engine workspace.
//!
//! ## Clusters
//!
//! - **Evidence**: `Op`, `HashFunction`, `Anchor`, `AnchorType`
//! - **Documents**: `ProofDocument`, `Branch`, `BranchLabel`
//! - **Stages**: `StageType`, `StageEvent`, `StagePayload`, `AnchoredFragment`
//! - **Delivery**: `SubscriptionRecord`, `ProofReadyNotification`
//!
//! ## Design Principles
//!
//! - **Wire-compatible**: every type serializes to the Chainpoint v3 JSON
//!   vocabulary, so documents built here can be served verbatim.
//! - **Closed stage set**: stage dispatch is an exhaustive enum, never a
//!   string comparison.

pub mod delivery;
pub mod entities;
pub mod stage;

pub use delivery::{ProofReadyNotification, SubscriptionRecord, SUBSCRIPTION_KEY_PREFIX};
pub use entities::{
    Anchor, AnchorType, Branch, BranchLabel, HashFunction, Op, ProofDocument, CHAINPOINT_CONTEXT,
    CHAINPOINT_TYPE,
};
pub use stage::{
    AnchoredFragment, ChainAnchorPath, StageEvent, StagePayload, StageType, UnknownStageType,
};
