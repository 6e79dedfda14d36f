//! # Stage Events
//!
//! Typed form of one anchoring-stage completion for one hash.
//!
//! ## Stages
//!
//! | Tag | Stage | Fragments carried |
//! |-----|-------|-------------------|
//! | `cal` | Aggregation + calendar | aggregation, calendar |
//! | `btc` | Bitcoin confirmation | aggregation, calendar, anchor aggregation, chain |
//! | `eth` | Ethereum confirmation | aggregation, calendar, anchor aggregation, chain |
//!
//! Every event carries all fragments needed to rebuild its whole document,
//! so no event depends on an earlier one having been processed.

use crate::entities::{Anchor, Op};
use chrono::{DateTime, Utc};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Pipeline stage that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageType {
    Cal,
    Btc,
    Eth,
}

impl StageType {
    /// Message type tag used on the inbound queue.
    pub fn tag(self) -> &'static str {
        match self {
            StageType::Cal => "cal",
            StageType::Btc => "btc",
            StageType::Eth => "eth",
        }
    }
}

impl std::fmt::Display for StageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A message type tag outside the closed stage set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown stage type: {0}")]
pub struct UnknownStageType(pub String);

impl FromStr for StageType {
    type Err = UnknownStageType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cal" => Ok(StageType::Cal),
            "btc" => Ok(StageType::Btc),
            "eth" => Ok(StageType::Eth),
            _ => Err(UnknownStageType(s.to_string())),
        }
    }
}

/// Ordered operations ending at a published root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchoredFragment {
    /// Operations, excluding the terminal anchor node.
    pub ops: Vec<Op>,
    pub anchor: Anchor,
}

/// Fragments produced by a chain anchoring stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainAnchorPath {
    /// Transaction-level operations (calendar root up to the anchoring tx).
    pub anchor_aggregation: Vec<Op>,
    /// Block-header-level operations and the chain anchor.
    pub chain: AnchoredFragment,
}

/// Stage-specific part of a stage event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagePayload {
    Calendar,
    Bitcoin(ChainAnchorPath),
    Ethereum(ChainAnchorPath),
}

impl StagePayload {
    pub fn stage_type(&self) -> StageType {
        match self {
            StagePayload::Calendar => StageType::Cal,
            StagePayload::Bitcoin(_) => StageType::Btc,
            StagePayload::Ethereum(_) => StageType::Eth,
        }
    }
}

/// One stage completion for one hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageEvent {
    /// Client-submitted hash, hex encoded.
    pub hash: String,
    pub hash_id: Uuid,
    /// Submission time embedded in `hash_id`.
    pub submitted_at: DateTime<Utc>,
    /// Leaf-to-aggregation-root operations.
    pub aggregation: Vec<Op>,
    /// Aggregation-root-to-calendar operations and the calendar anchor.
    pub calendar: AnchoredFragment,
    pub stage: StagePayload,
}

impl StageEvent {
    pub fn stage_type(&self) -> StageType {
        self.stage.stage_type()
    }
}
