//! # Stage Event Decoder
//!
//! Parses a raw queue message (type tag + JSON payload) into a `StageEvent`.
//!
//! ## Payload
//!
//! ```json
//! {
//!   "hash": "ab12...",
//!   "hashId": "f1e2c3a0-8d7b-11ee-b962-0242ac120002",
//!   "aggregationFragment": [{"l": "..."}, {"op": "sha-256"}],
//!   "calendarFragment": [{"op": "sha-256"}, {"anchors": [{"type": "cal", ...}]}],
//!   "anchorAggregationFragment": [...],
//!   "chainAnchorFragment": {"ops": [...], "anchor": {"type": "btc", ...}}
//! }
//! ```
//!
//! Anchored fragments come either as `{ops, anchor}` or as a bare op list
//! whose last element is a single-anchor `anchors` node. The two anchor
//! fragments are only read for `btc` and `eth` messages.
//!
//! Decoding is pure; failures are never worth retrying.

use super::errors::DecodeError;
use super::hash_id;
use proof_types::{
    Anchor, AnchorType, AnchoredFragment, ChainAnchorPath, Op, StageEvent, StagePayload, StageType,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StageEventWire {
    /// Optional echo of the message type tag.
    stage_type: Option<String>,
    hash: String,
    hash_id: String,
    aggregation_fragment: Option<Vec<Op>>,
    calendar_fragment: Option<AnchoredFragmentWire>,
    anchor_aggregation_fragment: Option<Vec<Op>>,
    chain_anchor_fragment: Option<AnchoredFragmentWire>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnchoredFragmentWire {
    Split { ops: Vec<Op>, anchor: Anchor },
    Terminated(Vec<Op>),
}

impl AnchoredFragmentWire {
    fn into_fragment(self) -> Result<AnchoredFragment, String> {
        match self {
            AnchoredFragmentWire::Split { ops, anchor } => Ok(AnchoredFragment { ops, anchor }),
            AnchoredFragmentWire::Terminated(mut ops) => match ops.pop() {
                Some(Op::Anchors { mut anchors }) if anchors.len() == 1 => {
                    let anchor = anchors.remove(0);
                    Ok(AnchoredFragment { ops, anchor })
                }
                Some(Op::Anchors { anchors }) => Err(format!(
                    "terminal anchors node must hold exactly one anchor, found {}",
                    anchors.len()
                )),
                _ => Err("fragment does not end in an anchors node".to_string()),
            },
        }
    }
}

/// Decode one queue message.
///
/// # Errors
///
/// - `DecodeError::UnknownStage` if `message_type` is not `cal`, `btc` or `eth`
/// - `DecodeError::Malformed` if the payload is not valid JSON for the
///   declared stage, the hash is not hex, the hash id carries no
///   timestamp, or a required fragment is missing
pub fn decode(message_type: &str, payload: &[u8]) -> Result<StageEvent, DecodeError> {
    let stage: StageType = message_type
        .parse()
        .map_err(|_| DecodeError::UnknownStage(message_type.to_string()))?;

    let wire: StageEventWire = serde_json::from_slice(payload)
        .map_err(|e| DecodeError::malformed(stage, format!("invalid payload: {e}")))?;

    if let Some(declared) = wire.stage_type.as_deref() {
        if !declared.eq_ignore_ascii_case(stage.tag()) {
            return Err(DecodeError::malformed(
                stage,
                format!("payload stageType {declared} does not match message type"),
            ));
        }
    }

    if wire.hash.is_empty() || hex::decode(&wire.hash).is_err() {
        return Err(DecodeError::malformed(stage, "hash is not a hex string"));
    }

    let hash_id = Uuid::parse_str(&wire.hash_id)
        .map_err(|e| DecodeError::malformed(stage, format!("hashId is not a UUID: {e}")))?;
    let submitted_at = hash_id::submitted_at(&hash_id)
        .ok_or_else(|| DecodeError::malformed(stage, "hashId carries no timestamp"))?;

    let aggregation = wire
        .aggregation_fragment
        .ok_or_else(|| DecodeError::malformed(stage, "missing aggregationFragment"))?;
    let calendar = anchored(stage, "calendarFragment", wire.calendar_fragment, AnchorType::Cal)?;

    let payload = match stage {
        StageType::Cal => StagePayload::Calendar,
        StageType::Btc => StagePayload::Bitcoin(chain_path(
            stage,
            wire.anchor_aggregation_fragment,
            wire.chain_anchor_fragment,
            AnchorType::Btc,
        )?),
        StageType::Eth => StagePayload::Ethereum(chain_path(
            stage,
            wire.anchor_aggregation_fragment,
            wire.chain_anchor_fragment,
            AnchorType::Eth,
        )?),
    };

    Ok(StageEvent {
        hash: wire.hash,
        hash_id,
        submitted_at,
        aggregation,
        calendar,
        stage: payload,
    })
}

fn chain_path(
    stage: StageType,
    anchor_aggregation: Option<Vec<Op>>,
    chain: Option<AnchoredFragmentWire>,
    anchor_type: AnchorType,
) -> Result<ChainAnchorPath, DecodeError> {
    let anchor_aggregation = anchor_aggregation
        .ok_or_else(|| DecodeError::malformed(stage, "missing anchorAggregationFragment"))?;
    let chain = anchored(stage, "chainAnchorFragment", chain, anchor_type)?;
    Ok(ChainAnchorPath {
        anchor_aggregation,
        chain,
    })
}

fn anchored(
    stage: StageType,
    field: &str,
    wire: Option<AnchoredFragmentWire>,
    anchor_type: AnchorType,
) -> Result<AnchoredFragment, DecodeError> {
    let fragment = wire
        .ok_or_else(|| DecodeError::malformed(stage, format!("missing {field}")))?
        .into_fragment()
        .map_err(|reason| DecodeError::malformed(stage, format!("{field}: {reason}")))?;

    if fragment.anchor.anchor_type != anchor_type {
        return Err(DecodeError::malformed(
            stage,
            format!(
                "{field}: expected {anchor_type} anchor, found {}",
                fragment.anchor.anchor_type
            ),
        ));
    }
    Ok(fragment)
}
