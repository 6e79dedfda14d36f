//! # Proof Entities
//!
//! Hash-chain operations, anchors and the nested branch tree that make up a
//! proof document.
//!
//! ## Branch Shape
//!
//! ```text
//! ProofDocument
//! └── cal_anchor_branch   (aggregation ops ++ calendar ops ++ {anchors: [cal]})
//!     └── btc_anchor_branch (anchor-aggregation ops ++ chain ops ++ {anchors: [btc]})
//! ```
//!
//! Nesting mirrors anchoring order: the calendar branch is always outermost,
//! chain branches always sit one level inside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JSON-LD context stamped on every proof.
pub const CHAINPOINT_CONTEXT: &str = "https://w3id.org/chainpoint/v3";

/// Document type stamped on every proof.
pub const CHAINPOINT_TYPE: &str = "Chainpoint";

/// A hash function applied at one step of the chain walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashFunction {
    #[serde(rename = "sha-224")]
    Sha224,
    #[serde(rename = "sha-256")]
    Sha256,
    #[serde(rename = "sha-384")]
    Sha384,
    #[serde(rename = "sha-512")]
    Sha512,
    #[serde(rename = "sha3-224")]
    Sha3_224,
    #[serde(rename = "sha3-256")]
    Sha3_256,
    #[serde(rename = "sha3-384")]
    Sha3_384,
    #[serde(rename = "sha3-512")]
    Sha3_512,
    /// Double SHA-256, as used for Bitcoin block and transaction ids.
    #[serde(rename = "sha-256-x2")]
    Sha256X2,
}

/// Ledger an anchor lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorType {
    /// The Chainpoint calendar.
    Cal,
    /// Bitcoin.
    Btc,
    /// Ethereum.
    Eth,
}

impl std::fmt::Display for AnchorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnchorType::Cal => write!(f, "cal"),
            AnchorType::Btc => write!(f, "btc"),
            AnchorType::Eth => write!(f, "eth"),
        }
    }
}

/// A publicly verifiable root reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    /// Ledger this anchor was recorded on.
    #[serde(rename = "type")]
    pub anchor_type: AnchorType,
    /// Root identifier on that ledger (calendar block height, BTC block height, ...).
    pub anchor_id: String,
    /// Lookup locations for the anchored root.
    #[serde(default)]
    pub uris: Vec<String>,
}

impl Anchor {
    /// Create an anchor reference.
    pub fn new(anchor_type: AnchorType, anchor_id: impl Into<String>, uris: Vec<String>) -> Self {
        Self {
            anchor_type,
            anchor_id: anchor_id.into(),
            uris,
        }
    }
}

/// One step of the walk from a leaf hash to an anchored root.
///
/// Serialized untagged, so each variant is a single-key JSON object:
/// `{"l": hex}`, `{"r": hex}`, `{"op": "sha-256"}` or `{"anchors": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged, deny_unknown_fields)]
pub enum Op {
    /// Prepend a hex value to the running hash.
    Prepend {
        #[serde(rename = "l")]
        value: String,
    },
    /// Append a hex value to the running hash.
    Append {
        #[serde(rename = "r")]
        value: String,
    },
    /// Hash the running value.
    Hash {
        #[serde(rename = "op")]
        function: HashFunction,
    },
    /// Terminal node: the running value is anchored at these roots.
    Anchors { anchors: Vec<Anchor> },
}

impl Op {
    /// Terminal anchor node referencing a single root.
    pub fn anchor(anchor: Anchor) -> Self {
        Op::Anchors {
            anchors: vec![anchor],
        }
    }

    /// Returns `true` for the terminal `anchors` node.
    pub fn is_anchor(&self) -> bool {
        matches!(self, Op::Anchors { .. })
    }
}

/// Branch label, one per anchoring stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchLabel {
    /// Root branch: aggregation plus calendar path.
    CalAnchorBranch,
    /// Nested branch: Bitcoin transaction and block path.
    BtcAnchorBranch,
    /// Nested branch: Ethereum path. Reserved, nothing composes it yet.
    EthAnchorBranch,
}

impl BranchLabel {
    /// Anchor type a branch with this label must terminate in.
    pub fn anchor_type(self) -> AnchorType {
        match self {
            BranchLabel::CalAnchorBranch => AnchorType::Cal,
            BranchLabel::BtcAnchorBranch => AnchorType::Btc,
            BranchLabel::EthAnchorBranch => AnchorType::Eth,
        }
    }

    /// Chain branches nest under the calendar branch.
    pub fn is_chain(self) -> bool {
        !matches!(self, BranchLabel::CalAnchorBranch)
    }
}

impl std::fmt::Display for BranchLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BranchLabel::CalAnchorBranch => write!(f, "cal_anchor_branch"),
            BranchLabel::BtcAnchorBranch => write!(f, "btc_anchor_branch"),
            BranchLabel::EthAnchorBranch => write!(f, "eth_anchor_branch"),
        }
    }
}

/// A labeled, ordered operation list terminating in an anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub label: BranchLabel,
    pub ops: Vec<Op>,
    /// Nested branches for later anchoring stages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<Branch>,
}

impl Branch {
    /// Create a leaf branch with no nested branches.
    pub fn new(label: BranchLabel, ops: Vec<Op>) -> Self {
        Self {
            label,
            ops,
            branches: Vec::new(),
        }
    }

    /// The anchors carried by this branch's terminal node, if any.
    pub fn terminal_anchors(&self) -> Option<&[Anchor]> {
        match self.ops.last() {
            Some(Op::Anchors { anchors }) => Some(anchors),
            _ => None,
        }
    }
}

/// The externally visible proof artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofDocument {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "type")]
    pub proof_type: String,
    /// The client-submitted hash, hex encoded.
    pub hash: String,
    /// Time-ordered identifier assigned at submission.
    pub hash_id: Uuid,
    /// Submission time recovered from `hash_id`, not wall clock.
    pub hash_submitted_at: DateTime<Utc>,
    pub branches: Vec<Branch>,
}

impl ProofDocument {
    /// Create a document with the fixed context and type and no branches.
    pub fn new(hash: impl Into<String>, hash_id: Uuid, hash_submitted_at: DateTime<Utc>) -> Self {
        Self {
            context: CHAINPOINT_CONTEXT.to_string(),
            proof_type: CHAINPOINT_TYPE.to_string(),
            hash: hash.into(),
            hash_id,
            hash_submitted_at,
            branches: Vec::new(),
        }
    }

    /// The calendar branch, when present.
    pub fn root_branch(&self) -> Option<&Branch> {
        self.branches.first()
    }

    /// Render as a JSON value.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
