//! # Proof Compositor
//!
//! Builds the nested proof document for a decoded stage event.
//!
//! ```text
//! cal_anchor_branch
//!   ops: aggregation ++ calendar ops ++ [anchors: cal]
//!   branches:
//!     btc_anchor_branch                      (btc stage only)
//!       ops: anchor aggregation ++ chain ops ++ [anchors: btc]
//! ```
//!
//! Composition is pure. The same event always yields the same document,
//! and the submission time comes from the hash id, never the clock.

use proof_types::{
    AnchoredFragment, Branch, BranchLabel, ChainAnchorPath, Op, ProofDocument, StageEvent,
    StagePayload, StageType,
};

/// Result of composing a stage event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Composition {
    /// A complete document ready for validation.
    Document(ProofDocument),
    /// The stage is recognized but no document is produced for it yet.
    Deferred(StageType),
}

/// Compose the proof document for `event`.
///
/// Ethereum events are deferred: the branch label exists so documents
/// carrying one validate, but no composition rule emits it.
pub fn compose(event: &StageEvent) -> Composition {
    let chain = match &event.stage {
        StagePayload::Calendar => None,
        StagePayload::Bitcoin(path) => Some(chain_branch(BranchLabel::BtcAnchorBranch, path)),
        StagePayload::Ethereum(_) => return Composition::Deferred(StageType::Eth),
    };

    let mut ops = event.aggregation.clone();
    append_anchored(&mut ops, &event.calendar);

    let mut root = Branch::new(BranchLabel::CalAnchorBranch, ops);
    root.branches.extend(chain);

    let mut document = ProofDocument::new(event.hash.clone(), event.hash_id, event.submitted_at);
    document.branches.push(root);
    Composition::Document(document)
}

fn chain_branch(label: BranchLabel, path: &ChainAnchorPath) -> Branch {
    let mut ops = path.anchor_aggregation.clone();
    append_anchored(&mut ops, &path.chain);
    Branch::new(label, ops)
}

fn append_anchored(ops: &mut Vec<Op>, fragment: &AnchoredFragment) {
    ops.extend(fragment.ops.iter().cloned());
    ops.push(Op::anchor(fragment.anchor.clone()));
}
