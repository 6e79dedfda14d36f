//! # Schema Conformance Gate
//!
//! Last check before a proof leaves the engine. Two passes, both run and
//! both reported:
//!
//! 1. **Schema**: the JSON rendering against the embedded Chainpoint v3
//!    proof schema (field presence, op and anchor shapes, hex values).
//! 2. **Structure**: branch rules JSON Schema cannot state:
//!    - exactly one root branch, labelled `cal_anchor_branch`
//!    - every branch ends in one `anchors` op and holds no other
//!    - at most one nested branch per parent, only chain labels, depth 1
//!    - terminal anchor type matches the branch label
//!
//! A failing document is a defect upstream of this engine. Retrying the
//! same event rebuilds the same document, so failure is final.

use super::errors::ConformanceError;
use proof_types::{Branch, BranchLabel, ProofDocument, CHAINPOINT_CONTEXT, CHAINPOINT_TYPE};
use serde_json::{json, Value};

/// Maximum nesting below the root branch.
const MAX_CHAIN_DEPTH: usize = 1;

fn proof_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "required": ["@context", "type", "hash", "hash_id", "hash_submitted_at", "branches"],
        "additionalProperties": false,
        "properties": {
            "@context": { "const": CHAINPOINT_CONTEXT },
            "type": { "const": CHAINPOINT_TYPE },
            "hash": { "$ref": "#/$defs/hex" },
            "hash_id": {
                "type": "string",
                "pattern": "^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$"
            },
            "hash_submitted_at": {
                "type": "string",
                "pattern": "^[+-]?[0-9]{4,}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}(\\.[0-9]+)?Z$"
            },
            "branches": {
                "type": "array",
                "minItems": 1,
                "items": { "$ref": "#/$defs/branch" }
            }
        },
        "$defs": {
            "hex": {
                "type": "string",
                "pattern": "^([0-9a-fA-F]{2})+$"
            },
            "branch": {
                "type": "object",
                "required": ["label", "ops"],
                "additionalProperties": false,
                "properties": {
                    "label": {
                        "enum": ["cal_anchor_branch", "btc_anchor_branch", "eth_anchor_branch"]
                    },
                    "ops": {
                        "type": "array",
                        "minItems": 1,
                        "items": { "$ref": "#/$defs/op" }
                    },
                    "branches": {
                        "type": "array",
                        "items": { "$ref": "#/$defs/branch" }
                    }
                }
            },
            "op": {
                "oneOf": [
                    {
                        "type": "object",
                        "required": ["l"],
                        "additionalProperties": false,
                        "properties": { "l": { "$ref": "#/$defs/hex" } }
                    },
                    {
                        "type": "object",
                        "required": ["r"],
                        "additionalProperties": false,
                        "properties": { "r": { "$ref": "#/$defs/hex" } }
                    },
                    {
                        "type": "object",
                        "required": ["op"],
                        "additionalProperties": false,
                        "properties": {
                            "op": {
                                "enum": [
                                    "sha-224", "sha-256", "sha-384", "sha-512",
                                    "sha3-224", "sha3-256", "sha3-384", "sha3-512",
                                    "sha-256-x2"
                                ]
                            }
                        }
                    },
                    {
                        "type": "object",
                        "required": ["anchors"],
                        "additionalProperties": false,
                        "properties": {
                            "anchors": {
                                "type": "array",
                                "minItems": 1,
                                "items": { "$ref": "#/$defs/anchor" }
                            }
                        }
                    }
                ]
            },
            "anchor": {
                "type": "object",
                "required": ["type", "anchor_id", "uris"],
                "additionalProperties": false,
                "properties": {
                    "type": { "enum": ["cal", "btc", "eth"] },
                    "anchor_id": { "type": "string", "minLength": 1 },
                    "uris": { "type": "array", "items": { "type": "string" } }
                }
            }
        }
    })
}

/// Validates composed proofs before they are persisted.
///
/// The schema is compiled once; `check` is synchronous and shared freely
/// across pipelines.
pub struct ConformanceGate {
    validator: jsonschema::Validator,
}

impl std::fmt::Debug for ConformanceGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConformanceGate").finish_non_exhaustive()
    }
}

impl ConformanceGate {
    /// Compile the embedded proof schema.
    ///
    /// # Errors
    ///
    /// Returns `ConformanceError` if the schema itself fails to compile.
    pub fn new() -> Result<Self, ConformanceError> {
        let validator =
            jsonschema::validator_for(&proof_schema()).map_err(|e| ConformanceError {
                violations: vec![format!("schema: {e}")],
            })?;
        Ok(Self { validator })
    }

    /// Validate `document`, collecting every violation found.
    ///
    /// # Errors
    ///
    /// Returns `ConformanceError` listing each schema and structural
    /// violation, prefixed with its JSON location.
    pub fn check(&self, document: &ProofDocument) -> Result<(), ConformanceError> {
        let mut violations = Vec::new();

        match document.to_json() {
            Ok(value) => violations.extend(self.validator.iter_errors(&value).map(|error| {
                let path = error.instance_path.to_string();
                format!("${path}: {error}")
            })),
            Err(e) => violations.push(format!("$: not representable as JSON: {e}")),
        }

        check_structure(document, &mut violations);

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ConformanceError { violations })
        }
    }
}

fn check_structure(document: &ProofDocument, violations: &mut Vec<String>) {
    if document.branches.len() != 1 {
        violations.push(format!(
            "$/branches: expected exactly one root branch, found {}",
            document.branches.len()
        ));
    }

    for (index, branch) in document.branches.iter().enumerate() {
        let path = format!("$/branches/{index}");
        if branch.label != BranchLabel::CalAnchorBranch {
            violations.push(format!(
                "{path}/label: root branch must be {}, found {}",
                BranchLabel::CalAnchorBranch,
                branch.label
            ));
        }
        check_branch(branch, &path, 0, violations);
    }
}

fn check_branch(branch: &Branch, path: &str, depth: usize, violations: &mut Vec<String>) {
    match branch.terminal_anchors() {
        Some([anchor]) if anchor.anchor_type != branch.label.anchor_type() => {
            violations.push(format!(
                "{path}/ops: {} branch anchored to {}",
                branch.label, anchor.anchor_type
            ));
        }
        Some([_]) => {}
        Some(anchors) => violations.push(format!(
            "{path}/ops: terminal node must carry one anchor, found {}",
            anchors.len()
        )),
        None => violations.push(format!("{path}/ops: branch does not end in an anchor")),
    }

    let anchor_nodes = branch.ops.iter().filter(|op| op.is_anchor()).count();
    if anchor_nodes > 1 {
        violations.push(format!(
            "{path}/ops: {anchor_nodes} anchor nodes, expected one terminal node"
        ));
    }

    if branch.branches.len() > 1 {
        violations.push(format!(
            "{path}/branches: at most one nested branch, found {}",
            branch.branches.len()
        ));
    }

    for (index, child) in branch.branches.iter().enumerate() {
        let child_path = format!("{path}/branches/{index}");
        if !child.label.is_chain() {
            violations.push(format!(
                "{child_path}/label: {} cannot be nested",
                child.label
            ));
        }
        if depth + 1 > MAX_CHAIN_DEPTH {
            violations.push(format!(
                "{child_path}: chain branches nest only directly under the root"
            ));
        }
        check_branch(child, &child_path, depth + 1, violations);
    }
}
