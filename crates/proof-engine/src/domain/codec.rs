//! # Proof Codec
//!
//! Byte encoding of proofs at rest.
//!
//! ```text
//! [version: u8][zstd(JSON document)]
//! ```
//!
//! JSON keeps stored bytes identical to what a client is served once
//! decompressed. The leading version byte lets a later encoding coexist
//! with entries still alive under their TTL.

use super::errors::CodecError;
use proof_types::ProofDocument;
use std::io::Read;

/// Current encoding version.
pub const FORMAT_VERSION: u8 = 1;

/// zstd level for proof payloads.
pub const COMPRESSION_LEVEL: i32 = 3;

/// Decompressed size ceiling (16MB). Guards against decompression bombs.
pub const MAX_DECOMPRESSED_SIZE: usize = 16 * 1024 * 1024;

/// Encode a proof for storage.
///
/// # Errors
///
/// `CodecError::Serialize` or `CodecError::Compress`.
pub fn encode(document: &ProofDocument) -> Result<Vec<u8>, CodecError> {
    let json = serde_json::to_vec(document).map_err(|e| CodecError::Serialize(e.to_string()))?;
    let compressed = zstd::encode_all(json.as_slice(), COMPRESSION_LEVEL)
        .map_err(|e| CodecError::Compress(e.to_string()))?;

    let mut bytes = Vec::with_capacity(compressed.len() + 1);
    bytes.push(FORMAT_VERSION);
    bytes.extend_from_slice(&compressed);
    Ok(bytes)
}

/// Decode a stored proof.
///
/// # Errors
///
/// - `CodecError::Empty` for zero-length input
/// - `CodecError::UnsupportedVersion` for an unknown version byte
/// - `CodecError::TooLarge` if the payload inflates past the ceiling
/// - `CodecError::Decompress` for corrupt compressed data or invalid JSON
pub fn decode(bytes: &[u8]) -> Result<ProofDocument, CodecError> {
    let (&version, body) = bytes.split_first().ok_or(CodecError::Empty)?;
    if version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let decoder =
        zstd::stream::read::Decoder::new(body).map_err(|e| CodecError::Decompress(e.to_string()))?;
    let mut json = Vec::new();
    decoder
        .take(MAX_DECOMPRESSED_SIZE as u64 + 1)
        .read_to_end(&mut json)
        .map_err(|e| CodecError::Decompress(e.to_string()))?;

    if json.len() > MAX_DECOMPRESSED_SIZE {
        return Err(CodecError::TooLarge {
            limit: MAX_DECOMPRESSED_SIZE,
        });
    }

    serde_json::from_slice(&json).map_err(|e| CodecError::Decompress(e.to_string()))
}
