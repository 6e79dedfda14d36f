//! # Domain Layer
//!
//! Pure logic: decoding, composition, validation and encoding. Nothing
//! here performs I/O.

pub mod codec;
pub mod compositor;
pub mod config;
pub mod conformance;
pub mod decoder;
pub mod errors;
pub mod hash_id;

pub use compositor::{compose, Composition};
pub use config::{ConsumerConfig, PipelineConfig};
pub use conformance::ConformanceGate;
pub use decoder::decode;
pub use errors::*;
