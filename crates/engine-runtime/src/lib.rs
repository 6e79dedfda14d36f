//! # Engine Runtime
//!
//! Configuration and input plumbing for the `engine-runtime` binary.

pub mod config;
pub mod replay;

pub use config::{ConfigError, EngineConfig};
pub use replay::{parse_line, replay, ReplayStats};
