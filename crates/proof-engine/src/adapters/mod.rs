//! # Adapters Module
//!
//! - `memory`: in-memory key-value store for tests and the replay runtime

pub mod memory;

pub use memory::InMemoryKeyValueStore;
