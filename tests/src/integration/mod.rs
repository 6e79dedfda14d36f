//! # Integration Tests
//!
//! Full engine flows over the in-memory queue, store and exchange.

pub mod delivery;
pub mod reliability;
