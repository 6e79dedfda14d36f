//! # Proof Engine Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Event builders and in-memory engine harness
//! └── integration/      # Queue → pipeline → store → exchange flows
//!     ├── delivery.rs   # Composition, storage and routing end to end
//!     └── reliability.rs# Outages, redelivery, dead letters, shutdown
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p proof-tests
//! cargo bench -p proof-tests
//! ```

pub mod fixtures;
pub mod integration;
