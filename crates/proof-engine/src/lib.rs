//! # Proof Engine
//!
//! Turns anchoring stage events into stored, schema-conformant Chainpoint
//! proofs and tells the front-end instance holding a waiting client.
//!
//! ## Flow
//!
//! ```text
//! StageQueue ──→ decode ──→ compose ──→ conformance ──→ store (TTL) ──→ notify
//!   (cal/btc/eth)  │           │             │               │            │
//!                  └───────────┴──── ack ────┘               └── reject ──┘
//!                    final failures                    transient failures
//! ```
//!
//! ## Stage Rules
//!
//! | Stage | Document | Settlement |
//! |-------|----------|------------|
//! | `cal` | root `cal_anchor_branch` | ack once stored and notified |
//! | `btc` | root plus nested `btc_anchor_branch` | ack once stored and notified |
//! | `eth` | none (deferred) | ack |
//!
//! Every event rebuilds its document from its own fragments, so delivery
//! order across stages never corrupts a proof. Same-hash writes are
//! last-write-wins and refresh the TTL.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Decoder, compositor, conformance gate, codec
//! - `ports/` - Inbound handler trait, outbound store and exchange traits
//! - `adapters/` - In-memory key-value store
//! - `service/` - Pipeline, persistence, notifier, consumer
//!
//! ## Usage
//!
//! ```ignore
//! use proof_engine::{InMemoryKeyValueStore, PipelineConfig, ProofPipeline};
//! use proof_bus::InMemoryNotificationExchange;
//!
//! let store = Arc::new(InMemoryKeyValueStore::new());
//! let exchange = Arc::new(InMemoryNotificationExchange::new());
//! let pipeline = ProofPipeline::new(store, exchange, &PipelineConfig::default())?;
//!
//! let report = pipeline.process("cal", payload).await;
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::InMemoryKeyValueStore;
pub use domain::codec::{self, FORMAT_VERSION};
pub use domain::{
    compose, decode, CodecError, Composition, ConformanceError, ConformanceGate, ConsumerConfig,
    DecodeError, FetchError, NotifyError, PersistError, PipelineConfig, PipelineError,
    StoreError,
};
pub use ports::inbound::StageEventHandler;
pub use ports::outbound::KeyValueStore;
pub use service::{
    ConsumerStats, Disposition, Notified, PipelineOutcome, PipelineReport, ProofPipeline,
    ProofRepository, StageConsumer, SubscriptionNotifier,
};
