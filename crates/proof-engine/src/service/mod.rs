//! # Proof Engine Service
//!
//! Application layer wiring domain logic to the ports.
//!
//! - `pipeline`: one event, decode to settlement decision
//! - `persistence`: proof cache with TTL
//! - `notifier`: subscription lookup and routed publish
//! - `consumer`: bounded concurrent queue consumption with graceful drain

pub mod consumer;
pub mod notifier;
pub mod persistence;
pub mod pipeline;

pub use consumer::{ConsumerStats, StageConsumer};
pub use notifier::{Notified, SubscriptionNotifier};
pub use persistence::ProofRepository;
pub use pipeline::{Disposition, PipelineOutcome, PipelineReport, ProofPipeline};
