//! # Inbound Ports (Driving Ports)
//!
//! The API the engine exposes to whatever delivers stage events.

use crate::service::PipelineReport;
use async_trait::async_trait;

pub use proof_bus::{Delivery, StageQueue};

/// Processes one raw stage event to a broker decision.
///
/// Implementations never fail: every error is folded into the report's
/// disposition so the caller always has an ack or reject to issue.
#[async_trait]
pub trait StageEventHandler: Send + Sync {
    async fn handle(&self, message_type: &str, payload: &[u8]) -> PipelineReport;
}
