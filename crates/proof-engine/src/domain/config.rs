//! # Engine Configuration
//!
//! Tunables the pipeline and consumer read at construction.
//!
//! - `proof_ttl`: lifetime of a stored proof (default 24h, the retrieval
//!   layer's maximum fetch age)
//! - `prefetch`: deliveries processed concurrently (default 10)

use std::time::Duration;

/// Default proof lifetime in minutes.
pub const DEFAULT_PROOF_TTL_MINUTES: u64 = 1440;

/// Default number of in-flight deliveries.
pub const DEFAULT_PREFETCH: usize = 10;

/// Upper bound on in-flight deliveries.
pub const MAX_PREFETCH: usize = 1000;

/// Configuration for the proof pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// How long a persisted proof stays retrievable.
    pub proof_ttl: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            proof_ttl: Duration::from_secs(DEFAULT_PROOF_TTL_MINUTES * 60),
        }
    }
}

impl PipelineConfig {
    pub fn with_ttl_minutes(minutes: u64) -> Self {
        Self {
            proof_ttl: Duration::from_secs(minutes.saturating_mul(60)),
        }
    }

    /// A zero TTL would store proofs that are expired on arrival.
    pub fn is_valid(&self) -> bool {
        !self.proof_ttl.is_zero()
    }
}

/// Configuration for the stage consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerConfig {
    /// Maximum deliveries in flight at once.
    pub prefetch: usize,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            prefetch: DEFAULT_PREFETCH,
        }
    }
}

impl ConsumerConfig {
    pub fn new(prefetch: usize) -> Self {
        Self { prefetch }
    }

    pub fn is_valid(&self) -> bool {
        self.prefetch > 0 && self.prefetch <= MAX_PREFETCH
    }
}
