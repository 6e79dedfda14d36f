//! # Engine Configuration
//!
//! Runtime configuration with environment overrides.
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `PROOF_QUEUE` | `queue.name` | `work.proof` |
//! | `PROOF_PREFETCH` | `queue.prefetch` | `10` |
//! | `PROOF_TTL_MINUTES` | `proof.ttl_minutes` | `1440` |
//! | `PROOF_STORE_URI` | `endpoints.store_uri` | `redis://127.0.0.1:6379` |
//! | `PROOF_BROKER_URI` | `endpoints.broker_uri` | `amqp://127.0.0.1:5672` |

use proof_engine::domain::config::{DEFAULT_PREFETCH, DEFAULT_PROOF_TTL_MINUTES, MAX_PREFETCH};
use proof_engine::{ConsumerConfig, PipelineConfig};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable held something unparseable.
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("Prefetch must be between 1 and {max}, got {value}")]
    PrefetchOutOfRange { value: usize, max: usize },

    #[error("Proof TTL must be at least one minute")]
    ZeroTtl,

    #[error("Queue name must not be empty")]
    EmptyQueueName,
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub queue: QueueConfig,
    pub proof: ProofConfig,
    pub endpoints: EndpointConfig,
}

/// Inbound queue configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Queue stage events are consumed from.
    pub name: String,
    /// Deliveries processed concurrently.
    pub prefetch: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: "work.proof".to_string(),
            prefetch: DEFAULT_PREFETCH,
        }
    }
}

/// Proof storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofConfig {
    /// Lifetime of a stored proof, matching the retrieval layer's maximum
    /// fetch age.
    pub ttl_minutes: u64,
}

impl Default for ProofConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: DEFAULT_PROOF_TTL_MINUTES,
        }
    }
}

/// External service endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub store_uri: String,
    pub broker_uri: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            store_uri: "redis://127.0.0.1:6379".to_string(),
            broker_uri: "amqp://127.0.0.1:5672".to_string(),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its
    /// value if set.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("PROOF_QUEUE") {
            self.queue.name = name;
        }
        if let Some(value) = lookup("PROOF_PREFETCH") {
            self.queue.prefetch = parse("PROOF_PREFETCH", value)?;
        }
        if let Some(value) = lookup("PROOF_TTL_MINUTES") {
            self.proof.ttl_minutes = parse("PROOF_TTL_MINUTES", value)?;
        }
        if let Some(uri) = lookup("PROOF_STORE_URI") {
            self.endpoints.store_uri = uri;
        }
        if let Some(uri) = lookup("PROOF_BROKER_URI") {
            self.endpoints.broker_uri = uri;
        }
        Ok(())
    }

    /// Check values are within operating bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue.name.trim().is_empty() {
            return Err(ConfigError::EmptyQueueName);
        }
        if !self.consumer().is_valid() {
            return Err(ConfigError::PrefetchOutOfRange {
                value: self.queue.prefetch,
                max: MAX_PREFETCH,
            });
        }
        if !self.pipeline().is_valid() {
            return Err(ConfigError::ZeroTtl);
        }
        Ok(())
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig::with_ttl_minutes(self.proof.ttl_minutes)
    }

    pub fn consumer(&self) -> ConsumerConfig {
        ConsumerConfig::new(self.queue.prefetch)
    }
}

fn parse<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { var, value })
}
