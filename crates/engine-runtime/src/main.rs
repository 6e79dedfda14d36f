//! # Engine Runtime
//!
//! Runs the proof engine over in-memory adapters, replaying stage events
//! from stdin.
//!
//! ```text
//! stdin ──→ InMemoryStageQueue ──→ StageConsumer ──→ ProofPipeline
//!                                                     ├─→ InMemoryKeyValueStore
//!                                                     └─→ InMemoryNotificationExchange
//! ```
//!
//! Stops on end of input or Ctrl+C, after every taken delivery is settled.

use anyhow::{Context, Result};
use engine_runtime::{replay, EngineConfig};
use proof_bus::{InMemoryNotificationExchange, InMemoryStageQueue};
use proof_engine::{InMemoryKeyValueStore, ProofPipeline, StageConsumer};
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = EngineConfig::from_env().context("reading configuration")?;
    config.validate().context("invalid configuration")?;

    info!(
        queue = %config.queue.name,
        prefetch = config.queue.prefetch,
        ttl_minutes = config.proof.ttl_minutes,
        store_uri = %config.endpoints.store_uri,
        broker_uri = %config.endpoints.broker_uri,
        "Starting proof engine on in-memory adapters"
    );

    let store = Arc::new(InMemoryKeyValueStore::new());
    let exchange = Arc::new(InMemoryNotificationExchange::new());
    let queue = Arc::new(InMemoryStageQueue::new(config.queue.name.clone()));

    let pipeline = ProofPipeline::new(store.clone(), exchange.clone(), &config.pipeline())
        .context("compiling proof schema")?;
    let consumer = StageConsumer::new(queue.clone(), Arc::new(pipeline), &config.consumer());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consuming = tokio::spawn(async move { consumer.run(shutdown_rx).await });

    let input = BufReader::new(tokio::io::stdin());
    tokio::select! {
        result = replay(input, &queue) => {
            let stats = result.context("reading stdin")?;
            info!(published = stats.published, skipped = stats.skipped, "End of input");
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("listening for Ctrl+C")?;
            warn!("Interrupted, finishing in-flight deliveries");
            if shutdown_tx.send(true).is_err() {
                warn!("Consumer already stopped");
            }
        }
    }
    queue.close();

    let stats = consuming.await.context("consumer task")?;
    let queue_stats = queue.stats();

    println!(
        "received={} acked={} rejected={} dead_lettered={} stored={} notified={}",
        stats.received,
        stats.acked,
        stats.rejected,
        queue_stats.dead_lettered,
        store.len(),
        exchange.published()
    );
    Ok(())
}
